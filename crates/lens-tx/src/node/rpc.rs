//! Tendermint JSON-RPC node client.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use super::{BroadcastResponse, FinalizedTx, NodeClient, NodeTransportError, TxExecResult};
use crate::hash::TxHash;

/// Default per-request HTTP timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC client for a Tendermint/CometBFT node.
#[derive(Debug, Clone)]
pub struct JsonRpcNode {
    /// HTTP client used for RPC calls.
    client: reqwest::Client,
    /// Target JSON-RPC endpoint URL.
    rpc_url: String,
}

impl JsonRpcNode {
    /// Creates a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NodeTransportError::Config`] when HTTP client creation fails.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, NodeTransportError> {
        Self::with_timeout(rpc_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NodeTransportError::Config`] when HTTP client creation fails.
    pub fn with_timeout(
        rpc_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NodeTransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NodeTransportError::Config {
                message: error.to_string(),
            })?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Issues one JSON-RPC call and returns its `result` payload.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T, NodeTransportError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| NodeTransportError::Failure {
                message: format!("rpc request `{method}` failed: {error}"),
            })?;

        // Tendermint reports method errors with a 500 status and a JSON error body, so the
        // body is parsed before the status is considered.
        let status = response.status();
        let parsed: JsonRpcResponse<T> =
            response
                .json()
                .await
                .map_err(|error| NodeTransportError::Failure {
                    message: format!("rpc method `{method}` returned {status}: {error}"),
                })?;
        unpack_response(method, parsed)
    }
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    /// Result value for successful calls.
    result: Option<T>,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// JSON-RPC error code.
    code: i64,
    /// Short message.
    message: String,
    /// Detail; a string for Tendermint, arbitrary JSON elsewhere.
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Extracts the result or maps the error object of a parsed envelope.
fn unpack_response<T>(
    method: &'static str,
    parsed: JsonRpcResponse<T>,
) -> Result<T, NodeTransportError> {
    if let Some(result) = parsed.result {
        return Ok(result);
    }
    if let Some(error) = parsed.error {
        let data = match error.data {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return Err(NodeTransportError::Rpc {
            method,
            code: error.code,
            message: error.message,
            data,
        });
    }
    Err(NodeTransportError::Failure {
        message: format!("rpc method `{method}` returned neither result nor error"),
    })
}

/// `broadcast_tx_sync` result.
#[derive(Debug, Deserialize)]
struct RawBroadcastResult {
    /// Admission code.
    #[serde(default)]
    code: u32,
    /// Hex-encoded data.
    #[serde(default)]
    data: String,
    /// Admission log.
    #[serde(default)]
    log: String,
    /// Code namespace.
    #[serde(default)]
    codespace: String,
    /// Node-computed hash.
    #[serde(default)]
    hash: String,
}

impl From<RawBroadcastResult> for BroadcastResponse {
    fn from(raw: RawBroadcastResult) -> Self {
        Self {
            code: raw.code,
            codespace: raw.codespace,
            data: raw.data.to_ascii_uppercase(),
            log: raw.log,
            hash: raw.hash,
        }
    }
}

/// `unconfirmed_txs` result.
#[derive(Debug, Deserialize)]
struct RawUnconfirmedTxs {
    /// Base64-encoded transactions; `null` when the pool is empty.
    #[serde(default)]
    txs: Option<Vec<String>>,
}

/// `tx` result.
#[derive(Debug, Deserialize)]
struct RawTxResult {
    /// Hex hash.
    #[serde(default)]
    hash: String,
    /// Commit height.
    #[serde(deserialize_with = "de_i64_lenient")]
    height: i64,
    /// Position in block.
    #[serde(default)]
    index: u32,
    /// Execution result.
    tx_result: RawExecResult,
    /// Base64 transaction bytes.
    tx: String,
}

/// Execution result nested in `tx`.
#[derive(Debug, Deserialize)]
struct RawExecResult {
    /// Result code.
    #[serde(default)]
    code: u32,
    /// Base64 data.
    #[serde(default)]
    data: Option<String>,
    /// Execution log.
    #[serde(default)]
    log: String,
    /// Info text.
    #[serde(default)]
    info: String,
    /// Gas requested.
    #[serde(default, deserialize_with = "de_i64_lenient")]
    gas_wanted: i64,
    /// Gas consumed.
    #[serde(default, deserialize_with = "de_i64_lenient")]
    gas_used: i64,
    /// Code namespace.
    #[serde(default)]
    codespace: String,
}

impl TryFrom<RawTxResult> for FinalizedTx {
    type Error = NodeTransportError;

    fn try_from(raw: RawTxResult) -> Result<Self, Self::Error> {
        let tx = decode_base64("tx", &raw.tx)?;
        let data = match raw.tx_result.data.as_deref() {
            Some(encoded) if !encoded.is_empty() => {
                hex::encode_upper(decode_base64("tx_result.data", encoded)?)
            }
            _ => String::new(),
        };
        Ok(Self {
            hash: raw.hash,
            height: raw.height,
            index: raw.index,
            tx,
            result: TxExecResult {
                code: raw.tx_result.code,
                codespace: raw.tx_result.codespace,
                data,
                log: raw.tx_result.log,
                info: raw.tx_result.info,
                gas_wanted: raw.tx_result.gas_wanted,
                gas_used: raw.tx_result.gas_used,
            },
        })
    }
}

/// Decodes the base64 response field named `field`.
fn decode_base64(field: &'static str, encoded: &str) -> Result<Vec<u8>, NodeTransportError> {
    BASE64_STANDARD
        .decode(encoded)
        .map_err(|error| NodeTransportError::Failure {
            message: format!("response field `{field}` is not valid base64: {error}"),
        })
}

/// Accepts an integer encoded either as a JSON number or as a decimal string.
fn de_i64_lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    /// Either encoding of an integer.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        /// Plain number.
        Number(i64),
        /// Decimal string.
        Text(String),
    }

    match Lenient::deserialize(deserializer)? {
        Lenient::Number(value) => Ok(value),
        Lenient::Text(text) if text.is_empty() => Ok(0),
        Lenient::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[async_trait]
impl NodeClient for JsonRpcNode {
    async fn broadcast_sync(&self, tx_bytes: &[u8]) -> Result<BroadcastResponse, NodeTransportError> {
        let raw: RawBroadcastResult = self
            .call(
                "broadcast_tx_sync",
                serde_json::json!({ "tx": BASE64_STANDARD.encode(tx_bytes) }),
            )
            .await?;
        Ok(raw.into())
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Vec<u8>>, NodeTransportError> {
        let raw: RawUnconfirmedTxs = self
            .call(
                "unconfirmed_txs",
                serde_json::json!({ "limit": limit.to_string() }),
            )
            .await?;
        raw.txs
            .unwrap_or_default()
            .into_iter()
            .map(|encoded| decode_base64("txs", &encoded))
            .collect()
    }

    async fn get_finalized(&self, hash: &TxHash) -> Result<FinalizedTx, NodeTransportError> {
        let raw: RawTxResult = self
            .call(
                "tx",
                serde_json::json!({
                    "hash": BASE64_STANDARD.encode(hash.as_bytes()),
                    "prove": false,
                }),
            )
            .await?;
        FinalizedTx::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Serves one canned HTTP response and returns the request body it received.
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            loop {
                let read = stream.read(&mut buf).await.expect("read");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.expect("write");
            stream.shutdown().await.expect("shutdown");
            let text = String::from_utf8_lossy(&request).into_owned();
            text.split("\r\n\r\n").nth(1).unwrap_or_default().to_owned()
        });
        (format!("http://{addr}"), handle)
    }

    /// Returns true once headers and the announced body length have arrived.
    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    #[tokio::test]
    async fn broadcast_sync_sends_base64_and_parses_result() {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "code": 0,
                "data": "0a1e",
                "log": "[]",
                "codespace": "",
                "hash": "ABC123"
            }
        })
        .to_string();
        let (url, server) = serve_once("200 OK", body).await;
        let node = JsonRpcNode::new(url).expect("client");

        let result = node.broadcast_sync(b"signed").await;
        assert_eq!(
            result,
            Ok(BroadcastResponse {
                code: 0,
                codespace: String::new(),
                data: "0A1E".to_owned(),
                log: "[]".to_owned(),
                hash: "ABC123".to_owned(),
            })
        );

        let request: serde_json::Value =
            serde_json::from_str(&server.await.expect("server")).expect("request json");
        assert_eq!(request["method"], "broadcast_tx_sync");
        assert_eq!(request["params"]["tx"], BASE64_STANDARD.encode(b"signed"));
    }

    #[tokio::test]
    async fn rpc_error_keeps_node_detail_in_message() {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": -32603,
                "message": "Internal error",
                "data": "tx already exists in cache"
            }
        })
        .to_string();
        let (url, _server) = serve_once("500 Internal Server Error", body).await;
        let node = JsonRpcNode::new(url).expect("client");

        let error = node.broadcast_sync(b"dup").await.expect_err("rpc error");
        assert!(error.to_string().contains("tx already exists in cache"));
        assert!(matches!(
            error,
            NodeTransportError::Rpc {
                method: "broadcast_tx_sync",
                code: -32603,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn list_pending_treats_null_txs_as_empty() {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "n_txs": "0", "total": "0", "total_bytes": "0", "txs": null }
        })
        .to_string();
        let (url, server) = serve_once("200 OK", body).await;
        let node = JsonRpcNode::new(url).expect("client");

        assert_eq!(node.list_pending(1_000).await, Ok(Vec::new()));
        let request: serde_json::Value =
            serde_json::from_str(&server.await.expect("server")).expect("request json");
        assert_eq!(request["params"]["limit"], "1000");
    }

    #[tokio::test]
    async fn get_finalized_decodes_string_integers_and_base64() {
        let hash = TxHash::of(b"committed");
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "hash": hash.to_hex(),
                "height": "1234",
                "index": 2,
                "tx_result": {
                    "code": 0,
                    "data": BASE64_STANDARD.encode([0x0a_u8, 0x1e]),
                    "log": "[]",
                    "info": "",
                    "gas_wanted": "200000",
                    "gas_used": "81234",
                    "events": [],
                    "codespace": ""
                },
                "tx": BASE64_STANDARD.encode(b"committed")
            }
        })
        .to_string();
        let (url, server) = serve_once("200 OK", body).await;
        let node = JsonRpcNode::new(url).expect("client");

        let record = node.get_finalized(&hash).await.expect("record");
        assert_eq!(record.height, 1_234);
        assert_eq!(record.index, 2);
        assert_eq!(record.tx, b"committed".to_vec());
        assert_eq!(record.result.data, "0A1E");
        assert_eq!(record.result.gas_wanted, 200_000);
        assert_eq!(record.result.gas_used, 81_234);

        let request: serde_json::Value =
            serde_json::from_str(&server.await.expect("server")).expect("request json");
        assert_eq!(request["method"], "tx");
        assert_eq!(
            request["params"]["hash"],
            BASE64_STANDARD.encode(hash.as_bytes())
        );
        assert_eq!(request["params"]["prove"], false);
    }

    #[test]
    fn bad_result_data_names_the_field() {
        let raw: RawTxResult = serde_json::from_value(serde_json::json!({
            "hash": "",
            "height": "5",
            "tx_result": { "code": 0, "data": "not base64!" },
            "tx": BASE64_STANDARD.encode(b"committed")
        }))
        .expect("raw record");

        let error = FinalizedTx::try_from(raw).expect_err("invalid data");
        assert!(matches!(
            error,
            NodeTransportError::Failure { ref message }
                if message.starts_with("response field `tx_result.data`")
        ));
    }

    #[test]
    fn envelope_without_result_or_error_is_failure() {
        let parsed: JsonRpcResponse<u64> = JsonRpcResponse {
            result: None,
            error: None,
        };
        assert!(matches!(
            unpack_response("status", parsed),
            Err(NodeTransportError::Failure { .. })
        ));
    }
}
