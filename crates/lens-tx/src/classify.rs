//! Mapping of free-text admission refusals to structured result codes.
//!
//! Nodes report some pre-admission refusals only as message text on the transport error,
//! never as a result code. The rules here must track the node's phrasing; an unknown
//! phrasing is passed through to the caller as a plain transport error.

use crate::{hash::TxHash, node::NodeTransportError, response::TxResponse};

/// Codespace of the chain SDK's root error registry.
pub const SDK_CODESPACE: &str = "sdk";
/// Transaction is already in the node's pending-pool cache.
pub const ERR_TX_IN_MEMPOOL_CACHE: u32 = 19;
/// Pending pool has no room for the transaction.
pub const ERR_MEMPOOL_IS_FULL: u32 = 20;
/// Transaction exceeds the node's size limit.
pub const ERR_TX_TOO_LARGE: u32 = 21;

/// One `(phrase, code, codespace)` classification rule.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RejectionRule {
    /// Lower-cased phrase searched for in the error text.
    pattern: String,
    /// Result code assigned on match; never 0.
    code: u32,
    /// Codespace assigned on match.
    codespace: String,
}

impl RejectionRule {
    /// Creates a rule. The pattern is matched case-insensitively.
    #[must_use]
    pub fn new(pattern: impl AsRef<str>, code: u32, codespace: impl Into<String>) -> Self {
        Self {
            pattern: pattern.as_ref().to_lowercase(),
            code,
            codespace: codespace.into(),
        }
    }

    /// Returns the lower-cased match phrase.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the assigned code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Returns the assigned codespace.
    #[must_use]
    pub fn codespace(&self) -> &str {
        &self.codespace
    }

    /// Returns true when `lowered` contains this rule's phrase.
    fn matches(&self, lowered: &str) -> bool {
        !self.pattern.is_empty() && lowered.contains(&self.pattern)
    }
}

/// Ordered rule table; the first matching rule wins.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RejectionRules {
    /// Rules in match order.
    rules: Vec<RejectionRule>,
}

impl Default for RejectionRules {
    fn default() -> Self {
        Self::new(vec![
            RejectionRule::new(
                "tx already exists in cache",
                ERR_TX_IN_MEMPOOL_CACHE,
                SDK_CODESPACE,
            ),
            RejectionRule::new("mempool is full", ERR_MEMPOOL_IS_FULL, SDK_CODESPACE),
            RejectionRule::new("tx too large", ERR_TX_TOO_LARGE, SDK_CODESPACE),
        ])
    }
}

impl RejectionRules {
    /// Creates a table from rules in match order.
    #[must_use]
    pub const fn new(rules: Vec<RejectionRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule with lowest precedence.
    #[must_use]
    pub fn with_rule(mut self, rule: RejectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns rules in match order.
    #[must_use]
    pub fn rules(&self) -> &[RejectionRule] {
        &self.rules
    }

    /// Returns the first rule whose phrase occurs in `message`, ignoring case.
    #[must_use]
    pub fn find(&self, message: &str) -> Option<&RejectionRule> {
        let lowered = message.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Converts a recognized refusal into a nonzero-code response for `tx_bytes`.
    ///
    /// Returns `None` when no rule matches; the caller should surface `error` unchanged.
    #[must_use]
    pub fn classify(&self, error: &NodeTransportError, tx_bytes: &[u8]) -> Option<TxResponse> {
        let rule = self.find(&error.to_string())?;
        Some(TxResponse::rejected(
            TxHash::of(tx_bytes),
            rule.code,
            rule.codespace.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> NodeTransportError {
        NodeTransportError::Failure {
            message: message.to_owned(),
        }
    }

    #[test]
    fn every_default_phrase_maps_to_fixed_code_in_any_case() {
        let rules = RejectionRules::default();
        let tx = b"signed-tx".as_slice();
        let cases = [
            ("Tx Already Exists In Cache", ERR_TX_IN_MEMPOOL_CACHE),
            ("MEMPOOL IS FULL: number of txs 5000 (max: 5000)", ERR_MEMPOOL_IS_FULL),
            ("tx too large. Max size is 1048576, but got 2000000", ERR_TX_TOO_LARGE),
        ];

        for (message, code) in cases {
            let result = rules.classify(&failure(message), tx);
            assert!(result.is_some(), "no match for {message}");
            if let Some(result) = result {
                assert_eq!(result.code, code);
                assert_eq!(result.codespace, SDK_CODESPACE);
                assert_eq!(result.hash, TxHash::of(tx).to_hex());
                assert!(!result.is_success());
            }
        }
    }

    #[test]
    fn rpc_error_detail_is_matched() {
        let error = NodeTransportError::Rpc {
            method: "broadcast_tx_sync",
            code: -32603,
            message: "Internal error".to_owned(),
            data: "mempool is full".to_owned(),
        };
        let result = RejectionRules::default().classify(&error, b"x");
        assert_eq!(result.map(|result| result.code), Some(ERR_MEMPOOL_IS_FULL));
    }

    #[test]
    fn unknown_phrase_is_not_classified() {
        let rules = RejectionRules::default();
        assert!(rules.classify(&failure("connection refused"), b"x").is_none());
    }

    #[test]
    fn first_match_wins_and_custom_rules_extend_table() {
        let rules = RejectionRules::new(vec![
            RejectionRule::new("FULL", 7, "first"),
            RejectionRule::new("mempool is full", 8, "second"),
        ])
        .with_rule(RejectionRule::new("insufficient fee", 13, "sdk"));

        assert_eq!(rules.find("mempool is full").map(RejectionRule::code), Some(7));
        assert_eq!(
            rules.find("Insufficient Fee; got 1uatom").map(RejectionRule::codespace),
            Some("sdk")
        );
    }

    #[test]
    fn empty_pattern_never_matches() {
        let rules = RejectionRules::new(vec![RejectionRule::new("", 1, "sdk")]);
        assert!(rules.find("anything").is_none());
    }
}
