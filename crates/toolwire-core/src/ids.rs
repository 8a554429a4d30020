//! Request id strategies.
//!
//! [`ContentHashIds`] derives the id from the call's content, so identical
//! calls share an id. Two identical calls in flight on the same channel at
//! once will collide, and either may receive the other's response. Use
//! [`RandomIds`] where that matters.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::traits::RequestIdStrategy;
use crate::types::RequestId;

/// Number of hex characters of the digest kept in the id.
const HASH_LEN: usize = 16;

/// `<tool>_<sha256 prefix of the canonical arguments>`.
///
/// Object keys serialize in sorted order, so argument maps built in a
/// different insertion order hash the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHashIds;

impl RequestIdStrategy for ContentHashIds {
    fn request_id(&self, tool: &str, arguments: &Value) -> RequestId {
        let canonical = serde_json::to_vec(arguments).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(tool.as_bytes());
        hasher.update([0]);
        hasher.update(&canonical);
        let digest = hex::encode(hasher.finalize());
        RequestId(format!("{tool}_{}", &digest[..HASH_LEN]))
    }
}

/// `<tool>_<uuid v4>`; unique per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl RequestIdStrategy for RandomIds {
    fn request_id(&self, tool: &str, _arguments: &Value) -> RequestId {
        RequestId(format!("{tool}_{}", uuid::Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identical_calls_share_an_id() {
        let ids = ContentHashIds;
        let a = ids.request_id("GET_TOKENS", &json!({"chainId": "1"}));
        let b = ids.request_id("GET_TOKENS", &json!({"chainId": "1"}));
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("GET_TOKENS_"));
        assert_eq!(a.as_str().len(), "GET_TOKENS_".len() + HASH_LEN);
    }

    #[test]
    fn key_order_does_not_matter() {
        let ids = ContentHashIds;
        let mut first = serde_json::Map::new();
        first.insert("chainId".into(), json!("1"));
        first.insert("amount".into(), json!("10"));
        let mut second = serde_json::Map::new();
        second.insert("amount".into(), json!("10"));
        second.insert("chainId".into(), json!("1"));

        assert_eq!(
            ids.request_id("GET_QUOTE", &Value::Object(first)),
            ids.request_id("GET_QUOTE", &Value::Object(second))
        );
    }

    #[test]
    fn different_content_different_id() {
        let ids = ContentHashIds;
        let a = ids.request_id("GET_TOKENS", &json!({"chainId": "1"}));
        let b = ids.request_id("GET_TOKENS", &json!({"chainId": "501"}));
        let c = ids.request_id("GET_LIQUIDITY", &json!({"chainId": "1"}));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn random_ids_are_unique() {
        let ids = RandomIds;
        let args = json!({"chainId": "1"});
        let a = ids.request_id("GET_TOKENS", &args);
        let b = ids.request_id("GET_TOKENS", &args);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("GET_TOKENS_"));
    }
}
