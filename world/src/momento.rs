//! Momento encoding of cache contents.
//!
//! A momento is the JSON document `{"coins":[{"serial":"..."},...]}`. It is
//! the only persisted representation of a cache and preserves coin order.

use thiserror::Error;

use crate::cache_store::Cache;

/// Errors raised while encoding or decoding a momento.
#[derive(Debug, Error)]
pub enum MomentoError {
    /// The stored momento was empty or contained only whitespace.
    #[error("momento payload was empty")]
    Empty,
    /// The cache could not be encoded.
    #[error("could not encode momento: {0}")]
    Encode(#[source] serde_json::Error),
    /// The stored momento could not be parsed.
    #[error("could not parse momento: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes a cache into its momento string.
pub fn encode(cache: &Cache) -> Result<String, MomentoError> {
    serde_json::to_string(cache).map_err(MomentoError::Encode)
}

/// Decodes a momento string back into a cache.
pub fn decode(value: &str) -> Result<Cache, MomentoError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MomentoError::Empty);
    }
    serde_json::from_str(trimmed).map_err(MomentoError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::{CellKey, Coin, CoinStack};

    fn cache_of(serials: &[&str]) -> Cache {
        Cache::from_coins(serials.iter().map(|serial| Coin::from_serial(*serial)).collect())
    }

    #[test]
    fn round_trip_preserves_order() {
        let cache = cache_of(&["10:20#3", "10:20#0", "4:4#1"]);
        let encoded = encode(&cache).expect("momento encodes");
        let decoded = decode(&encoded).expect("momento decodes");
        assert_eq!(decoded.coins().serials(), vec!["10:20#3", "10:20#0", "4:4#1"]);
    }

    #[test]
    fn round_trip_empty_cache() {
        let cache = Cache::from_coins(CoinStack::new());
        let encoded = encode(&cache).expect("momento encodes");
        assert_eq!(encoded, r#"{"coins":[]}"#);
        assert_eq!(decode(&encoded).expect("momento decodes"), cache);
    }

    #[test]
    fn encoding_matches_document_shape() {
        let key = CellKey::from_indices(10, 20);
        let cache = Cache::from_coins([Coin::mint(&key, 0)].into_iter().collect());
        assert_eq!(
            encode(&cache).expect("momento encodes"),
            r#"{"coins":[{"serial":"10:20#0"}]}"#
        );
    }

    #[test]
    fn decode_rejects_blank_payload() {
        assert!(matches!(decode("   "), Err(MomentoError::Empty)));
    }

    #[test]
    fn decode_rejects_malformed_payload() {
        assert!(matches!(decode("{coins:"), Err(MomentoError::Decode(_))));
        assert!(matches!(
            decode(r#"{"coins":[{"id":1}]}"#),
            Err(MomentoError::Decode(_))
        ));
    }
}
