//! Query string (de)serialization.
//!
//! [`QueryCodec`] is deliberately permissive: malformed segments are dropped instead of
//! rejected, and values are kept exactly as they appear in the query (no percent-decoding),
//! so that a serialized map deserializes back to the same map.
//!
//! # Example
//! ```
//! use micro_message::protocol::QueryCodec;
//!
//! let params = QueryCodec::deserialize("a=1&b&c=2");
//! assert_eq!(params.len(), 2);
//! assert_eq!(params["a"], "1");
//! assert_eq!(params["c"], "2");
//!
//! assert_eq!(QueryCodec::serialize(&params), "a=1&c=2");
//! ```

use indexmap::IndexMap;
use tracing::trace;

use crate::ensure;
use crate::protocol::MessageError;

/// Ordered mapping of query keys to values, in order of first appearance.
pub type QueryMap = IndexMap<String, String>;

#[derive(Debug, Copy, Clone)]
pub struct QueryCodec;

impl QueryCodec {
    /// Splits `raw` on `&` and every segment on `=`.
    ///
    /// A segment that does not consist of exactly one key and one value, or whose key is empty,
    /// is silently skipped. Later duplicates overwrite earlier values but keep their position.
    pub fn deserialize(raw: &str) -> QueryMap {
        let mut params = QueryMap::new();

        for segment in raw.split('&') {
            let mut parts = segment.split('=');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                if !segment.is_empty() {
                    trace!(segment, "dropped malformed query segment");
                }
                continue;
            };

            if key.is_empty() {
                trace!(segment, "dropped query segment without key");
                continue;
            }

            params.insert(key.to_owned(), value.to_owned());
        }

        params
    }

    /// Joins `key=value` pairs with `&` in iteration order.
    pub fn serialize<I, K, V>(params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = String::new();
        for (key, value) in params {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(key.as_ref());
            query.push('=');
            query.push_str(value.as_ref());
        }
        query
    }

    /// Checks that `raw` can stand as the query component of a uri.
    ///
    /// Empty and malformed segments are tolerated; only a `#`, which would start the
    /// fragment, is rejected.
    pub fn validate(raw: &str) -> Result<(), MessageError> {
        ensure!(!raw.contains('#'), MessageError::invalid_argument(format!("query must not contain '#': {raw}")));
        Ok(())
    }

    /// Decodes an `application/x-www-form-urlencoded` string, resolving `+` and `%XX` escapes.
    ///
    /// Unlike [`QueryCodec::deserialize`] this is a lossy, decoding parser meant for
    /// submitted form fields, where a key without `=` maps to an empty value.
    pub fn decode_form(raw: &str) -> Result<QueryMap, MessageError> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(raw).map_err(|e| MessageError::invalid_argument(e.to_string()))?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_keeps_order() {
        let params = QueryCodec::deserialize("x=1&y=2&z=3");
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["x", "y", "z"]);
        assert_eq!(params["y"], "2");
    }

    #[test]
    fn deserialize_drops_malformed_segments() {
        let params = QueryCodec::deserialize("a=1&b&c=2");
        assert_eq!(params, QueryMap::from([("a".to_owned(), "1".to_owned()), ("c".to_owned(), "2".to_owned())]));

        let params = QueryCodec::deserialize("=1&d=4=4&&e=");
        assert_eq!(params.len(), 1);
        assert_eq!(params["e"], "");
    }

    #[test]
    fn deserialize_last_duplicate_wins() {
        let params = QueryCodec::deserialize("a=1&b=2&a=3");
        assert_eq!(params.len(), 2);
        assert_eq!(params["a"], "3");
        assert_eq!(params.get_index(0), Some((&"a".to_owned(), &"3".to_owned())));
    }

    #[test]
    fn deserialize_empty() {
        assert!(QueryCodec::deserialize("").is_empty());
    }

    #[test]
    fn serialize_has_no_trailing_separator() {
        assert_eq!(QueryCodec::serialize([("a", "1"), ("b", "2")]), "a=1&b=2");
        assert_eq!(QueryCodec::serialize(Vec::<(String, String)>::new()), "");
    }

    #[test]
    fn round_trip() {
        let mut params = QueryMap::new();
        params.insert("name".into(), "john".into());
        params.insert("age".into(), "25".into());
        params.insert("empty".into(), String::new());
        params.insert("path".into(), "/a/b%20c".into());

        assert_eq!(QueryCodec::deserialize(&QueryCodec::serialize(&params)), params);
    }

    #[test]
    fn validate_is_permissive() {
        assert!(QueryCodec::validate("").is_ok());
        assert!(QueryCodec::validate("a&&b=&=c").is_ok());
        assert!(matches!(QueryCodec::validate("a=1#frag"), Err(MessageError::InvalidArgument { .. })));
    }

    #[test]
    fn decode_form_resolves_escapes() {
        let fields = QueryCodec::decode_form("name=John+Doe&email=john%40example.com&flag").unwrap();
        assert_eq!(fields["name"], "John Doe");
        assert_eq!(fields["email"], "john@example.com");
        assert_eq!(fields["flag"], "");
    }
}
