//! The per-node parameter blob.
//!
//! The runtime persists a small JSON object in one node attribute; the
//! `blockId` field is the stable identifier that makes instance lookup
//! idempotent across calls. Anything else in the object is author data and
//! rides along untouched.

use log::warn;
use serde::{Deserialize, Serialize};

/// Attribute holding the JSON-encoded parameter blob.
pub const PARAMS_ATTR: &str = "data-bem";

/// Decode failure for a persisted parameter blob.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("malformed parameter blob: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The decoded parameter blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Stable identifier assigned on first instantiation.
    #[serde(rename = "blockId", skip_serializing_if = "Option::is_none")]
    pub block_id: Option<u64>,
    /// Author-supplied fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Params {
    /// Decode a blob from its attribute text.
    pub fn decode(raw: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode an optional attribute value, failing soft: a missing attribute
    /// or a malformed blob both yield the empty parameter set, which makes
    /// the runtime regenerate the stable identifier.
    pub fn decode_lossy(raw: Option<&str>) -> Self {
        match raw {
            None => Self::default(),
            Some(text) => Self::decode(text).unwrap_or_else(|err| {
                warn!("discarding malformed parameter blob: {err}");
                Self::default()
            }),
        }
    }

    /// Encode back to attribute text.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("params serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_block_id() {
        let params = Params::decode(r#"{"blockId":7}"#).unwrap();
        assert_eq!(params.block_id, Some(7));
    }

    #[test]
    fn extra_fields_preserved() {
        let params = Params::decode(r#"{"blockId":1,"speed":250}"#).unwrap();
        assert_eq!(params.extra.get("speed"), Some(&json!(250)));

        let encoded = params.encode();
        let reparsed = Params::decode(&encoded).unwrap();
        assert_eq!(reparsed, params);
    }

    #[test]
    fn encode_skips_unassigned_id() {
        assert_eq!(Params::default().encode(), "{}");
    }

    #[test]
    fn decode_lossy_missing_attribute() {
        assert_eq!(Params::decode_lossy(None), Params::default());
    }

    #[test]
    fn decode_lossy_malformed_blob_is_empty() {
        let params = Params::decode_lossy(Some("{not json"));
        assert_eq!(params, Params::default());
        assert_eq!(params.block_id, None);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Params::decode("][").is_err());
    }
}
