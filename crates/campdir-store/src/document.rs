//! The single remote document holding the whole directory.

use campdir_types::{Tree, now_millis};
use serde::{Deserialize, Serialize};

/// Schema version written on every full document write.
pub const DOCUMENT_VERSION: &str = "1.0";

/// `{ regions, lastUpdated, version }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub regions: Tree,
    /// Milliseconds since the Unix epoch of the last write.
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl RemoteDocument {
    /// A fresh document stamped with the current time.
    pub fn new(regions: Tree) -> Self {
        Self {
            regions,
            last_updated: now_millis(),
            version: default_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let doc = RemoteDocument {
            regions: vec![],
            last_updated: 42,
            version: DOCUMENT_VERSION.into(),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "regions": [], "lastUpdated": 42, "version": "1.0" })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let doc: RemoteDocument = serde_json::from_value(json!({})).unwrap();
        assert!(doc.regions.is_empty());
        assert_eq!(doc.version, "1.0");
    }
}
