//! Live-update message protocol.
//!
//! Defines the JSON message format for WebSocket communication between the
//! development server and browser clients.
//!
//! # Message Types
//!
//! - `reload`: trigger full page reload
//! - `hmr`: apply hot patches to registered modules
//! - `error`: display the build error overlay
//!
//! A message is immutable once constructed and broadcast as-is to every open
//! connection. A successful message (`reload` or `hmr`) implicitly clears
//! any error overlay on the client.

use serde::{Deserialize, Serialize};

/// One module entry of a hot patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModulePatch {
    /// Module id (normalized source path, e.g. `src/app.module.css`)
    pub id: String,
    /// Replacement code, re-evaluated in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
    /// Replacement stylesheet text for the module's `<style>` element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

/// Update message sent over the live-update connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateMessage {
    /// Full page reload (fallback when a change cannot be hot-applied)
    Reload,

    /// Hot patch: ordered module replacements
    Hmr { modules: Vec<ModulePatch> },

    /// Build error (display overlay, no reload)
    Error { error: String },
}

impl UpdateMessage {
    /// Create a hot patch message.
    pub fn hmr(modules: Vec<ModulePatch>) -> Self {
        Self::Hmr { modules }
    }

    /// Create an error message from build diagnostics.
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_wire_format() {
        assert_eq!(UpdateMessage::Reload.to_json(), r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_hmr_wire_format() {
        let msg = UpdateMessage::hmr(vec![ModulePatch {
            id: "src/app.module.css".into(),
            js: None,
            css: Some(".box_a1b2c3d4{color:red}".into()),
        }]);

        let json = msg.to_json();
        assert!(json.contains(r#""type":"hmr""#));
        assert!(json.contains(r#""id":"src/app.module.css""#));
        assert!(json.contains(r#""css":"#));
        // Absent fields are omitted, not null
        assert!(!json.contains(r#""js""#));
    }

    #[test]
    fn test_error_wire_format() {
        let msg = UpdateMessage::error("unexpected token");
        let json = msg.to_json();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""error":"unexpected token""#));
    }

    #[test]
    fn test_round_trip() {
        let msg = UpdateMessage::hmr(vec![ModulePatch {
            id: "src/index.ts".into(),
            js: Some("console.log(1)".into()),
            css: None,
        }]);
        let parsed: UpdateMessage = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(parsed, msg);
    }
}
