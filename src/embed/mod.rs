//! Embedded client runtime assets.
//!
//! The browser-side runtime ships inside the binary and is written into the
//! output directory at startup so the gateway can serve it like any other
//! asset:
//!
//! - `overlay.js` - error overlay definition (no variables)
//! - `hmr.js` - live-update client, rendered with the assigned WebSocket port

use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use anyhow::{Context, Result};

/// Directory under the output root that holds the runtime assets.
pub const RUNTIME_DIR: &str = "__hearth";

/// Trait for template variable sets.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Embedded template with typed variable injection.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}

/// Variables for hmr.js.
pub struct RuntimeVars {
    pub ws_port: u16,
}

impl TemplateVars for RuntimeVars {
    fn apply(&self, content: &str) -> String {
        content.replace("__HEARTH_WS_PORT__", &self.ws_port.to_string())
    }
}

/// Live-update client with WebSocket port injection.
pub const HMR_JS: Template<RuntimeVars> = Template::new(include_str!("serve/hmr.js"));

/// Error overlay definition script.
pub const OVERLAY_JS: &str = include_str!("serve/overlay.js");

/// Write the runtime assets into `<output>/__hearth/`.
pub fn write_runtime_assets(output_dir: &Path, ws_port: u16) -> Result<()> {
    let dir = output_dir.join(RUNTIME_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    fs::write(dir.join("overlay.js"), OVERLAY_JS)?;
    fs::write(dir.join("hmr.js"), HMR_JS.render(&RuntimeVars { ws_port }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmr_js_port_injection() {
        let rendered = HMR_JS.render(&RuntimeVars { ws_port: 35729 });
        assert!(rendered.contains("35729"));
        assert!(!rendered.contains("__HEARTH_WS_PORT__"));
    }

    #[test]
    fn test_write_runtime_assets() {
        let dir = tempfile::TempDir::new().unwrap();
        write_runtime_assets(dir.path(), 40000).unwrap();

        let hmr = std::fs::read_to_string(dir.path().join("__hearth/hmr.js")).unwrap();
        assert!(hmr.contains("40000"));
        assert!(dir.path().join("__hearth/overlay.js").is_file());
    }
}
