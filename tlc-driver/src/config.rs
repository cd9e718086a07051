//! Build configuration, optionally loaded from a JSON file
//!
//! ```json
//! {
//!   "emit": { "syntax": "att", "comments": true },
//!   "build": { "assembler": "as", "linker": "gcc", "runtime": ["rt.o"] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tlc_backend::EmitOptions;
use tlc_common::CompilerError;

/// How to turn emitted assembly into an executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub assembler: String,
    pub linker: String,
    /// Runtime support objects or libraries passed to the linker
    pub runtime: Vec<PathBuf>,
    /// Executable path; defaults to the module name
    pub output: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            assembler: "as".to_string(),
            linker: "gcc".to_string(),
            runtime: Vec::new(),
            output: None,
        }
    }
}

/// Contents of a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub emit: EmitOptions,
    pub build: BuildOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let text = std::fs::read_to_string(path).map_err(|e| CompilerError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(text).map_err(|e| CompilerError::InvalidInput {
            message: format!("malformed config: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tlc_backend::AsmSyntax;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_json(r#"{ "build": { "runtime": ["rt.o"] } }"#).unwrap();
        assert_eq!(config.emit, EmitOptions::default());
        assert_eq!(config.build.assembler, "as");
        assert_eq!(config.build.linker, "gcc");
        assert_eq!(config.build.runtime, vec![PathBuf::from("rt.o")]);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{
                "emit": { "syntax": "att", "comments": true },
                "build": { "assembler": "x86_64-linux-gnu-as", "linker": "cc", "output": "prog" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.emit.syntax, AsmSyntax::Att);
        assert!(config.emit.comments);
        assert_eq!(config.build.assembler, "x86_64-linux-gnu-as");
        assert_eq!(config.build.output, Some(PathBuf::from("prog")));
    }

    #[test]
    fn test_bad_config() {
        let err = Config::from_json(r#"{ "emit": { "syntax": "masm" } }"#).unwrap_err();
        assert!(matches!(err, CompilerError::InvalidInput { .. }));

        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CompilerError::Io { .. }));
    }
}
