//! OpenAPI document normalizer.
//!
//! Documents captured by an API inspector name operations through `summary`
//! and inline every body schema. Client generators want `operationId` and
//! named component schemas; this crate rewrites a JSON document into that
//! shape. It can be used as a library or through the `openapi-format` CLI.
//!
//! # Example
//!
//! ```no_run
//! use openapi_format::{format_file, FormatOptions};
//! use std::path::Path;
//!
//! let report = format_file(Path::new("openapi.json"), &FormatOptions::default())?;
//! for schema in &report.hoisted {
//!     println!("{} <- {}", schema.name, schema.location);
//! }
//! # Ok::<(), openapi_format::FormatError>(())
//! ```

mod formatter;
mod types;

use std::path::Path;

pub use formatter::{format_document, OPERATION_METHODS};
pub use types::{FormatOptions, FormatReport, HoistedSchema, SuffixScheme};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid OpenAPI document: {0}")]
    InvalidDocument(String),
}

/// Format the document at `path` and write it back as 2-space indented JSON.
///
/// With `options.dry_run` the file is left untouched.
pub fn format_file(path: &Path, options: &FormatOptions) -> Result<FormatReport, FormatError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: display.clone(),
        source,
    })?;
    let mut doc: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| FormatError::Json {
            path: display.clone(),
            source,
        })?;

    let report = format_document(&mut doc, options)?;

    if !options.dry_run {
        let mut output = serde_json::to_string_pretty(&doc).map_err(|source| FormatError::Json {
            path: display.clone(),
            source,
        })?;
        output.push('\n');
        std::fs::write(path, output).map_err(|source| FormatError::Io {
            path: display,
            source,
        })?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn captured_doc() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": { "title": "ipleak", "version": "1" },
            "paths": {
                "/json/": {
                    "get": {
                        "summary": "GetIpData",
                        "responses": {
                            "200": {
                                "description": "",
                                "content": { "application/json": { "schema": {
                                    "type": "object",
                                    "properties": { "ip": { "type": "string" } }
                                } } }
                            }
                        }
                    }
                }
            }
        })
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_file_rewrites_pretty_json() {
        let file = write_temp(&captured_doc().to_string());

        let report = format_file(file.path(), &FormatOptions::default()).unwrap();

        assert_eq!(report.hoisted.len(), 1);
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("\n  \"components\": {"));
        assert!(written.ends_with("}\n"));
        let doc: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(doc["paths"]["/json/"]["get"]["operationId"], "GetIpData");
        assert_eq!(
            doc["components"]["schemas"]["GetIpData_200_Response"]["properties"]["ip"]["type"],
            "string"
        );
    }

    #[test]
    fn test_format_file_is_idempotent() {
        let file = write_temp(&captured_doc().to_string());
        format_file(file.path(), &FormatOptions::default()).unwrap();
        let first = std::fs::read_to_string(file.path()).unwrap();

        let report = format_file(file.path(), &FormatOptions::default()).unwrap();

        assert!(report.is_unchanged());
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), first);
    }

    #[test]
    fn test_dry_run_leaves_file() {
        let original = captured_doc().to_string();
        let file = write_temp(&original);
        let options = FormatOptions {
            dry_run: true,
            ..FormatOptions::default()
        };

        let report = format_file(file.path(), &options).unwrap();

        assert_eq!(report.renamed_operations.len(), 1);
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), original);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = format_file(&dir.path().join("absent.json"), &FormatOptions::default());
        assert!(matches!(result, Err(FormatError::Io { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_temp("{ \"openapi\": ");
        let result = format_file(file.path(), &FormatOptions::default());
        match result {
            Err(err @ FormatError::Json { .. }) => {
                assert!(err.to_string().contains("invalid JSON"))
            }
            other => panic!("expected JSON error, got {other:?}"),
        }
    }
}
