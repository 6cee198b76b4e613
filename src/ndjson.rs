//! Conversion of JSON array files to newline-delimited JSON.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::files::is_ndjson_file;

pub const DEFAULT_JQ_PROGRAM: &str = "jq";
pub const DEFAULT_JQ_FILTER: &str = ".[]";

/// External program used to reshape JSON into one value per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTransformer {
    pub program: String,
    pub filter: String,
}

impl Default for JsonTransformer {
    fn default() -> Self {
        Self {
            program: DEFAULT_JQ_PROGRAM.to_string(),
            filter: DEFAULT_JQ_FILTER.to_string(),
        }
    }
}

impl JsonTransformer {
    #[must_use]
    pub fn new(program: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            filter: filter.into(),
        }
    }

    /// Check that the transformer program can be executed.
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.program).arg("--version").output().is_ok()
    }

    /// Run the transformer on a file and return its trimmed output.
    ///
    /// # Errors
    /// Returns an error if the program cannot be started or exits with a failure.
    pub fn run(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-c")
            .arg(&self.filter)
            .arg(path)
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed for {}: {}", self.program, path.display(), stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Convert a JSON file to newline-delimited JSON with the external transformer.
///
/// Returns `None` if the file already is newline-delimited JSON.
///
/// # Errors
/// Returns an error if the file cannot be read or the transformer fails.
pub fn convert_to_newline_delimited_json(path: &Path, transformer: &JsonTransformer) -> Result<Option<String>> {
    if is_ndjson_file(path)? {
        return Ok(None);
    }
    transformer.run(path).map(Some)
}

/// Convert JSON text to newline-delimited JSON without an external program.
///
/// Each element of a top-level array goes on its own line.
/// Any other value is written as a single compact line.
///
/// # Errors
/// Returns an error if the text is not valid JSON.
///
/// ```rust
/// use warehouse_utils::ndjson::json_array_to_ndjson;
///
/// let ndjson = json_array_to_ndjson("[{\"a\": 1}, {\"b\": 2}]").unwrap();
/// assert_eq!(ndjson, "{\"a\":1}\n{\"b\":2}");
/// ```
pub fn json_array_to_ndjson(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text).context("Failed to parse JSON")?;
    let lines = match value {
        Value::Array(items) => items
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?,
        other => vec![serde_json::to_string(&other)?],
    };
    Ok(lines.join("\n"))
}

/// Convert a JSON file to newline-delimited JSON,
/// using the external transformer when it is available and the built-in conversion otherwise.
///
/// Returns `None` if the file already is newline-delimited JSON.
///
/// # Errors
/// Returns an error if the file cannot be read or converted.
pub fn convert_file(path: &Path, transformer: &JsonTransformer) -> Result<Option<String>> {
    if transformer.is_available() {
        return convert_to_newline_delimited_json(path, transformer);
    }
    if is_ndjson_file(path)? {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    json_array_to_ndjson(&text).map(Some)
}


#[cfg(test)]
mod convert_tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    const MISSING_PROGRAM: &str = "warehouse-utils-missing-jq";

    #[test]
    fn already_ndjson_is_skipped() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"a\":1}\n{\"a\":2}\n").expect("should write file");

        let transformer = JsonTransformer::new(MISSING_PROGRAM, ".[]");
        assert_eq!(
            convert_to_newline_delimited_json(&path, &transformer).expect("should not run transformer"),
            None
        );
    }

    #[test]
    fn missing_program_is_an_error() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("data.json");
        fs::write(&path, "[{\"a\":1},\n{\"a\":2}]").expect("should write file");

        let transformer = JsonTransformer::new(MISSING_PROGRAM, ".[]");
        assert!(!transformer.is_available());
        assert!(convert_to_newline_delimited_json(&path, &transformer).is_err());
    }

    #[test]
    fn falls_back_to_builtin_conversion() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("data.json");
        fs::write(&path, "[{\"a\":1},\n{\"a\":2}]").expect("should write file");

        let transformer = JsonTransformer::new(MISSING_PROGRAM, ".[]");
        assert_eq!(
            convert_file(&path, &transformer).expect("should convert"),
            Some("{\"a\":1}\n{\"a\":2}".to_string())
        );
    }

    #[test]
    fn default_transformer_is_jq() {
        let transformer = JsonTransformer::default();
        assert_eq!(transformer.program, "jq");
        assert_eq!(transformer.filter, ".[]");
    }
}
