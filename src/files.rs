//! Filters and lookups over lists of exported files.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::Error;

static RE_JSON_OR_CSV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:json|csv)").expect("Failed to create regex pattern for JSON and CSV"));

/// Load format for a group of data source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    NewlineDelimitedJson,
    Csv,
}

impl FileFormat {
    /// Format name used by the warehouse table definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewlineDelimitedJson => "NEWLINE_DELIMITED_JSON",
            Self::Csv => "CSV",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Get the filename from a path, with or without the extension.
///
/// ```rust
/// use warehouse_utils::files::extract_filename;
///
/// assert_eq!(extract_filename("user/123/message_1.json", false), "message_1");
/// assert_eq!(extract_filename("user/123/message_1.json", true), "message_1.json");
/// ```
#[must_use]
pub fn extract_filename(filepath: &str, include_extension: bool) -> String {
    let path = Path::new(filepath);
    if include_extension {
        crate::path_to_filename_string(path)
    } else {
        crate::path_to_file_stem_string(path)
    }
}

/// Get the file extension without the dot.
///
/// ```rust
/// use warehouse_utils::files::get_file_extension;
///
/// assert_eq!(get_file_extension("CacheRealmReport_Hourly_0.json"), "json");
/// assert_eq!(get_file_extension("filters_0000.txt"), "txt");
/// ```
#[must_use]
pub fn get_file_extension(filename: &str) -> String {
    crate::os_str_to_string(Path::new(filename).extension().unwrap_or_default())
}

/// Only keep the JSON and CSV files. Extensions are matched case-insensitively.
#[must_use]
pub fn filter_json_and_csv<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    files
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|file| RE_JSON_OR_CSV.is_match(file))
        .map(ToString::to_string)
        .collect()
}

/// Check if the content is newline-delimited JSON,
/// meaning every non-empty line is one complete JSON value.
///
/// Empty content counts as valid.
///
/// ```rust
/// use warehouse_utils::files::is_ndjson;
///
/// assert!(is_ndjson(b"{\"a\":1}\n{\"b\":2}"));
/// assert!(!is_ndjson(b"{\"a\":1}\nNOT_JSON"));
/// ```
#[must_use]
pub fn is_ndjson(content: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(content) else {
        return false;
    };
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .all(|line| serde_json::from_str::<serde_json::Value>(line).is_ok())
}

/// Check if the file at the given path is newline-delimited JSON.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn is_ndjson_file(path: &Path) -> Result<bool> {
    let content = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(is_ndjson(&content))
}

/// Return the filenames that appear more than once in the given paths.
///
/// Names are ordered by how many times they appear, most common first.
/// Names with the same count keep the order in which they were first seen.
///
/// ```rust
/// use warehouse_utils::files::repeated_names;
///
/// assert_eq!(repeated_names(&["a/x.json", "b/x.json", "c/y.json"]), vec!["x.json"]);
/// ```
#[must_use]
pub fn repeated_names<S: AsRef<str>>(filepaths: &[S]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for filepath in filepaths {
        let filename = extract_filename(filepath.as_ref(), true);
        if let Some(&position) = index.get(&filename) {
            counts[position].1 += 1;
        } else {
            index.insert(filename.clone(), counts.len());
            counts.push((filename, 1));
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .map(|(name, _)| name)
        .collect()
}

/// Return the JSON and CSV files that belong to the given data source directory.
///
/// ```rust
/// use warehouse_utils::files::get_data_source_files;
///
/// let files = ["data_source_1/path/to/file/filters_0000.json", "data_source_1/filters_0000.json"];
/// assert_eq!(
///     get_data_source_files("data_source_1", &files, true),
///     vec!["data_source_1/filters_0000.json", "data_source_1/path/to/file/filters_0000.json"]
/// );
/// ```
#[must_use]
pub fn get_data_source_files<S: AsRef<str>>(data_source: &str, files: &[S], sort: bool) -> Vec<String> {
    let directory = format!("{data_source}/");
    let mut results: Vec<String> = filter_json_and_csv(files)
        .into_iter()
        .filter(|file| file.contains(&directory))
        .collect();

    if sort {
        results.sort();
    }
    results
}

/// Return the load format for a data source.
///
/// All of the given files need to have the same extension.
///
/// # Errors
/// Returns [`Error::MixedFileFormats`] if the files are not all JSON or all CSV,
/// or if there are no files at all.
pub fn get_file_format<S: AsRef<str>>(data_source: &str, files: &[S]) -> Result<FileFormat, Error> {
    let all_with_extension = |extension: &str| {
        !files.is_empty()
            && files
                .iter()
                .all(|file| file.as_ref().to_ascii_lowercase().ends_with(extension))
    };

    if all_with_extension(".json") {
        Ok(FileFormat::NewlineDelimitedJson)
    } else if all_with_extension(".csv") {
        Ok(FileFormat::Csv)
    } else {
        Err(Error::MixedFileFormats {
            data_source: data_source.to_string(),
        })
    }
}

/// Return the absolute paths of all files under the given directory.
///
/// # Errors
/// Returns an error if the directory cannot be resolved.
pub fn absolute_file_paths(directory: &Path) -> Result<Vec<PathBuf>> {
    let root = dunce::canonicalize(directory)
        .with_context(|| format!("Failed to resolve directory: {}", directory.display()))?;

    Ok(WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect())
}

/// Return the names of the directories directly under the given directory, sorted.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn get_top_level_dirs(directory: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(directory).with_context(|| format!("Failed to read directory: {}", directory.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(crate::os_str_to_string(&entry.file_name()));
        }
    }
    dirs.sort();
    Ok(dirs)
}



#[cfg(test)]
mod is_ndjson_tests {
    use super::*;

    #[test]
    fn valid_lines() {
        assert!(is_ndjson(b"{\"a\":1}\n{\"b\":2}"));
        assert!(is_ndjson(b"{\"a\":1}\n{\"b\":2}\n"));
        assert!(is_ndjson(b"1\n\"text\"\n[1, 2]\r\n"));
    }

    #[test]
    fn invalid_line() {
        assert!(!is_ndjson(b"{\"a\":1}\nNOT_JSON"));
        assert!(!is_ndjson(b"[\n  {\"a\": 1}\n]"));
    }

    #[test]
    fn two_values_on_one_line() {
        assert!(!is_ndjson(b"{\"a\":1} {\"b\":2}"));
    }

    #[test]
    fn empty_content_is_valid() {
        assert!(is_ndjson(b""));
        assert!(is_ndjson(b"\n\n  \n"));
    }

    #[test]
    fn skips_blank_lines() {
        assert!(is_ndjson(b"{\"a\":1}\n\n{\"b\":2}"));
    }

    #[test]
    fn invalid_utf8() {
        assert!(!is_ndjson(&[0xff, 0xfe, b'{', b'}']));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"a\":1}\n{\"b\":2}\n").expect("should write file");
        assert!(is_ndjson_file(&path).expect("should read file"));

        fs::write(&path, "[{\"a\":1},\n{\"b\":2}]").expect("should write file");
        assert!(!is_ndjson_file(&path).expect("should read file"));

        assert!(is_ndjson_file(&dir.path().join("missing.json")).is_err());
    }
}



#[cfg(test)]
mod directory_tests {
    use super::*;

    use std::fs::File;

    use tempfile::tempdir;

    #[test]
    fn lists_all_files_recursively() {
        let dir = tempdir().expect("should create temp dir");
        fs::create_dir_all(dir.path().join("a/b")).expect("should create dirs");
        File::create(dir.path().join("top.json")).expect("should create file");
        File::create(dir.path().join("a/b/deep.csv")).expect("should create file");

        let files = absolute_file_paths(dir.path()).expect("should list files");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|path| path.is_absolute()));
        assert!(files.iter().any(|path| path.ends_with("a/b/deep.csv")));
    }

    #[test]
    fn lists_top_level_dirs() {
        let dir = tempdir().expect("should create temp dir");
        fs::create_dir_all(dir.path().join("spotify/nested")).expect("should create dirs");
        fs::create_dir_all(dir.path().join("github")).expect("should create dirs");
        File::create(dir.path().join("file.json")).expect("should create file");

        let dirs = get_top_level_dirs(dir.path()).expect("should list dirs");
        assert_eq!(dirs, vec!["github", "spotify"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(get_top_level_dirs(Path::new("does/not/exist")).is_err());
        assert!(absolute_file_paths(Path::new("does/not/exist")).is_err());
    }
}
