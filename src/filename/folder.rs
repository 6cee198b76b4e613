//! Folder name extraction for families of exported files.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::filename::{camel_to_snake_case, clean_filename};

/// Metadata file created by macOS Finder, maps to an empty folder name.
pub const DS_STORE: &str = ".DS_Store";

/// Longest leading name that can be followed by an optional `_0001` style counter and a known extension.
static RE_FOLDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z_0-9-]*[a-zA-Z]\d*)_*\d*\.(?:csv|json|txt)")
        .expect("Failed to create regex pattern for folder name")
});

/// Return the folder name for a filename.
///
/// Files that belong to the same export family map to the same folder name,
/// for example all the pages of a paginated report.
///
/// Mapping a folder name again gives the same folder name,
/// except when the name ends in two or more digits glued to a letter:
/// only one glued digit is dropped per call,
/// so `StreamingHistory12.json` gives `streaming_history1` and that in turn gives `streaming_history`.
///
/// # Errors
/// Returns [`Error::FolderNameMismatch`] if the filename does not have a CSV, JSON or TXT extension
/// or does not start with a name containing a letter.
///
/// ```rust
/// use warehouse_utils::filename::filename_to_folder_name;
///
/// assert_eq!(filename_to_folder_name("CacheRealmReport_Hourly_0.json").unwrap(), "cache_realm_report__hourly");
/// assert_eq!(filename_to_folder_name("filters_0000.json").unwrap(), "filters");
/// assert_eq!(filename_to_folder_name("ContinuumSectionResponseV1_0.json").unwrap(), "continuum_section_response_v1");
/// assert_eq!(filename_to_folder_name(".DS_Store").unwrap(), "");
/// ```
pub fn filename_to_folder_name(filename: &str) -> Result<String, Error> {
    if filename == DS_STORE {
        return Ok(String::new());
    }

    let name = filename.strip_prefix('_').unwrap_or(filename);
    let sanitized = clean_filename(&camel_to_snake_case(name));

    let folder_name = RE_FOLDER_NAME
        .captures(&sanitized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::FolderNameMismatch {
            filename: filename.to_string(),
        })?;

    Ok(strip_sequence_number(folder_name).to_string())
}

/// Return the folder name for the file at the end of the given path.
///
/// # Errors
/// Returns [`Error::FolderNameMismatch`] if the filename does not produce a folder name.
pub fn return_folder_name(filepath: &str) -> Result<String, Error> {
    let filename = crate::files::extract_filename(filepath, true);
    filename_to_folder_name(&filename)
}

/// Drop a single trailing digit used as a page or sequence number,
/// like in `streaming_history1`, but keep version markers such as `v1`.
fn strip_sequence_number(name: &str) -> &str {
    let mut chars = name.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(last), Some(previous)) if last.is_ascii_digit() && previous != 'v' => &name[..name.len() - 1],
        _ => name,
    }
}

/// Check if the given path has one of the extensions that can be mapped to a folder name.
/// The extension is compared case-insensitively.
#[must_use]
pub fn has_folder_name_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "csv" | "json" | "txt"))
}

#[cfg(test)]
mod filename_to_folder_name_tests {
    use super::*;

    fn folder(name: &str) -> String {
        filename_to_folder_name(name).expect("should produce a folder name")
    }

    #[test]
    fn paginated_reports() {
        assert_eq!(folder("CacheRealmReport_Hourly_0.json"), "cache_realm_report__hourly");
        assert_eq!(folder("filters_0000.json"), "filters");
        assert_eq!(folder("pull_request_reviews_000001.json"), "pull_request_reviews");
    }

    #[test]
    fn camel_case_names() {
        assert_eq!(folder("HowWeFeelEmotions.csv"), "how_we_feel_emotions");
        assert_eq!(folder("A11yFeatureUsage.json"), "a11y_feature_usage");
    }

    #[test]
    fn keeps_version_marker() {
        assert_eq!(
            folder("ContinuumSectionResponseV1_0.json"),
            "continuum_section_response_v1"
        );
    }

    #[test]
    fn strips_attached_sequence_digit() {
        assert_eq!(folder("StreamingHistory1.json"), "streaming_history");
        assert_eq!(folder("StreamingHistory0.json"), "streaming_history");
        assert_eq!(folder("message_1.json"), "message");
    }

    #[test]
    fn strips_only_one_attached_digit() {
        assert_eq!(folder("StreamingHistory12.json"), "streaming_history1");
    }

    #[test]
    fn hyphenated_names() {
        assert_eq!(folder("todoist-filters_0000.json"), "todoist-filters");
    }

    #[test]
    fn strips_leading_underscore() {
        assert_eq!(folder("_chat.txt"), "chat");
        assert_eq!(folder("_Chat.txt"), "chat");
        assert_eq!(folder("__chat.txt"), "_chat");
    }

    #[test]
    fn removes_punctuation_before_matching() {
        assert_eq!(
            folder("information_you've_submitted_to_advertisers.json"),
            "information_youve_submitted_to_advertisers"
        );
        assert_eq!(folder("liked posts.json"), "liked_posts");
    }

    #[test]
    fn ds_store_is_empty() {
        assert_eq!(folder(".DS_Store"), "");
    }

    #[test]
    fn is_idempotent() {
        for name in [
            "CacheRealmReport_Hourly_0.json",
            "filters_0000.json",
            "ContinuumSectionResponseV1_0.json",
            "HowWeFeelEmotions.csv",
            "StreamingHistory1.json",
        ] {
            let once = folder(name);
            assert_eq!(folder(&format!("{once}.json")), once);
        }
    }

    #[test]
    fn glued_digits_are_dropped_one_per_call() {
        let once = folder("StreamingHistory12.json");
        assert_eq!(once, "streaming_history1");
        let twice = folder(&format!("{once}.json"));
        assert_eq!(twice, "streaming_history");
        assert_eq!(folder(&format!("{twice}.json")), twice);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let result = filename_to_folder_name("image_0001.png");
        assert!(matches!(
            result,
            Err(Error::FolderNameMismatch { ref filename }) if filename == "image_0001.png"
        ));
    }

    #[test]
    fn missing_name_is_an_error() {
        assert!(filename_to_folder_name("0001.json").is_err());
        assert!(filename_to_folder_name("").is_err());
        assert!(filename_to_folder_name("🐮.json").is_err());
    }

    #[test]
    fn uppercase_extension_is_lowercased() {
        assert_eq!(folder("Report.JSON"), "report");
    }
}
