//! Unique output paths for files that share a basename.

use crate::error::Error;
use crate::filename::filename_to_folder_name;

/// Create a unique output path for a file by appending its parent directory name to the file stem.
///
/// The result is a relative path under the folder name of the file.
/// Paths that already end with `-<parent directory>` are returned unchanged.
/// A file without a parent directory only gets moved under its folder name.
///
/// # Errors
/// Returns [`Error::FolderNameMismatch`] if the filename does not produce a folder name.
///
/// ```rust
/// use warehouse_utils::filename::create_unique_filename;
///
/// assert_eq!(
///     create_unique_filename("/path/to/file/pull_request_reviews_000001.json").unwrap(),
///     "pull_request_reviews/pull_request_reviews_000001-file.json"
/// );
/// assert_eq!(
///     create_unique_filename("todoist/todoist-filters_0000.json").unwrap(),
///     "todoist-filters/todoist-filters_0000-todoist.json"
/// );
/// ```
pub fn create_unique_filename(filepath: &str) -> Result<String, Error> {
    let (dirname, filename) = split_dirname(filepath);
    let parent = split_dirname(dirname).1;
    let (stem, extension) = split_extension(filename);

    if !parent.is_empty() && stem.ends_with(&format!("-{parent}")) {
        return Ok(filepath.to_string());
    }

    let folder_name = filename_to_folder_name(filename)?;
    let new_filename = if parent.is_empty() {
        filename.to_string()
    } else {
        format!("{stem}-{parent}{extension}")
    };

    Ok(join(&folder_name, &new_filename))
}

/// Split a `/` separated path into the directory part and the last component.
fn split_dirname(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Split a filename into stem and extension, with the dot kept in the extension.
/// Leading dots are part of the stem, so `.hidden` has no extension.
fn split_extension(filename: &str) -> (&str, &str) {
    let leading_dots = filename.len() - filename.trim_start_matches('.').len();
    match filename[leading_dots..].rfind('.') {
        Some(index) => filename.split_at(leading_dots + index),
        None => (filename, ""),
    }
}

fn join(directory: &str, filename: &str) -> String {
    if directory.is_empty() {
        filename.to_string()
    } else {
        format!("{directory}/{filename}")
    }
}


#[cfg(test)]
mod split_extension_tests {
    use super::*;

    #[test]
    fn splits_last_dot() {
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_extension("file.json"), ("file", ".json"));
    }

    #[test]
    fn no_extension() {
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension(""), ("", ""));
    }

    #[test]
    fn hidden_file_with_extension() {
        assert_eq!(split_extension(".config.toml"), (".config", ".toml"));
    }
}
