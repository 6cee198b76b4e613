//! Map an export directory to the folder name layout used for ingestion.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::Error;
use crate::filename::{create_unique_filename, filename_to_folder_name};
use crate::files::{filter_json_and_csv, repeated_names};

/// Output location for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Full path of the input file.
    pub source: PathBuf,
    /// Input path relative to the root directory, with `/` separators.
    pub relative: String,
    /// Output path relative to the output directory.
    pub target: Result<String, Error>,
}

/// Collect all visible files under the root directory, sorted.
/// Hidden files and directories are skipped.
#[must_use]
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !crate::is_hidden(entry))
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Plan output paths for the JSON and CSV files in the given list.
///
/// Files whose basename appears more than once get the name of their parent directory appended.
/// Other files keep their name and go under their folder name.
#[must_use]
pub fn plan(root: &Path, files: &[PathBuf]) -> Vec<PlannedFile> {
    let relative_paths: Vec<(PathBuf, String)> = files
        .iter()
        .filter_map(|file| {
            file.strip_prefix(root)
                .ok()
                .map(|relative| (file.clone(), crate::path_to_slash_string(relative)))
        })
        .collect();

    let all_relative: Vec<&str> = relative_paths.iter().map(|(_, relative)| relative.as_str()).collect();
    let candidates = filter_json_and_csv(&all_relative);
    let repeated = repeated_names(&candidates);
    let candidates: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let repeated: HashSet<&str> = repeated.iter().map(String::as_str).collect();

    let mut planned: Vec<PlannedFile> = relative_paths
        .into_par_iter()
        .filter(|(_, relative)| candidates.contains(relative.as_str()))
        .map(|(source, relative)| {
            let filename = crate::files::extract_filename(&relative, true);
            let target = if repeated.contains(filename.as_str()) {
                create_unique_filename(&relative)
            } else {
                filename_to_folder_name(&filename).map(|folder| format!("{folder}/{filename}"))
            };
            PlannedFile {
                source,
                relative,
                target,
            }
        })
        .collect();

    planned.sort_by(|a, b| a.source.cmp(&b.source));
    planned
}

/// Return the target paths that more than one input file maps to, sorted.
#[must_use]
pub fn find_conflicts(planned: &[PlannedFile]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for target in planned.iter().filter_map(|file| file.target.as_deref().ok()) {
        *counts.entry(target).or_default() += 1;
    }

    let mut conflicts: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(target, _)| target.to_string())
        .collect();

    conflicts.sort();
    conflicts
}
