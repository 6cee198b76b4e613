//! Error type for the filename and file list helpers.

use thiserror::Error;

/// Errors for inputs that break the expectations of the warehouse helpers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The filename did not match the folder name pattern.
    /// Inputs should be filtered to JSON and CSV files first.
    #[error("Failed to extract folder name from filename: '{filename}'")]
    FolderNameMismatch { filename: String },

    #[error("Only JSON and CSV files should be uploaded (data source: '{data_source}')")]
    MixedFileFormats { data_source: String },

    #[error("Not a WhatsApp message: '{line}'")]
    InvalidChatMessage { line: String },
}
