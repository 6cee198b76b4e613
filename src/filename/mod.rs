//! Filename normalization pipeline.
//!
//! Exported filenames go through case conversion and character cleanup,
//! then get mapped to a folder name that groups a family of files,
//! and finally get a unique name when several files share a basename.

mod case;
mod folder;
mod sanitize;
mod unique;

pub use case::camel_to_snake_case;
pub use folder::{DS_STORE, filename_to_folder_name, has_folder_name_extension, return_folder_name};
pub use sanitize::{clean_filename, fix_mis_encoded, fold_diacritics, is_emoji, name_to_folder_name};
pub use unique::create_unique_filename;
