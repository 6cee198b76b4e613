//! Location of the shared user config file.

use std::path::PathBuf;
use std::sync::LazyLock;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/warehouse-utils.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Read the user config file contents.
///
/// Returns `None` if the file does not exist or the home directory is unknown.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn read_user_config() -> anyhow::Result<Option<String>> {
    let Some(path) = CONFIG_PATH.as_deref() else {
        return Ok(None);
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(anyhow::anyhow!("Failed to read config file {}: {error}", path.display())),
    }
}
