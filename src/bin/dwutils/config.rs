//! Configuration module for dwutils.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use serde::Deserialize;

use warehouse_utils::ndjson::{DEFAULT_JQ_FILTER, DEFAULT_JQ_PROGRAM, JsonTransformer};
use warehouse_utils::storage::{DEFAULT_GCS_ENDPOINT, GcsStore, LocalStore, S3Store, Storage};

use crate::{DwUtilsArgs, DwUtilsCommand};

/// Environment variable checked for a GCS access token when the config file has none.
pub const GCS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Object storage backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Buckets are directories under a local root directory
    #[default]
    Local,
    /// Google Cloud Storage
    Gcs,
    /// Amazon S3 or an S3 compatible server
    S3,
}

/// User configuration from the config file.
#[derive(Debug, Default, Deserialize)]
pub struct DwUtilsConfig {
    /// Only print changes without copying files.
    #[serde(default)]
    pub dryrun: bool,
    /// Overwrite existing files.
    #[serde(default)]
    pub force: bool,
    /// Convert JSON files to newline-delimited JSON when organizing.
    #[serde(default)]
    pub convert_json: bool,
    /// Print verbose output.
    #[serde(default)]
    pub verbose: bool,
    /// JSON transformer program.
    #[serde(default)]
    pub jq_program: Option<String>,
    /// JSON transformer filter.
    #[serde(default)]
    pub jq_filter: Option<String>,
    /// Object storage backend.
    #[serde(default)]
    pub storage: Option<StorageKind>,
    /// Root directory for local buckets.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
    /// GCS API endpoint.
    #[serde(default)]
    pub gcs_endpoint: Option<String>,
    /// GCS OAuth access token.
    #[serde(default)]
    pub gcs_token: Option<String>,
    /// S3 region. Uses the AWS environment when not set.
    #[serde(default)]
    pub s3_region: Option<String>,
    /// S3 compatible endpoint URL.
    #[serde(default)]
    pub s3_endpoint: Option<String>,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    dwutils: DwUtilsConfig,
}

impl DwUtilsConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        match warehouse_utils::config::read_user_config()? {
            Some(content) => Self::from_toml_str(&content).map_err(|e| {
                let path = warehouse_utils::config::CONFIG_PATH
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                anyhow!("Failed to parse config file {path}:\n{e}")
            }),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.dwutils)
            .map_err(|e| anyhow!("Failed to parse config: {e}"))
    }
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub dryrun: bool,
    pub force: bool,
    pub convert_json: bool,
    pub verbose: bool,
    pub transformer: JsonTransformer,
    pub storage: StorageKind,
    pub local_root: PathBuf,
    pub gcs_endpoint: String,
    pub gcs_token: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn from_args(args: &DwUtilsArgs) -> Result<Self> {
        let user_config = DwUtilsConfig::get_user_config()?;
        let env_token = std::env::var(GCS_TOKEN_ENV).ok();
        Self::from_args_and_config(args, &user_config, env_token)
    }

    /// Create config from given command line args and explicit user config.
    /// This is useful for testing without reading from the config file or environment.
    ///
    /// # Errors
    /// Returns an error if the local bucket root cannot be resolved.
    pub fn from_args_and_config(
        args: &DwUtilsArgs,
        user_config: &DwUtilsConfig,
        env_token: Option<String>,
    ) -> Result<Self> {
        let (print, force, json, storage) = match &args.command {
            Some(DwUtilsCommand::Organize {
                print, force, json, ..
            }) => (*print, *force, *json, None),
            Some(DwUtilsCommand::Bucket { storage, .. }) => (false, false, false, *storage),
            _ => (false, false, false, None),
        };

        // CLI args take priority over user config
        let dryrun = print || user_config.dryrun;
        let force = force || user_config.force;
        let convert_json = json || user_config.convert_json;
        let verbose = args.verbose || user_config.verbose;

        let transformer = JsonTransformer::new(
            user_config.jq_program.as_deref().unwrap_or(DEFAULT_JQ_PROGRAM),
            user_config.jq_filter.as_deref().unwrap_or(DEFAULT_JQ_FILTER),
        );

        let storage = storage.or(user_config.storage).unwrap_or_default();
        let local_root = match &user_config.local_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let gcs_endpoint = user_config
            .gcs_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GCS_ENDPOINT.to_string());
        let gcs_token = user_config
            .gcs_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or(env_token);
        let s3_region = user_config.s3_region.clone();
        let s3_endpoint = user_config.s3_endpoint.clone();

        Ok(Self {
            dryrun,
            force,
            convert_json,
            verbose,
            transformer,
            storage,
            local_root,
            gcs_endpoint,
            gcs_token,
            s3_region,
            s3_endpoint,
        })
    }

    /// Create the configured storage backend.
    ///
    /// # Errors
    /// Returns an error if the GCS endpoint is invalid.
    pub async fn storage(&self) -> Result<Storage> {
        match self.storage {
            StorageKind::Local => Ok(Storage::Local(LocalStore::new(&self.local_root))),
            StorageKind::Gcs => Ok(Storage::Gcs(GcsStore::new(
                &self.gcs_endpoint,
                self.gcs_token.clone(),
            )?)),
            StorageKind::S3 => Ok(Storage::S3(
                S3Store::from_env(self.s3_region.as_deref(), self.s3_endpoint.as_deref()).await,
            )),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Gcs => write!(f, "gcs"),
            Self::S3 => write!(f, "s3"),
        }
    }
}


#[cfg(test)]
mod test_config_from_args_and_config {
    use super::*;

    use crate::BucketAction;

    fn organize_args(print: bool, force: bool, json: bool) -> DwUtilsArgs {
        DwUtilsArgs {
            command: Some(DwUtilsCommand::Organize {
                path: Some(PathBuf::from(".")),
                output: None,
                print,
                force,
                json,
            }),
            completion: None,
            verbose: false,
        }
    }

    fn bucket_args(storage: Option<StorageKind>) -> DwUtilsArgs {
        DwUtilsArgs {
            command: Some(DwUtilsCommand::Bucket {
                action: BucketAction::List {
                    bucket: "raw".to_string(),
                    folders: false,
                },
                storage,
            }),
            completion: None,
            verbose: false,
        }
    }

    #[test]
    fn cli_flags_override_config() {
        let args = organize_args(true, true, true);
        let config = Config::from_args_and_config(&args, &DwUtilsConfig::default(), None).expect("should create config");
        assert!(config.dryrun);
        assert!(config.force);
        assert!(config.convert_json);
    }

    #[test]
    fn config_flags_used_when_cli_not_provided() {
        let args = organize_args(false, false, false);
        let user_config = DwUtilsConfig {
            dryrun: true,
            convert_json: true,
            ..Default::default()
        };
        let config = Config::from_args_and_config(&args, &user_config, None).expect("should create config");
        assert!(config.dryrun);
        assert!(!config.force);
        assert!(config.convert_json);
    }

    #[test]
    fn default_transformer() {
        let args = organize_args(false, false, false);
        let config = Config::from_args_and_config(&args, &DwUtilsConfig::default(), None).expect("should create config");
        assert_eq!(config.transformer, JsonTransformer::default());
    }

    #[test]
    fn cli_storage_overrides_config_storage() {
        let user_config = DwUtilsConfig {
            storage: Some(StorageKind::Gcs),
            ..Default::default()
        };

        let config = Config::from_args_and_config(&bucket_args(Some(StorageKind::Local)), &user_config, None)
            .expect("should create config");
        assert_eq!(config.storage, StorageKind::Local);

        let config =
            Config::from_args_and_config(&bucket_args(None), &user_config, None).expect("should create config");
        assert_eq!(config.storage, StorageKind::Gcs);
    }

    #[tokio::test]
    async fn default_storage_is_local() {
        let config =
            Config::from_args_and_config(&bucket_args(None), &DwUtilsConfig::default(), None).expect("should create config");
        assert_eq!(config.storage, StorageKind::Local);
        assert_eq!(config.gcs_endpoint, DEFAULT_GCS_ENDPOINT);
        assert!(matches!(config.storage().await.expect("should create storage"), Storage::Local(_)));
    }

    #[test]
    fn config_token_takes_priority_over_environment() {
        let user_config = DwUtilsConfig {
            gcs_token: Some("from-config".to_string()),
            ..Default::default()
        };
        let config = Config::from_args_and_config(&bucket_args(None), &user_config, Some("from-env".to_string()))
            .expect("should create config");
        assert_eq!(config.gcs_token.as_deref(), Some("from-config"));

        let config =
            Config::from_args_and_config(&bucket_args(None), &DwUtilsConfig::default(), Some("from-env".to_string()))
                .expect("should create config");
        assert_eq!(config.gcs_token.as_deref(), Some("from-env"));
    }

    #[tokio::test]
    async fn gcs_storage_with_invalid_endpoint_is_an_error() {
        let user_config = DwUtilsConfig {
            storage: Some(StorageKind::Gcs),
            gcs_endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        let config = Config::from_args_and_config(&bucket_args(None), &user_config, None).expect("should create config");
        assert!(config.storage().await.is_err());
    }

    #[tokio::test]
    async fn s3_storage_uses_configured_region_and_endpoint() {
        let user_config = DwUtilsConfig {
            storage: Some(StorageKind::S3),
            s3_region: Some("eu-north-1".to_string()),
            s3_endpoint: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };
        let config = Config::from_args_and_config(&bucket_args(None), &user_config, None).expect("should create config");
        match config.storage().await.expect("should create storage") {
            Storage::S3(store) => {
                assert_eq!(store.region(), Some("eu-north-1"));
                assert_eq!(store.endpoint(), Some("http://localhost:9000"));
            }
            other => panic!("expected S3 storage, got {other}"),
        }
    }
}
