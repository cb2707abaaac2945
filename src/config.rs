//! Configuration types for usenet-ul
//!
//! The configuration is a flat YAML document. Field names are snake_case;
//! the upper-case keys used by older configuration files (`PARPAR`,
//! `NYUU_CONFIG_PRIVATE`, ...) are accepted as aliases.
//!
//! ```yaml
//! nyuu_config_private: /home/me/nyuu/private.json
//! nzb_output_path: /home/me/nzbs
//! extensions: [mkv, mp4]
//! ```

use crate::error::{Error, Result};
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key in the posting tool's JSON config that names the raw article drop directory
pub const DUMP_FAILED_POSTS_KEY: &str = "dump-failed-posts";

/// File name of the resume ledger inside the state directory
pub const RESUME_FILE_NAME: &str = "uploads.resume";

/// What to do when a receipt already exists at its destination
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionAction {
    /// Replace the existing receipt
    #[default]
    Overwrite,
    /// Keep both, appending " (1)", " (2)", ... to the new receipt's stem
    Rename,
}

/// External tool locations and arguments
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ParPar executable (looked up on PATH if None)
    #[serde(default, alias = "PARPAR")]
    pub parpar: Option<PathBuf>,

    /// Path to the Nyuu executable (looked up on PATH if None)
    #[serde(default, alias = "NYUU")]
    pub nyuu: Option<PathBuf>,

    /// Arguments passed to ParPar ahead of the per-item arguments
    #[serde(default = "default_parpar_args", alias = "PARPAR_ARGS")]
    pub parpar_args: Vec<String>,

    /// Whether to search PATH for executables that are not set explicitly (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            parpar: None,
            nyuu: None,
            parpar_args: default_parpar_args(),
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Resolved ParPar executable
    pub fn parpar_path(&self) -> Result<PathBuf> {
        resolve_binary("parpar", self.parpar.as_deref(), self.search_path)
    }

    /// Resolved Nyuu executable
    pub fn nyuu_path(&self) -> Result<PathBuf> {
        resolve_binary("nyuu", self.nyuu.as_deref(), self.search_path)
    }
}

fn resolve_binary(key: &str, explicit: Option<&Path>, search_path: bool) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None if search_path => which::which(key)
            .map_err(|_| Error::config(key, format!("{key} not set and not found in PATH")))?,
        None => return Err(Error::config(key, format!("{key} executable is not set"))),
    };

    if !path.is_file() {
        return Err(Error::config(
            key,
            format!("{} is not an existing file", path.display()),
        ));
    }
    Ok(path)
}

/// Posting tool configuration files, one per scope
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostingConfig {
    /// Nyuu config used for private uploads (required)
    #[serde(alias = "NYUU_CONFIG_PRIVATE")]
    pub nyuu_config_private: PathBuf,

    /// Nyuu config used for public uploads (falls back to the private one)
    #[serde(default, alias = "NYUU_CONFIG_PUBLIC")]
    pub nyuu_config_public: Option<PathBuf>,
}

/// Where receipts end up
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the receipt output tree (required, must exist)
    #[serde(alias = "NZB_OUTPUT_PATH")]
    pub nzb_output_path: PathBuf,

    /// Receipt collision handling (default: overwrite)
    #[serde(default)]
    pub receipt_collision: CollisionAction,
}

/// Input selection defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Extensions matched when no glob or disc mode is requested (default: ["mkv"])
    #[serde(default = "default_extensions", alias = "EXTENSIONS")]
    pub extensions: Vec<String>,

    /// Extensions of sibling files uploaded together with a plain file (default: ["ass", "srt"])
    #[serde(default = "default_related_extensions", alias = "RELATED_EXTENSIONS")]
    pub related_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            related_extensions: default_related_extensions(),
        }
    }
}

/// Scratch and state directories
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Run the tools in per-item scratch directories instead of next to the input (default: true)
    #[serde(default = "default_true", alias = "USE_TEMP_DIR")]
    pub use_temp_dir: bool,

    /// Parent of the per-item scratch directories (default: `<system temp>/.usenet-ul`)
    #[serde(default = "default_temp_dir_path", alias = "TEMP_DIR_PATH")]
    pub temp_dir_path: PathBuf,

    /// Where the resume ledger lives (default: `~/.usenet-ul`)
    #[serde(default = "default_appdata_dir_path", alias = "APPDATA_DIR_PATH")]
    pub appdata_dir_path: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            use_temp_dir: true,
            temp_dir_path: default_temp_dir_path(),
            appdata_dir_path: default_appdata_dir_path(),
        }
    }
}

/// Main configuration
///
/// All sub-configs are flattened, so the YAML document stays a single level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// External tool paths and ParPar arguments
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Nyuu configuration files
    #[serde(flatten)]
    pub posting: PostingConfig,

    /// Receipt output tree
    #[serde(flatten)]
    pub output: OutputConfig,

    /// Extension defaults
    #[serde(flatten)]
    pub discovery: DiscoveryConfig,

    /// Scratch and state directories
    #[serde(flatten)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Build a config with defaults for everything but the two required paths
    pub fn new(nyuu_config_private: PathBuf, nzb_output_path: PathBuf) -> Self {
        Self {
            tools: ToolsConfig::default(),
            posting: PostingConfig {
                nyuu_config_private,
                nyuu_config_public: None,
            },
            output: OutputConfig {
                nzb_output_path,
                receipt_collision: CollisionAction::default(),
            },
            discovery: DiscoveryConfig::default(),
            workspace: WorkspaceConfig::default(),
        }
    }

    /// Read and parse a YAML configuration file
    ///
    /// The result is not validated; call [`Config::validate`] before use.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file {}: {}", path.display(), e),
            key: None,
        })?;
        debug!(?path, "loaded configuration file");
        Self::from_yaml_str(&text)
    }

    /// Parse a YAML configuration document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for malformed documents and missing required keys.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check every path and list once, at the boundary
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !self.posting.nyuu_config_private.is_file() {
            return Err(Error::config(
                "nyuu_config_private",
                format!(
                    "{} is not an existing file",
                    self.posting.nyuu_config_private.display()
                ),
            ));
        }

        if let Some(public) = &self.posting.nyuu_config_public
            && !public.is_file()
        {
            return Err(Error::config(
                "nyuu_config_public",
                format!("{} is not an existing file", public.display()),
            ));
        }

        if !self.output.nzb_output_path.is_dir() {
            return Err(Error::config(
                "nzb_output_path",
                format!(
                    "{} is not an existing directory",
                    self.output.nzb_output_path.display()
                ),
            ));
        }

        if self.discovery.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::config("extensions", "at least one extension is required"));
        }

        self.tools.parpar_path()?;
        self.tools.nyuu_path()?;

        Ok(())
    }

    /// Create the state directory and, if enabled, the scratch parent directory
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.workspace.appdata_dir_path)?;
        if self.workspace.use_temp_dir {
            std::fs::create_dir_all(&self.workspace.temp_dir_path)?;
        }
        Ok(())
    }

    /// Nyuu config for `scope`; public falls back to private
    pub fn posting_config(&self, scope: Scope) -> &Path {
        match (scope, &self.posting.nyuu_config_public) {
            (Scope::Public, Some(public)) => public,
            _ => &self.posting.nyuu_config_private,
        }
    }

    /// Shared scratch directory, if enabled
    pub fn work_dir(&self) -> Option<&Path> {
        self.workspace
            .use_temp_dir
            .then_some(self.workspace.temp_dir_path.as_path())
    }

    /// Location of the resume ledger
    pub fn resume_file(&self) -> PathBuf {
        self.workspace.appdata_dir_path.join(RESUME_FILE_NAME)
    }
}

/// Read the raw article drop directory out of a Nyuu JSON config
///
/// This is the only key read from the posting tool's config. A missing
/// file, invalid JSON or a missing key is a fatal configuration error.
pub fn read_raw_dump_dir(posting_config: &Path) -> Result<PathBuf> {
    let text = std::fs::read_to_string(posting_config).map_err(|e| {
        Error::config(
            DUMP_FAILED_POSTS_KEY,
            format!("cannot read {}: {}", posting_config.display(), e),
        )
    })?;

    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        Error::config(
            DUMP_FAILED_POSTS_KEY,
            format!("{} is not valid JSON: {}", posting_config.display(), e),
        )
    })?;

    let dump = value
        .get(DUMP_FAILED_POSTS_KEY)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::config(
                DUMP_FAILED_POSTS_KEY,
                format!(
                    "{DUMP_FAILED_POSTS_KEY} is not defined in {}",
                    posting_config.display()
                ),
            )
        })?;

    Ok(std::path::absolute(dump)?)
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_parpar_args() -> Vec<String> {
    vec![
        "--overwrite".into(),
        "-s700k".into(),
        "--slice-size-multiple=700K".into(),
        "--max-input-slices=4000".into(),
        "-r1n*1.2".into(),
        "-R".into(),
    ]
}

fn default_extensions() -> Vec<String> {
    vec!["mkv".into()]
}

fn default_related_extensions() -> Vec<String> {
    vec!["ass".into(), "srt".into()]
}

fn default_temp_dir_path() -> PathBuf {
    std::env::temp_dir().join(".usenet-ul")
}

fn default_appdata_dir_path() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".usenet-ul")
}
