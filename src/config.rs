//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/outline/outline.toml`
//! 3. Local config: `<outline_dir>/.outline.toml` (directory of the outline file)
//! 4. Environment variables: `OUTLINE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Options handed to the rich-text widget on construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Element id the widget mounts into
    pub holder: String,
    /// Placeholder shown in an empty editor
    pub placeholder: String,
    /// Minimum editor height in pixels
    pub min_height: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            holder: "element".into(),
            placeholder: "Start typing...".into(),
            min_height: 30,
        }
    }
}

/// Where uploaded media files end up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory receiving uploaded files
    pub dir: PathBuf,
    /// URL prefix under which `dir` is served
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
            base_url: "/media".into(),
        }
    }
}

/// Raw editor config for intermediate parsing (every field optional).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawEditorConfig {
    pub holder: Option<String>,
    pub placeholder: Option<String>,
    pub min_height: Option<u32>,
}

/// Raw media config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMediaConfig {
    pub dir: Option<PathBuf>,
    pub base_url: Option<String>,
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified in this layer, inherit from below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub default_name: Option<String>,
    pub id_prefix: Option<String>,
    pub outline_file: Option<PathBuf>,
    pub editor: RawEditorConfig,
    pub media: RawMediaConfig,
}

/// Unified configuration for outline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Name given to newly added nodes
    pub default_name: String,
    /// Prefix of client-generated node ids
    pub id_prefix: String,
    /// Outline file used when none is given on the command line
    pub outline_file: PathBuf,
    /// Rich-text widget options
    pub editor: EditorConfig,
    /// Upload target
    pub media: MediaConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_name: "New item".into(),
            id_prefix: "temp-".into(),
            outline_file: PathBuf::from("outline.json"),
            editor: EditorConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

fn default_media_dir() -> PathBuf {
    ProjectDirs::from("", "", "outline")
        .map(|dirs| dirs.data_dir().join("media"))
        .unwrap_or_else(|| PathBuf::from("~/.outline/media"))
}

/// Get the XDG config directory for outline.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "outline").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("outline.toml"))
}

/// Get the path to the local config file next to an outline file.
pub fn local_config_path(outline_dir: &Path) -> PathBuf {
    outline_dir.join(".outline.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; the input is returned unchanged if expansion fails.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.media.dir.to_string_lossy().as_ref());
        self.media.dir = PathBuf::from(expanded);
        let expanded = expand_env_vars(self.outline_file.to_string_lossy().as_ref());
        self.outline_file = PathBuf::from(expanded);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            default_name: overlay
                .default_name
                .clone()
                .unwrap_or_else(|| self.default_name.clone()),
            id_prefix: overlay
                .id_prefix
                .clone()
                .unwrap_or_else(|| self.id_prefix.clone()),
            outline_file: overlay
                .outline_file
                .clone()
                .unwrap_or_else(|| self.outline_file.clone()),
            editor: EditorConfig {
                holder: overlay
                    .editor
                    .holder
                    .clone()
                    .unwrap_or_else(|| self.editor.holder.clone()),
                placeholder: overlay
                    .editor
                    .placeholder
                    .clone()
                    .unwrap_or_else(|| self.editor.placeholder.clone()),
                min_height: overlay.editor.min_height.unwrap_or(self.editor.min_height),
            },
            media: MediaConfig {
                dir: overlay
                    .media
                    .dir
                    .clone()
                    .unwrap_or_else(|| self.media.dir.clone()),
                base_url: overlay
                    .media
                    .base_url
                    .clone()
                    .unwrap_or_else(|| self.media.base_url.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `outline_dir` - Optional directory of the outline file, for local config
    pub fn load(outline_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = outline_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply OUTLINE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("OUTLINE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("default_name") {
            settings.default_name = val;
        }
        if let Ok(val) = config.get_string("id_prefix") {
            settings.id_prefix = val;
        }
        if let Ok(val) = config.get_string("outline_file") {
            settings.outline_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("editor.holder") {
            settings.editor.holder = val;
        }
        if let Ok(val) = config.get_string("editor.placeholder") {
            settings.editor.placeholder = val;
        }
        if let Ok(val) = config.get_int("editor.min_height") {
            settings.editor.min_height = u32::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("editor.min_height out of range: {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("media.dir") {
            settings.media.dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("media.base_url") {
            settings.media.base_url = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# outline configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/outline/outline.toml
#   Local:  <outline_dir>/.outline.toml
#   Env:    OUTLINE_* environment variables (e.g. OUTLINE_EDITOR__MIN_HEIGHT=40)

# Name given to newly added chapters
# default_name = "New item"

# Prefix of ids generated before the outline is saved
# id_prefix = "temp-"

# Outline file used when -f/--file is not given
# outline_file = "outline.json"

[editor]
# holder = "element"
# placeholder = "Start typing..."
# min_height = 30

[media]
# dir = "~/.local/share/outline/media"
# base_url = "/media"
"#
        .to_string()
    }
}
