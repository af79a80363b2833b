//! Editor configuration.
//!
//! [`EditorConfiguration`] resolves the engine init options: built-in
//! defaults, then caller overrides, then `extra_inits` merged last.
//! [`Settings`] carries deployment settings loaded from the environment.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Default feature modules enabled in the engine.
pub const DEFAULT_PLUGINS: &[&str] = &[
    "advlist autolink lists link image charmap print preview anchor",
    "searchreplace visualblocks code fullscreen",
    "insertdatetime media mediaembed table paste code help wordcount",
];

/// Default toolbar layout. Contains the three media buttons.
pub const DEFAULT_TOOLBAR: &str = "undo redo | formatselect | bold italic backcolor | \
    alignleft aligncenter alignright alignjustify | videoUpload deleteVideo deleteImage | \
    bullist numlist outdent indent | removeformat | link image | \
    media live embeds uploads insertfile code fullscreen";

pub const DEFAULT_MENUBAR: &str = "insert";

pub const DEFAULT_HEIGHT: &str = "300px";

pub const DEFAULT_CONTENT_STYLE: &str = ".mce-object-video { width: 100% } ";

/// Elements the engine keeps when cleaning content.
pub const VALID_ELEMENTS: &str =
    "a[href|target=_blank],strong/b,div[align],br, video, source";

pub const EXTENDED_VALID_ELEMENTS: &str = "video[*], video[source], \
    video[controls|preload|width|height|data-setup],source[src|type], \
    object[type|data|width|height|classid|codebase],param[name|value],\
    embed[src|type|width|height|flashvars|wmode]";

/// Default bound on a single gateway call.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(60);

/// Caller-overridable engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfiguration {
    pub plugins: Option<Vec<String>>,
    pub toolbar: Option<String>,
    pub menubar: Option<String>,
    pub height: Option<String>,
    pub content_style: Option<String>,
    /// Merged last into the init options; overrides anything above.
    pub extra_inits: Map<String, Value>,
}

impl EditorConfiguration {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid editor configuration")
    }

    /// Load a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    pub fn plugins(&self) -> Vec<String> {
        self.plugins
            .clone()
            .unwrap_or_else(|| DEFAULT_PLUGINS.iter().map(|p| p.to_string()).collect())
    }

    pub fn toolbar(&self) -> &str {
        self.toolbar.as_deref().unwrap_or(DEFAULT_TOOLBAR)
    }

    pub fn menubar(&self) -> &str {
        self.menubar.as_deref().unwrap_or(DEFAULT_MENUBAR)
    }

    pub fn height(&self) -> &str {
        self.height.as_deref().unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn content_style(&self) -> &str {
        self.content_style.as_deref().unwrap_or(DEFAULT_CONTENT_STYLE)
    }

    /// Button names that appear in the resolved toolbar layout.
    pub fn toolbar_buttons(&self) -> Vec<&str> {
        self.toolbar()
            .split(|c: char| c.is_whitespace() || c == '|')
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Full init options handed to the engine.
    pub fn init_options(&self) -> Map<String, Value> {
        let mut options = Map::new();
        options.insert("selector".into(), json!("textarea"));
        options.insert("height".into(), json!(self.height()));
        options.insert("menubar".into(), json!(self.menubar()));
        options.insert("content_style".into(), json!(self.content_style()));
        options.insert("plugins".into(), json!(self.plugins()));
        options.insert("toolbar".into(), json!(self.toolbar()));
        options.insert("valid_elements".into(), json!(VALID_ELEMENTS));
        options.insert("valid_children".into(), json!("video[source]"));
        options.insert("extended_valid_elements".into(), json!(EXTENDED_VALID_ELEMENTS));
        options.insert("images_upload_base_path".into(), json!("/"));
        options.insert("images_upload_credentials".into(), json!(true));
        options.insert("media_live_embeds".into(), json!(true));
        options.insert("cleanup".into(), json!(false));
        options.insert("verify_html".into(), json!(false));
        options.insert("schema".into(), json!("html5"));

        for (key, value) in &self.extra_inits {
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

/// Deployment settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Substring an image source must contain to be deletable.
    pub storage_origin: Option<String>,

    /// Content id passed to every gateway call.
    pub content_id: Option<String>,

    /// Bound on a single gateway call (default: 60s).
    pub gateway_timeout: Duration,

    /// Remote asset API; when set, hosts use the HTTP gateway.
    pub asset_api_url: Option<String>,

    /// Path to uploads directory for the storage gateway (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /files).
    pub files_url: String,

    /// Optional TOML file with editor configuration overrides.
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self> {
        let storage_origin = env::var("EDITOR_STORAGE_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let content_id = env::var("EDITOR_CONTENT_ID").ok().filter(|v| !v.is_empty());

        let gateway_timeout = env::var("EDITOR_GATEWAY_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("EDITOR_GATEWAY_TIMEOUT_SECS must be a whole number of seconds")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);

        if gateway_timeout.is_zero() {
            anyhow::bail!("EDITOR_GATEWAY_TIMEOUT_SECS must be greater than zero");
        }

        let asset_api_url = env::var("EDITOR_ASSET_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let uploads_dir = env::var("EDITOR_UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let files_url = env::var("EDITOR_FILES_URL").unwrap_or_else(|_| "/files".to_string());

        let config_file = env::var("EDITOR_CONFIG_FILE").ok().map(PathBuf::from);

        Ok(Self {
            storage_origin,
            content_id,
            gateway_timeout,
            asset_api_url,
            uploads_dir,
            files_url,
            config_file,
        })
    }

    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Editor configuration from the configured file, or defaults.
    pub fn editor_configuration(&self) -> Result<EditorConfiguration> {
        match &self.config_file {
            Some(path) => EditorConfiguration::from_file(path),
            None => Ok(EditorConfiguration::default()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_origin: None,
            content_id: None,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            asset_api_url: None,
            uploads_dir: PathBuf::from("./uploads"),
            files_url: "/files".to_string(),
            config_file: None,
        }
    }
}
