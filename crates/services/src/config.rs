use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::ConfigError;

/// Host that lesson video references are resolved against when none is configured.
pub const DEFAULT_VIDEO_HOST: &str = "https://codewithchris.github.io/learningJSON/";

/// Which sources feed the catalog on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogMode {
    /// Bundled asset only.
    LocalOnly,
    /// Remote store only; it replaces whatever is installed.
    #[default]
    RemoteOnly,
    /// Bundled asset first, remote entries appended after it.
    LocalThenRemote,
}

impl FromStr for CatalogMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::LocalOnly),
            "remote" => Ok(Self::RemoteOnly),
            "both" => Ok(Self::LocalThenRemote),
            _ => Err(ConfigError::InvalidCatalogMode(raw.to_owned())),
        }
    }
}

/// Runtime configuration for the client.
///
/// Remote endpoints are optional; without them the in-memory backends are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub assets_dir: Option<PathBuf>,
    pub store_url: Option<Url>,
    pub auth_url: Option<Url>,
    pub api_key: String,
    pub video_host: Url,
    pub catalog_mode: CatalogMode,
}

fn parse_url(key: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl { key, raw })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Read `LEARN_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a URL or the catalog mode does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a URL or the catalog mode does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| non_blank(lookup(key));

        let store_url = get("LEARN_STORE_URL")
            .map(|raw| parse_url("LEARN_STORE_URL", raw))
            .transpose()?;
        let auth_url = get("LEARN_AUTH_URL")
            .map(|raw| parse_url("LEARN_AUTH_URL", raw))
            .transpose()?;
        let video_host = parse_url(
            "LEARN_VIDEO_HOST",
            get("LEARN_VIDEO_HOST").unwrap_or_else(|| DEFAULT_VIDEO_HOST.to_owned()),
        )?;
        let catalog_mode = get("LEARN_CATALOG_MODE")
            .map(|raw| raw.parse::<CatalogMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            assets_dir: get("LEARN_ASSETS_DIR").map(PathBuf::from),
            store_url,
            auth_url,
            api_key: get("LEARN_API_KEY").unwrap_or_default(),
            video_host,
            catalog_mode,
        })
    }
}
