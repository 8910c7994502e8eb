use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Project-relative location of the persisted configuration artifact.
///
/// Written exactly once by the deploy pipeline, read at every cold start.
pub const CONFIG_RELATIVE_PATH: &str = "config/appconfig.json";

/// Compiled-in fallback API key for local runs without an explicit `--apikey`.
pub const DEFAULT_API_KEY: &str = "303e526d-1939-4804-a5be-fa2e1997eed5";

/// Output verbosity of the served API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(ConfigError::InvalidLogLevel(other.to_string())),
        }
    }
}

/// Route paths of the served API, each a leading-`/` path string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Routes {
    /// CRUD API route
    #[serde(default = "default_api_route")]
    pub api_route_path: String,

    /// GraphQL interface route
    #[serde(default = "default_graphql_route")]
    pub graphql_route_path: String,

    /// Swagger / OpenAPI specification route
    #[serde(default = "default_swagger_spec_route")]
    pub swagger_spec_route_path: String,

    /// Swagger UI route
    #[serde(default = "default_swagger_ui_route")]
    pub swagger_ui_route_path: String,
}

fn default_api_route() -> String {
    "/api".to_string()
}

fn default_graphql_route() -> String {
    "/graphql".to_string()
}

fn default_swagger_spec_route() -> String {
    "/api-spec".to_string()
}

fn default_swagger_ui_route() -> String {
    "/ui".to_string()
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            api_route_path: default_api_route(),
            graphql_route_path: default_graphql_route(),
            swagger_spec_route_path: default_swagger_spec_route(),
            swagger_ui_route_path: default_swagger_ui_route(),
        }
    }
}

impl Routes {
    /// Every route must be a leading-`/` path.
    pub fn validate(&self) -> Result<()> {
        for route in [
            &self.api_route_path,
            &self.graphql_route_path,
            &self.swagger_spec_route_path,
            &self.swagger_ui_route_path,
        ] {
            if !route.starts_with('/') {
                return Err(ConfigError::InvalidRoutePath(route.clone()));
            }
        }
        Ok(())
    }
}

/// Canonical configuration of a served Jsonbay instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Serve the API readonly (writes rejected)
    #[serde(default)]
    pub read_only: bool,

    /// Enable the Swagger interface
    #[serde(default = "default_true")]
    pub enable_swagger: bool,

    /// Gate the API behind a shared-secret API key
    #[serde(default)]
    pub enable_api_key_auth: bool,

    /// Log level of the served instance
    #[serde(default)]
    pub log_level: LogLevel,

    /// Key material; required non-empty when `enable_api_key_auth` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path of the served JSON file (local runs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_file_path: Option<String>,

    /// Route paths of the served API
    #[serde(default)]
    pub routes: Routes,
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            enable_swagger: true,
            enable_api_key_auth: false,
            log_level: LogLevel::Info,
            api_key: None,
            json_file_path: None,
            routes: Routes::default(),
        }
    }
}

impl AppConfig {
    /// Overlay `overlay` onto this configuration, field by field.
    ///
    /// Route overrides are merged key-by-key: an omitted route keeps its
    /// base value, the `routes` object is never replaced wholesale.
    /// Pure; artifact I/O is the caller's responsibility.
    pub fn merged(mut self, overlay: &AppConfigOverlay) -> AppConfig {
        if let Some(read_only) = overlay.read_only {
            self.read_only = read_only;
        }
        if let Some(enable_swagger) = overlay.enable_swagger {
            self.enable_swagger = enable_swagger;
        }
        if let Some(enable_api_key_auth) = overlay.enable_api_key_auth {
            self.enable_api_key_auth = enable_api_key_auth;
        }
        if let Some(log_level) = overlay.log_level {
            self.log_level = log_level;
        }
        if let Some(api_key) = &overlay.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(json_file_path) = &overlay.json_file_path {
            self.json_file_path = Some(json_file_path.clone());
        }
        if let Some(api) = &overlay.routes.api_route_path {
            self.routes.api_route_path = api.clone();
        }
        if let Some(graphql) = &overlay.routes.graphql_route_path {
            self.routes.graphql_route_path = graphql.clone();
        }
        if let Some(spec) = &overlay.routes.swagger_spec_route_path {
            self.routes.swagger_spec_route_path = spec.clone();
        }
        if let Some(ui) = &overlay.routes.swagger_ui_route_path {
            self.routes.swagger_ui_route_path = ui.clone();
        }
        self
    }

    /// Consistency checks beyond shape: key material and route paths.
    pub fn validate(&self) -> Result<()> {
        if self.enable_api_key_auth
            && self.api_key.as_deref().map(str::trim).unwrap_or("").is_empty()
        {
            return Err(ConfigError::Validation(
                "API key auth is enabled but no API key is set".to_string(),
            ));
        }
        self.routes.validate()
    }

    /// Load the persisted artifact from a project directory and merge it
    /// over compiled-in defaults.
    pub fn load_merged_from_dir<P: AsRef<Path>>(dir: P) -> Result<AppConfig> {
        let overlay = AppConfigOverlay::load_from_dir(dir)?;
        Ok(AppConfig::default().merged(&overlay))
    }

    /// Persist this configuration to `config/appconfig.json` under `dir`.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(CONFIG_RELATIVE_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(path.clone(), e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| ConfigError::FileWrite(path.clone(), e))?;
        Ok(path)
    }
}

/// Partial configuration: CLI flag overrides and the persisted artifact
/// both deserialize into this shape before being merged over defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfigOverlay {
    pub read_only: Option<bool>,
    pub enable_swagger: Option<bool>,
    pub enable_api_key_auth: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub api_key: Option<String>,
    pub json_file_path: Option<String>,
    pub routes: RoutesOverlay,
}

/// Per-key route overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutesOverlay {
    pub api_route_path: Option<String>,
    pub graphql_route_path: Option<String>,
    pub swagger_spec_route_path: Option<String>,
    pub swagger_ui_route_path: Option<String>,
}

impl AppConfigOverlay {
    /// Load the artifact from `config/appconfig.json` under a project directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_from_file(dir.as_ref().join(CONFIG_RELATIVE_PATH))
    }

    /// Load the artifact from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(path.as_ref().to_path_buf(), e))?;
        Self::parse(&content)
    }

    /// Parse artifact content; a shape mismatch is a `JsonParse` error
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_in_values() {
        let config = AppConfig::default();
        assert!(!config.read_only);
        assert!(config.enable_swagger);
        assert!(!config.enable_api_key_auth);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.routes.api_route_path, "/api");
        assert_eq!(config.routes.graphql_route_path, "/graphql");
        assert_eq!(config.routes.swagger_spec_route_path, "/api-spec");
        assert_eq!(config.routes.swagger_ui_route_path, "/ui");
    }

    #[test]
    fn merge_overrides_present_fields_only() {
        let overlay = AppConfigOverlay {
            read_only: Some(true),
            routes: RoutesOverlay {
                api_route_path: Some("/v2".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = AppConfig::default().merged(&overlay);
        assert!(merged.read_only);
        assert_eq!(merged.routes.api_route_path, "/v2");
        // Untouched fields keep their base values, including sibling routes.
        assert_eq!(merged.routes.graphql_route_path, "/graphql");
        assert!(merged.enable_swagger);
    }

    #[test]
    fn merge_routes_key_by_key_without_cross_field_leakage() {
        let overlay = AppConfigOverlay {
            routes: RoutesOverlay {
                graphql_route_path: Some("/gql".to_string()),
                swagger_ui_route_path: Some("/swagger".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = AppConfig::default().merged(&overlay);
        assert_eq!(merged.routes.api_route_path, "/api");
        assert_eq!(merged.routes.graphql_route_path, "/gql");
        assert_eq!(merged.routes.swagger_spec_route_path, "/api-spec");
        assert_eq!(merged.routes.swagger_ui_route_path, "/swagger");
    }

    #[test]
    fn merge_is_pure_and_idempotent() {
        let overlay = AppConfigOverlay {
            enable_swagger: Some(false),
            ..Default::default()
        };
        let once = AppConfig::default().merged(&overlay);
        let twice = once.clone().merged(&overlay);
        assert_eq!(once, twice);
    }

    #[test]
    fn parse_accepts_partial_artifact() {
        let overlay = AppConfigOverlay::parse(r#"{"readOnly": true}"#).unwrap();
        assert_eq!(overlay.read_only, Some(true));
        assert_eq!(overlay.enable_swagger, None);
        assert_eq!(overlay.routes.api_route_path, None);
    }

    #[test]
    fn parse_rejects_malformed_artifact() {
        let err = AppConfigOverlay::parse(r#"{"routes": "/api"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::JsonParse(_)));

        let err = AppConfigOverlay::parse("not json").unwrap_err();
        assert!(matches!(err, ConfigError::JsonParse(_)));
    }

    #[test]
    fn artifact_round_trips_through_project_dir() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.read_only = true;
        config.routes.api_route_path = "/v2".to_string();
        let path = config.write_to_dir(dir.path()).unwrap();
        assert!(path.ends_with(CONFIG_RELATIVE_PATH));

        let reloaded = AppConfig::load_merged_from_dir(dir.path()).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn load_merged_applies_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("appconfig.json"),
            r#"{"enableApiKeyAuth": true, "apiKey": "secret"}"#,
        )
        .unwrap();

        let config = AppConfig::load_merged_from_dir(dir.path()).unwrap();
        assert!(config.enable_api_key_auth);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.routes.api_route_path, "/api");
    }

    #[test]
    fn validate_requires_key_material_with_auth_enabled() {
        let mut config = AppConfig::default();
        config.enable_api_key_auth = true;
        assert!(config.validate().is_err());

        config.api_key = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_route_without_leading_slash() {
        let mut config = AppConfig::default();
        config.routes.graphql_route_path = "graphql".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoutePath(_)));
    }

    #[test]
    fn log_level_parses_known_values_only() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("trace".parse::<LogLevel>().is_err());
    }

    #[test]
    fn override_scenario_from_defaults() {
        // override {apiRoute:"/v2", readonly:true} over defaults yields
        // {apiRoute:"/v2", readonly:true, graphqlRoute:"/graphql"}.
        let overlay = AppConfigOverlay::parse(
            r#"{"readOnly": true, "routes": {"apiRoutePath": "/v2"}}"#,
        )
        .unwrap();
        let merged = AppConfig::default().merged(&overlay);
        assert!(merged.read_only);
        assert_eq!(merged.routes.api_route_path, "/v2");
        assert_eq!(merged.routes.graphql_route_path, "/graphql");
    }
}
