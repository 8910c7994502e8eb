use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{deploy, run};
use jsonbay_core::{AppConfigOverlay, DEFAULT_API_KEY, LogLevel, RoutesOverlay};

/// Jsonbay - Turn a JSON file into a hosted CRUD/GraphQL API
#[derive(Parser)]
#[command(name = "jsonbay")]
#[command(version)]
#[command(about = "Jsonbay - Turn a JSON file into a hosted CRUD/GraphQL API")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration flags shared by `deploy` and `run`.
///
/// Every flag is an override: an omitted flag keeps the base value, so the
/// merge over defaults (and over the persisted artifact on deploy) is
/// present-wins, base-otherwise.
#[derive(Args, Debug, Clone)]
pub struct ConfigFlags {
    /// Set the API to readonly (writes rejected)
    #[arg(short = 'r', long = "readonly")]
    pub readonly: bool,

    /// Enable the swagger interface support [default: enabled]
    #[arg(short = 's', long = "swagger", overrides_with = "no_swagger")]
    pub swagger: bool,

    /// Disable the swagger interface support
    #[arg(long = "no-swagger")]
    pub no_swagger: bool,

    /// Require API key authentication to access the API
    #[arg(short = 'a', long = "apikeyauth")]
    pub apikeyauth: bool,

    /// Log level of outputs [default: info]
    #[arg(short = 'l', long = "loglevel", value_parser = ["info", "debug"])]
    pub loglevel: Option<String>,

    /// Path to use for the API route [default: /api]
    #[arg(long = "apiRoute")]
    pub api_route: Option<String>,

    /// Path for the GraphQL interface [default: /graphql]
    #[arg(long = "graphqlRoute")]
    pub graphql_route: Option<String>,

    /// Path for the Swagger / OpenAPI specification [default: /api-spec]
    #[arg(long = "apispecRoute")]
    pub apispec_route: Option<String>,

    /// Path for the Swagger UI interface [default: /ui]
    #[arg(long = "swaggeruiRoute")]
    pub swaggerui_route: Option<String>,
}

impl ConfigFlags {
    /// Turn the flags into a partial configuration: only flags the user
    /// actually passed become overrides.
    pub fn overlay(&self) -> AppConfigOverlay {
        let enable_swagger = if self.no_swagger {
            Some(false)
        } else if self.swagger {
            Some(true)
        } else {
            None
        };

        // Values are pre-validated by clap's value_parser.
        let log_level = self.loglevel.as_deref().map(|level| match level {
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        });

        AppConfigOverlay {
            read_only: self.readonly.then_some(true),
            enable_swagger,
            enable_api_key_auth: self.apikeyauth.then_some(true),
            log_level,
            api_key: None,
            json_file_path: None,
            routes: RoutesOverlay {
                api_route_path: self.api_route.clone(),
                graphql_route_path: self.graphql_route.clone(),
                swagger_spec_route_path: self.apispec_route.clone(),
                swagger_ui_route_path: self.swaggerui_route.clone(),
            },
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update the stack folder and deploy the stack to the cloud
    Deploy {
        #[command(flatten)]
        config: ConfigFlags,

        /// Working directory that will be used for execution
        #[arg(short = 'p', long = "currentdirectory")]
        currentdirectory: Option<PathBuf>,
    },

    /// Run and test the API locally
    Run {
        /// Path of the JSON file to serve
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        config: ConfigFlags,

        /// Set your own static API key
        #[arg(long = "apikey", default_value = DEFAULT_API_KEY, requires = "apikeyauth")]
        apikey: String,

        /// Local port to serve on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

impl Cli {
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        match self.command {
            Commands::Deploy {
                config,
                currentdirectory,
            } => {
                // Evaluated once here, not per step: treat the environment as
                // already materialized during local template development.
                let local_dev = std::env::var("JSONBAY_ENV").is_ok_and(|v| v == "local");
                deploy::run(deploy::DeployOptions {
                    current_directory: currentdirectory,
                    overlay: config.overlay(),
                    local_dev,
                })
            }
            Commands::Run {
                file,
                config,
                apikey,
                port,
            } => {
                let mut overlay = config.overlay();
                if config.apikeyauth {
                    overlay.api_key = Some(apikey);
                }
                run::run(run::RunOptions {
                    file,
                    overlay,
                    port,
                })
            }
        }
    }
}
