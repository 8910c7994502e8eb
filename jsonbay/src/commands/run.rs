//! `jsonbay run` - serve a JSON file as an API locally

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::output;
use jsonbay_core::{AppConfig, AppConfigOverlay};
use jsonbay_runtime::{ApiServer, Bootstrapper, ExecutionMode};

pub struct RunOptions {
    /// JSON file to serve.
    pub file: PathBuf,
    /// Configuration overrides from CLI flags (key material included when
    /// API key auth was requested).
    pub overlay: AppConfigOverlay,
    /// Local port to serve on.
    pub port: u16,
}

pub fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    // The runtime gate is async; the command blocks on it.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(options))
}

async fn run_async(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::default().merged(&options.overlay);
    config.json_file_path = Some(options.file.display().to_string());
    config.validate()?;

    let bootstrapper = Arc::new(Bootstrapper::new(
        config.clone(),
        ExecutionMode::Local {
            json_file: options.file,
        },
    ));

    let server = ApiServer::bind(SocketAddr::from(([127, 0, 0, 1], options.port))).await?;
    let addr = server.local_addr();

    // Surface a broken document or missing key material as a startup
    // failure instead of on the first request.
    bootstrapper.ready().await?;

    print_endpoints(&config, addr);
    server.serve(bootstrapper).await?;
    Ok(())
}

fn print_endpoints(config: &AppConfig, addr: SocketAddr) {
    output::section("Local API ready");
    if config.enable_api_key_auth {
        output::warning(
            "This API is secured by an API key - send it in the {\"authorization\": apikey} header",
        );
        if let Some(api_key) = &config.api_key {
            output::step(&format!("ApiKey         {api_key}"));
        }
    }
    if config.enable_swagger {
        output::success(&format!(
            "Swagger UI     http://{addr}{}",
            config.routes.swagger_ui_route_path
        ));
        output::success(&format!(
            "GraphiQL       http://{addr}{}",
            config.routes.graphql_route_path
        ));
        output::success(&format!(
            "Swagger spec   http://{addr}{}",
            config.routes.swagger_spec_route_path
        ));
    }
    output::success(&format!(
        "API routes     http://{addr}{}/{{routes}}",
        config.routes.api_route_path
    ));
}
