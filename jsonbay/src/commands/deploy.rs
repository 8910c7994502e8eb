//! `jsonbay deploy` - update the stack folder and deploy it to the cloud

use std::env::current_dir;
use std::path::PathBuf;

use crate::output;
use crate::paths;
use crate::pipeline::{Context, Pipeline, Step};
use crate::process::{OutputMode, ProcessRunner};
use crate::template;
use jsonbay_core::{AppConfig, AppConfigOverlay};

const INSTALL_COMMAND: &str = "npm i";
const BUILD_COMMAND: &str = "npm run build";
const DEPLOY_COMMAND: &str = "node_modules/serverless/bin/serverless deploy";
const INFO_COMMAND: &str = "node_modules/serverless/bin/serverless info";

pub struct DeployOptions {
    /// Run in this directory instead of the caller's working directory.
    pub current_directory: Option<PathBuf>,
    /// Configuration overrides from CLI flags.
    pub overlay: AppConfigOverlay,
    /// Treat the environment as already materialized: skip the dependency
    /// install and the build.
    pub local_dev: bool,
}

pub fn run(options: DeployOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &options.current_directory {
        std::env::set_current_dir(dir)?;
    }
    let project_dir = current_dir()?;
    let template_dir = paths::template_root()?;

    output::section("Deploying stack");
    let pipeline = build_pipeline(options.overlay, options.local_dev);
    let mut ctx = Context::new(project_dir.clone(), template_dir);
    if let Err(e) = pipeline.run(&mut ctx) {
        output::error(&format!("Deployment failed at step '{}'", e.step));
        return Err(e.into());
    }
    if output::is_verbose() && !ctx.output.is_empty() {
        output::muted(ctx.output.trim_end());
    }
    output::success("Stack deployed");

    // Deployment success and info retrieval are decoupled outcomes: a failed
    // info fetch is surfaced as a warning, the command still exits zero.
    match ProcessRunner::new(&project_dir).run(INFO_COMMAND, OutputMode::Captured) {
        Ok(info) => {
            output::section("Deployment info");
            output::muted(info.trim_end());
        }
        Err(e) => {
            output::warning(&format!(
                "Stack is deployed, but fetching endpoint info failed: {e}"
            ));
        }
    }

    match AppConfig::load_merged_from_dir(&project_dir) {
        Ok(config) => print_summary(&config),
        Err(e) => output::warning(&format!("Could not reload configuration: {e}")),
    }

    Ok(())
}

/// Assemble the ordered step sequence. The local-development flag is
/// consumed here, once, not inside the steps.
pub(crate) fn build_pipeline(overlay: AppConfigOverlay, local_dev: bool) -> Pipeline {
    let mut steps = vec![
        Step::new("Validate project directory", |ctx| {
            template::validate_project_dir(&ctx.project_dir).map_err(Into::into)
        }),
        Step::new("Copy template files", |ctx| {
            template::copy_template(&ctx.template_dir, &ctx.project_dir).map_err(Into::into)
        }),
        Step::new("Update configuration", move |ctx| {
            let artifact = AppConfigOverlay::load_from_dir(&ctx.project_dir)?;
            let config = AppConfig::default().merged(&artifact).merged(&overlay);
            config.validate()?;
            let written = config.write_to_dir(&ctx.project_dir)?;
            ctx.output
                .push_str(&format!("Configuration written to {}\n", written.display()));
            Ok(())
        }),
    ];

    if !local_dev {
        steps.push(Step::new("Install dependencies", |ctx| {
            ProcessRunner::new(&ctx.project_dir).run(INSTALL_COMMAND, OutputMode::Streamed)?;
            Ok(())
        }));
        steps.push(Step::new("Build code", |ctx| {
            ProcessRunner::new(&ctx.project_dir).run(BUILD_COMMAND, OutputMode::Streamed)?;
            Ok(())
        }));
    }

    steps.push(Step::new("Deploy stack", |ctx| {
        ProcessRunner::new(&ctx.project_dir).run(DEPLOY_COMMAND, OutputMode::Streamed)?;
        Ok(())
    }));

    Pipeline::new(steps)
}

fn print_summary(config: &AppConfig) {
    output::section("Stack configuration");
    if config.enable_api_key_auth {
        output::warning(
            "This API is secured by an API key - send it in the {\"authorization\": apikey} header",
        );
    }
    if config.enable_swagger {
        output::step(&format!("Swagger UI     {}", config.routes.swagger_ui_route_path));
        output::step(&format!("GraphiQL       {}", config.routes.graphql_route_path));
        output::step(&format!(
            "Swagger spec   {}",
            config.routes.swagger_spec_route_path
        ));
    }
    output::step(&format!(
        "API routes     {}/{{routes}}",
        config.routes.api_route_path
    ));
}
