//! Deployment pipeline - ordered named steps over a shared context
//!
//! Steps run strictly sequentially; each assumes the filesystem effects of
//! its predecessor. The only control-flow rule is stop on first failure,
//! with the failure tagged by the step that raised it. Completed steps are
//! never rolled back; a partial deployment is a surfaced risk, not a
//! compensated one.

use std::path::PathBuf;
use thiserror::Error;

use crate::output;
use crate::process::ProcessError;
use crate::template::ValidationError;
use jsonbay_core::ConfigError;

/// Failure raised by a single step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] ProcessError),
}

/// A step failure tagged with the originating step's name
#[derive(Debug, Error)]
#[error("Step '{step}' failed: {source}")]
pub struct PipelineError {
    pub step: &'static str,
    #[source]
    pub source: StepError,
}

/// Mutable state threaded through the step sequence
pub struct Context {
    /// Directory of the project being deployed.
    pub project_dir: PathBuf,
    /// Root of the versioned template project.
    pub template_dir: PathBuf,
    /// Accumulated human-readable output from steps.
    pub output: String,
}

impl Context {
    pub fn new(project_dir: PathBuf, template_dir: PathBuf) -> Self {
        Self {
            project_dir,
            template_dir,
            output: String::new(),
        }
    }
}

type StepAction = Box<dyn Fn(&mut Context) -> Result<(), StepError>>;

/// A named, idempotent action over the shared context
pub struct Step {
    name: &'static str,
    action: StepAction,
}

impl Step {
    pub fn new(
        name: &'static str,
        action: impl Fn(&mut Context) -> Result<(), StepError> + 'static,
    ) -> Self {
        Self {
            name,
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Strictly sequential step runner
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }

    /// Run every step in order; the first failure skips all remaining steps.
    pub fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        for step in &self.steps {
            output::step(step.name);
            (step.action)(ctx).map_err(|source| PipelineError {
                step: step.name,
                source,
            })?;
            tracing::debug!(step = step.name, "step complete");
        }
        Ok(())
    }
}
