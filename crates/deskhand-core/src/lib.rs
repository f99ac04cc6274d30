//! # Deskhand Core
//!
//! Turns free-text commands into desktop actions.
//!
//! ## Pipeline
//!
//! ```text
//! "click \"ok.png\""  ->  CommandResolver  ->  Intent  ->  ActionExecutor  ->  bool
//!                                                            |         |
//!                                                      TargetLocator  InputSimulator
//! ```
//!
//! Commands are handled one at a time. A command that cannot be understood
//! or performed yields `false`; nothing here panics or propagates errors to
//! the caller of [`Assistant::process_command`].

pub mod executor;
pub mod intent;

pub use deskhand_vision::{
    InputSimulator, LocatorConfig, Region, SafetyConfig, SafetyGuard, ScreenPoint, TargetLocator,
};
pub use executor::{ActionExecutor, ExecuteError, ExecuteResult, ExecutionResult, Outcome};
pub use intent::{
    CommandResolver, Intent, IntentKind, ResolveError, ResolveResult, ResolverConfig, TEXT_PARAM,
};

use deskhand_vision::VisionError;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors surfaced while assembling the pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

/// Result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Resolver plus executor: one call per command.
pub struct Assistant {
    resolver: CommandResolver,
    executor: ActionExecutor,
}

impl Assistant {
    pub fn new(resolver: CommandResolver, executor: ActionExecutor) -> Self {
        Self { resolver, executor }
    }

    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::new()
    }

    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Resolve and execute `command`, reporting the intent and how it ended.
    pub async fn process_detailed(&self, command: &str) -> (Intent, ExecutionResult) {
        info!(command, "Processing command");
        let intent = self.resolver.resolve(command);
        let result = self.executor.execute_detailed(&intent).await;
        (intent, result)
    }

    /// Resolve and execute `command`; true when an action was performed.
    pub async fn process_command(&self, command: &str) -> bool {
        self.process_detailed(command).await.1.success
    }
}

/// Builder for an [`Assistant`].
#[derive(Default)]
pub struct AssistantBuilder {
    resolver: ResolverConfig,
    safety: SafetyConfig,
    bounds: Option<Region>,
    input: Option<Arc<dyn InputSimulator>>,
    locator: Option<Arc<dyn TargetLocator>>,
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolver(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    pub fn safety(mut self, config: SafetyConfig) -> Self {
        self.safety = config;
        self
    }

    /// Monitor bounds used for the fail-safe corners and click bounds checks.
    pub fn bounds(mut self, bounds: Option<Region>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn input(mut self, input: Arc<dyn InputSimulator>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn locator(mut self, locator: Arc<dyn TargetLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Build the assistant.
    pub fn build(self) -> Result<Assistant> {
        deskhand_vision::config::validate_safety(&self.safety).map_err(VisionError::from)?;

        let input = self.input.ok_or(CoreError::MissingComponent("input"))?;
        let locator = self.locator.ok_or(CoreError::MissingComponent("locator"))?;

        let guard = SafetyGuard::new(self.safety, self.bounds);
        Ok(Assistant::new(
            CommandResolver::new(self.resolver),
            ActionExecutor::new(input, locator, guard),
        ))
    }
}
