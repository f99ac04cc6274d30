//! # Action Executor
//!
//! Performs a resolved [`Intent`] on the desktop.
//!
//! Every command ends in one of three states:
//!
//! - **Executed**: the click or keystrokes were injected
//! - **SkippedNoTarget**: a click had no target, or the target was not on screen
//! - **Failed**: unknown or malformed intent, safety abort, or injection error
//!
//! Errors never escape [`ActionExecutor::execute`]; they are logged and
//! folded into the returned flag.

use crate::intent::{Intent, IntentKind};
use deskhand_vision::{
    InputError, InputSimulator, SafetyError, SafetyGuard, ScreenPoint, TargetLocator,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors raised while executing an intent.
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("click command has no target image")]
    MissingTarget,

    #[error("target not found on screen: {0}")]
    TargetNotFound(String),

    #[error("type command has no text")]
    MissingText,

    #[error("nothing to do for {0} intent")]
    Unsupported(IntentKind),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Result type for execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Terminal state of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Executed,
    SkippedNoTarget,
    Failed,
}

/// What happened to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn executed() -> Self {
        Self {
            success: true,
            outcome: Outcome::Executed,
            error: None,
        }
    }

    fn from_error(e: &ExecuteError) -> Self {
        let outcome = match e {
            ExecuteError::MissingTarget | ExecuteError::TargetNotFound(_) => {
                Outcome::SkippedNoTarget
            }
            _ => Outcome::Failed,
        };
        Self {
            success: false,
            outcome,
            error: Some(e.to_string()),
        }
    }
}

/// Dispatches intents to the locator and the injection service.
pub struct ActionExecutor {
    input: Arc<dyn InputSimulator>,
    locator: Arc<dyn TargetLocator>,
    safety: SafetyGuard,
}

impl ActionExecutor {
    pub fn new(
        input: Arc<dyn InputSimulator>,
        locator: Arc<dyn TargetLocator>,
        safety: SafetyGuard,
    ) -> Self {
        Self {
            input,
            locator,
            safety,
        }
    }

    pub fn safety(&self) -> &SafetyGuard {
        &self.safety
    }

    async fn click_at(&self, point: ScreenPoint) -> ExecuteResult<()> {
        self.safety.check_bounds(point.x, point.y)?;
        self.safety.check_failsafe(self.input.as_ref()).await?;
        self.input.click(point.x, point.y).await?;
        self.safety.pause().await;
        Ok(())
    }

    async fn type_literal(&self, text: &str) -> ExecuteResult<()> {
        self.safety.check_failsafe(self.input.as_ref()).await?;
        self.input.type_text(text).await?;
        self.safety.pause().await;
        Ok(())
    }

    /// Execute `intent`, surfacing why it did not run.
    pub async fn try_execute(&self, intent: &Intent) -> ExecuteResult<()> {
        match intent.kind {
            IntentKind::Click => {
                let target = intent.target.as_deref().ok_or(ExecuteError::MissingTarget)?;
                let point = self
                    .locator
                    .locate(target)
                    .await
                    .ok_or_else(|| ExecuteError::TargetNotFound(target.to_string()))?;
                debug!(%point, "Clicking located target");
                self.click_at(point).await
            }
            IntentKind::Type => {
                let text = intent.text().ok_or(ExecuteError::MissingText)?;
                self.type_literal(text).await
            }
            IntentKind::Unknown => Err(ExecuteError::Unsupported(intent.kind)),
        }
    }

    /// Execute `intent` and report the terminal state.
    pub async fn execute_detailed(&self, intent: &Intent) -> ExecutionResult {
        match self.try_execute(intent).await {
            Ok(()) => {
                info!(kind = %intent.kind, "Action executed");
                ExecutionResult::executed()
            }
            Err(e @ (ExecuteError::Safety(_) | ExecuteError::Input(_))) => {
                error!(kind = %intent.kind, error = %e, "Error executing action");
                ExecutionResult::from_error(&e)
            }
            Err(e) => {
                warn!(kind = %intent.kind, reason = %e, "Action skipped");
                ExecutionResult::from_error(&e)
            }
        }
    }

    /// Execute `intent`; true when the action was performed.
    pub async fn execute(&self, intent: &Intent) -> bool {
        self.execute_detailed(intent).await.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskhand_vision::input::mock::MockSimulator;
    use deskhand_vision::{Region, SafetyConfig};

    /// Locator that always answers with the same point.
    struct FixedLocator(Option<ScreenPoint>);

    #[async_trait]
    impl TargetLocator for FixedLocator {
        async fn locate(&self, _target: &str) -> Option<ScreenPoint> {
            self.0
        }
    }

    fn executor(
        sim: Arc<MockSimulator>,
        point: Option<ScreenPoint>,
        config: SafetyConfig,
    ) -> ActionExecutor {
        let bounds = Some(Region::new(0, 0, 1920, 1080));
        ActionExecutor::new(
            sim,
            Arc::new(FixedLocator(point)),
            SafetyGuard::new(config, bounds),
        )
    }

    fn quiet() -> SafetyConfig {
        SafetyConfig::disabled()
    }

    #[tokio::test]
    async fn test_click_without_target_injects_nothing() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), Some(ScreenPoint::new(10, 10)), quiet());

        let result = exec.execute_detailed(&Intent::click(None)).await;
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::SkippedNoTarget);
        assert!(sim.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_target_not_found() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), None, quiet());

        let result = exec
            .execute_detailed(&Intent::click(Some("ok.png".to_string())))
            .await;
        assert_eq!(result.outcome, Outcome::SkippedNoTarget);
        assert!(sim.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_located_target() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), Some(ScreenPoint::new(40, 60)), quiet());

        assert!(exec.execute(&Intent::click(Some("ok.png".to_string()))).await);
        let events = sim.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_string(), "click 40,60");
    }

    #[tokio::test]
    async fn test_type_text() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), None, quiet());

        assert!(exec.execute(&Intent::type_text("abc")).await);
        let events = sim.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_string(), "type abc");
    }

    #[tokio::test]
    async fn test_type_without_text_fails() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), None, quiet());

        let intent = Intent {
            kind: IntentKind::Type,
            ..Intent::default()
        };
        let result = exec.execute_detailed(&intent).await;
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(sim.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_has_no_side_effects() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), Some(ScreenPoint::new(1, 1)), quiet());

        assert!(!exec.execute(&Intent::unknown()).await);
        assert!(sim.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_injection_failure_becomes_false() {
        let sim = Arc::new(MockSimulator::failing());
        let exec = executor(sim.clone(), None, quiet());

        let result = exec.execute_detailed(&Intent::type_text("abc")).await;
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_failsafe_corner_aborts() {
        let sim = Arc::new(MockSimulator::at(1919, 1079));
        let config = quiet().with_failsafe(true);
        let exec = executor(sim.clone(), Some(ScreenPoint::new(40, 60)), config);

        assert!(!exec.execute(&Intent::type_text("abc")).await);
        assert!(!exec.execute(&Intent::click(Some("ok.png".to_string()))).await);
        assert!(sim.events().await.is_empty());

        sim.set_position(960, 540).await;
        assert!(exec.execute(&Intent::type_text("abc")).await);
    }

    #[tokio::test]
    async fn test_out_of_bounds_point_rejected() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let exec = executor(sim.clone(), Some(ScreenPoint::new(4000, 10)), quiet());

        let intent = Intent::click(Some("ok.png".to_string()));
        assert!(matches!(
            exec.try_execute(&intent).await,
            Err(ExecuteError::Safety(SafetyError::OutOfBounds(4000, 10)))
        ));

        let result = exec.execute_detailed(&intent).await;
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(sim.events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_action() {
        let sim = Arc::new(MockSimulator::at(500, 500));
        let config = quiet().with_pause(std::time::Duration::from_millis(500));
        let exec = executor(sim.clone(), None, config);

        let start = tokio::time::Instant::now();
        assert!(exec.execute(&Intent::type_text("abc")).await);
        assert!(start.elapsed() >= std::time::Duration::from_millis(500));
    }
}
