//! Step Execution Engine
//!
//! The core engine that drives a configuration's execution plan:
//! - Steps run strictly in order
//! - Groups within a step run concurrently, one thread each
//! - Every group in a step runs to completion before the step is judged
//! - The first failing step aborts the run

use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Instant;

use log::{debug, error, info};
use thiserror::Error;

use crate::config::{Config, Group};

use super::group::{run_group, GroupContext, GroupError};
use super::output::OutputStore;
use super::registry::GroupRegistry;

/// Terminal error of a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A step names a group that is not configured.
    #[error("group {0} not defined")]
    UndefinedGroup(String),

    /// One or more groups in a step failed. `step` is 1-based.
    #[error("step {step} failed")]
    StepFailed {
        step: usize,
        failures: Vec<GroupError>,
    },
}

/// Execution engine for a loaded configuration.
///
/// # Example
///
/// ```rust,no_run
/// use keepup::config::load_config;
/// use keepup::execution::Engine;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("~/.config/keepup/keepup.yml")?;
///     let mut engine = Engine::new(config);
///     engine.run()?;
///     Ok(())
/// }
/// ```
pub struct Engine {
    config: Config,
    registry: GroupRegistry,
    outputs: OutputStore,
    dry_run: bool,
    working_dir: Option<PathBuf>,
}

impl Engine {
    /// Creates a new engine and indexes the configured groups.
    pub fn new(config: Config) -> Self {
        let registry = GroupRegistry::build(&config.groups);
        if registry.is_empty() {
            debug!("No groups configured");
        } else {
            debug!("Indexed {} groups", registry.len());
        }
        let dry_run = config.settings.dry_run;
        let working_dir = config.settings.working_dir.clone();

        Self {
            config,
            registry,
            outputs: OutputStore::new(),
            dry_run,
            working_dir,
        }
    }

    /// Enables or disables dry run mode.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Sets the working directory for group processes.
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = Some(dir.into());
    }

    /// Captured outputs of the most recent run.
    pub fn outputs(&self) -> &OutputStore {
        &self.outputs
    }

    /// Executes every step in order.
    ///
    /// Each call starts from an empty output store, so placeholders only
    /// ever resolve against groups of the same run.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All steps completed and every group succeeded
    /// * `Err(EngineError::UndefinedGroup)` - A step referenced an unknown
    ///   group; none of that step's groups ran
    /// * `Err(EngineError::StepFailed)` - A group failed; later steps did not
    ///   start
    pub fn run(&mut self) -> Result<(), EngineError> {
        let start_time = Instant::now();
        self.outputs = OutputStore::new();

        if self.dry_run {
            info!("Mode: DRY RUN (commands will not execute)");
        }

        for (index, step) in self.config.execution.iter().enumerate() {
            let step_number = index + 1;
            info!("Starting step {}: {:?}", step_number, step.group);

            let groups = self.resolve_step(&step.group)?;
            let failures = self.run_step(&groups);

            if !failures.is_empty() {
                for failure in &failures {
                    error!("Error: {}", failure);
                }
                return Err(EngineError::StepFailed {
                    step: step_number,
                    failures,
                });
            }

            info!("Step {} completed successfully", step_number);
        }

        info!(
            "Execution completed: {} steps in {:.2?}",
            self.config.execution.len(),
            start_time.elapsed()
        );

        Ok(())
    }

    /// Looks up every group of a step before any of them starts.
    fn resolve_step(&self, names: &[String]) -> Result<Vec<&Group>, EngineError> {
        names
            .iter()
            .map(|name| {
                self.registry.lookup(name).ok_or_else(|| {
                    error!("Group '{}' is not defined", name);
                    EngineError::UndefinedGroup(name.clone())
                })
            })
            .collect()
    }

    /// Runs the groups of one step concurrently and waits for all of them.
    ///
    /// Returns the failures in completion order.
    fn run_step(&self, groups: &[&Group]) -> Vec<GroupError> {
        let ctx = GroupContext {
            global_env: &self.config.env,
            outputs: &self.outputs,
            working_dir: self.working_dir.as_ref(),
            dry_run: self.dry_run,
        };
        let ctx = &ctx;

        let (tx, rx) = channel();

        thread::scope(|scope| {
            for &group in groups {
                let tx = tx.clone();
                scope.spawn(move || {
                    if let Err(e) = run_group(group, ctx) {
                        // Receiver outlives the scope
                        let _ = tx.send(e);
                    }
                });
            }
        });
        drop(tx);

        rx.into_iter().collect()
    }
}
