//! Pipeline runner that executes steps in sequence.
//!
//! Stages run strictly sequentially: each consumes the previous stage's
//! sole output file. There is no intra-pipeline retry and no
//! cancellation - a run goes to completion or failure.

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{RunContext, RunState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// Executes steps in order, running validation before and after each
/// step, and tracks which steps were executed.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step:
    /// 1. Run `validate_input`
    /// 2. Run `execute`
    /// 3. Run `validate_output` (if execute returned Success)
    ///
    /// All fatal step errors unwind here; nothing is swallowed.
    pub fn run(&self, ctx: &RunContext, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            ctx.logger.phase(step_name);

            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.run_id, step_name, e));
            }

            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Execution failed: {}", e));
                ctx.logger.show_tail(step_name);
                PipelineError::step_failed(&ctx.run_id, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.run_id, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.logger.success("Pipeline completed");
        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{LogConfig, RunLogger};
    use crate::models::DurationProfile;
    use crate::orchestrator::errors::{StepError, StepResult};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        fail: bool,
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &RunContext, _state: &RunState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &RunContext, _state: &mut RunState) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StepError::precondition_failed("forced failure"))
            } else {
                Ok(StepOutcome::Success)
            }
        }

        fn validate_output(&self, _ctx: &RunContext, _state: &RunState) -> StepResult<()> {
            Ok(())
        }
    }

    fn test_context(dir: &std::path::Path) -> RunContext {
        let logger = Arc::new(
            RunLogger::new("pipe_test", dir.join("logs"), LogConfig::default(), None).unwrap(),
        );
        RunContext::with_rng(
            DurationProfile::short_form(),
            Settings::default(),
            "pipe_test",
            dir.join("work"),
            dir.join("out"),
            logger,
            StdRng::seed_from_u64(1),
        )
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = Pipeline::new()
            .with_step(CountingStep {
                name: "Step1",
                execute_count: Arc::new(AtomicUsize::new(0)),
                fail: false,
            })
            .with_step(CountingStep {
                name: "Step2",
                execute_count: Arc::new(AtomicUsize::new(0)),
                fail: false,
            });

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn steps_run_in_order() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut state = RunState::new("pipe_test");

        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new()
            .with_step(CountingStep {
                name: "Step1",
                execute_count: Arc::clone(&count1),
                fail: false,
            })
            .with_step(CountingStep {
                name: "Step2",
                execute_count: Arc::clone(&count2),
                fail: false,
            });

        let result = pipeline.run(&ctx, &mut state).unwrap();
        assert_eq!(result.steps_completed, vec!["Step1", "Step2"]);
        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_stops_later_steps() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut state = RunState::new("pipe_test");

        let count_after = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new()
            .with_step(CountingStep {
                name: "Failing",
                execute_count: Arc::new(AtomicUsize::new(0)),
                fail: true,
            })
            .with_step(CountingStep {
                name: "Never",
                execute_count: Arc::clone(&count_after),
                fail: false,
            });

        let err = pipeline.run(&ctx, &mut state).unwrap_err();
        assert!(err.to_string().contains("Failing"));
        assert_eq!(count_after.load(Ordering::SeqCst), 0);
    }
}
