//! Expand step: loop the compressed base clip out to the target duration.

use std::fs;

use crate::expand::DurationExpander;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ExpandStepOutput, RunContext, RunState, StepOutcome};

/// Runs the duration expansion and writes the final output video.
///
/// The intro is optional: when the profile asks for one but none is
/// available, the prepend is silently skipped. The compressed base clip
/// is consumed here once the concat has succeeded.
pub struct ExpandStep;

impl PipelineStep for ExpandStep {
    fn name(&self) -> &str {
        "Expand"
    }

    fn validate_input(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let compress = state
            .compress
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("compress step has not run"))?;
        if !compress.output_path.exists() {
            return Err(StepError::file_not_found(
                compress.output_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let source = state
            .compress
            .as_ref()
            .expect("validated")
            .output_path
            .clone();

        let intro = if ctx.profile.include_intro {
            let picked = {
                let mut rng = ctx.rng();
                ctx.asset_resolver().pick_intro(&mut *rng)
            };
            match picked {
                Ok(path) => {
                    ctx.logger.info(&format!("intro: {}", path.display()));
                    Some(path)
                }
                Err(e) => {
                    ctx.logger.info(&format!("no intro available, skipping: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let output = ctx.final_output_path();
        let expander = DurationExpander::new(&ctx.settings.encoder);

        let outcome = expander.expand(
            &source,
            ctx.target_duration_seconds as f64,
            ctx.profile.tolerance_seconds,
            intro.as_deref(),
            &ctx.work_dir,
            &output,
        )?;

        if outcome.variance_flagged {
            ctx.logger.warn(&format!(
                "achieved {}s vs target {}s (variance {:.1}s, tolerance {:.0}s)",
                outcome.achieved_duration_seconds,
                ctx.target_duration_seconds,
                outcome.variance_seconds,
                ctx.profile.tolerance_seconds
            ));
        }

        ctx.logger.info(&format!(
            "expanded {} repeats -> {:.0}s at {}",
            outcome.plan.repeat_count,
            outcome.achieved_duration_seconds,
            outcome.output_path.display()
        ));

        // The compressed base clip was an intermediate; the final video
        // no longer references it.
        fs::remove_file(&source).map_err(|e| StepError::IoError {
            operation: "delete compressed base clip".to_string(),
            source: e,
        })?;

        state.expand = Some(ExpandStepOutput {
            output_path: outcome.output_path,
            plan: outcome.plan,
            achieved_duration_seconds: outcome.achieved_duration_seconds,
            variance_seconds: outcome.variance_seconds,
            variance_flagged: outcome.variance_flagged,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .expand
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("expand result not recorded"))?;
        if !output.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "final video missing: {}",
                output.output_path.display()
            )));
        }
        Ok(())
    }
}
