//! Compress step: fit the merged clip to the profile's size budget.

use crate::compress::SizeBudgetCompressor;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{CompressOutput, RunContext, RunState, StepOutcome};

/// Compresses the merged clip to the profile's byte budget.
///
/// Consumes the merged clip either way - by re-encode or by copy.
pub struct CompressStep;

impl PipelineStep for CompressStep {
    fn name(&self) -> &str {
        "Compress"
    }

    fn validate_input(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let mux = state
            .mux
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("mux step has not run"))?;
        if !mux.merged_path.exists() {
            return Err(StepError::file_not_found(
                mux.merged_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let input = state.mux.as_ref().expect("validated").merged_path.clone();
        let output = ctx.work_path("base_compressed.mp4");

        let compressor = SizeBudgetCompressor::new(&ctx.settings.encoder);
        let outcome = compressor.compress(&input, &output, ctx.profile.size_budget_mb)?;

        if outcome.skipped_reencode {
            ctx.logger.info("already within size budget, copied");
        } else {
            ctx.logger.info(&format!(
                "compressed {} MB -> {} MB ({:.2}x)",
                outcome.input_size_bytes / (1024 * 1024),
                outcome.output_size_bytes / (1024 * 1024),
                outcome.ratio()
            ));
        }

        state.compress = Some(CompressOutput {
            output_path: outcome.output_path,
            skipped_reencode: outcome.skipped_reencode,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .compress
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("compress result not recorded"))?;
        if !output.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "compressed clip missing: {}",
                output.output_path.display()
            )));
        }
        Ok(())
    }
}
