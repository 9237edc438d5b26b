//! Mux step: merge the base clip with the soundtrack.

use crate::mux::AvMuxer;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{MuxOutput, RunContext, RunState, StepOutcome};

/// Merges video and soundtrack; consumes (deletes) both inputs.
pub struct MuxStep;

impl PipelineStep for MuxStep {
    fn name(&self) -> &str {
        "Mux"
    }

    fn validate_input(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let compose = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("compose step has not run"))?;
        let soundtrack = state
            .soundtrack
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("soundtrack step has not run"))?;

        if !compose.video_path.exists() {
            return Err(StepError::file_not_found(
                compose.video_path.display().to_string(),
            ));
        }
        if !soundtrack.audio_path.exists() {
            return Err(StepError::file_not_found(
                soundtrack.audio_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let video = state.compose.as_ref().expect("validated").video_path.clone();
        let audio = state
            .soundtrack
            .as_ref()
            .expect("validated")
            .audio_path
            .clone();
        let output = ctx.work_path("merged.mp4");

        let muxer = AvMuxer::new(&ctx.settings.encoder);
        let outcome = muxer.merge(&video, &audio, &output)?;

        ctx.logger.info(&format!(
            "merged a/v ({})",
            if outcome.video_stream_copied {
                "video stream copied"
            } else {
                "video re-encoded"
            }
        ));

        state.mux = Some(MuxOutput {
            merged_path: outcome.output_path,
            video_stream_copied: outcome.video_stream_copied,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .mux
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("mux result not recorded"))?;
        if !output.merged_path.exists() {
            return Err(StepError::invalid_output(format!(
                "merged clip missing: {}",
                output.merged_path.display()
            )));
        }
        Ok(())
    }
}
