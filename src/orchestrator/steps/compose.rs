//! Compose step: resolve layer assets and render the base clip.

use crate::compose::CompositionEngine;
use crate::models::{AssetCategory, CompositionLayer, CompositionPlan};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ComposeOutput, RunContext, RunState, StepOutcome};

/// Renders the five-layer base clip.
///
/// All layer assets are resolved and validated before the encoder is
/// invoked: a missing required asset aborts the run without any external
/// tool having started.
pub struct ComposeStep;

impl PipelineStep for ComposeStep {
    fn name(&self) -> &str {
        "Compose"
    }

    fn validate_input(&self, ctx: &RunContext, _state: &RunState) -> StepResult<()> {
        let root = ctx.asset_resolver().root().to_path_buf();
        if !root.exists() {
            return Err(StepError::precondition_failed(format!(
                "asset root does not exist: {}",
                root.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let resolver = ctx.asset_resolver();
        let variant = ctx.profile.base_variant;

        let mut layers = Vec::new();
        {
            let mut rng = ctx.rng();
            for &category in AssetCategory::composition_layers() {
                let path = resolver.pick(category, variant, &mut *rng)?;
                ctx.logger
                    .info(&format!("layer {}: {}", category, path.display()));
                layers.push(CompositionLayer { category, path });
            }
        }

        let plan = CompositionPlan::new(layers);
        let output = ctx.work_path("base_video.mp4");

        let engine = CompositionEngine::new(&ctx.settings.encoder);
        let inv = engine.build_args(&plan, &output).map_err(StepError::from)?;
        ctx.logger.command(&inv.display());

        let video_path = engine.compose(&plan, &output)?;

        state.compose = Some(ComposeOutput { video_path, plan });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("compose result not recorded"))?;
        if !output.video_path.exists() {
            return Err(StepError::invalid_output(format!(
                "composed clip missing: {}",
                output.video_path.display()
            )));
        }
        Ok(())
    }
}
