//! Soundtrack step: generate and mix the colored noise tracks.

use crate::media::probe_duration_secs;
use crate::noise::{NoiseMixer, NoiseSynthesizer};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{RunContext, RunState, SoundtrackOutput, StepOutcome};

/// Generates one noise track per configured color and mixes them.
///
/// Track durations match the composed base clip so the mux's
/// shortest-wins truncation has nothing to cut. Track files never
/// survive past the mix.
pub struct SoundtrackStep;

impl PipelineStep for SoundtrackStep {
    fn name(&self) -> &str {
        "Soundtrack"
    }

    fn validate_input(&self, ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let compose = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("compose step has not run"))?;
        if !compose.video_path.exists() {
            return Err(StepError::file_not_found(
                compose.video_path.display().to_string(),
            ));
        }
        if ctx.settings.noise.mix_colors.len() < 2 {
            return Err(StepError::invalid_input(
                "noise mix needs at least two colors configured",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let compose = state.compose.as_ref().expect("validated");

        let base_duration =
            probe_duration_secs(&ctx.settings.encoder, &compose.video_path)?;
        let duration_seconds = base_duration.ceil() as u32;

        let synth = NoiseSynthesizer::new(&ctx.settings.noise, &ctx.settings.encoder);
        let colors = ctx.settings.noise.mix_colors.clone();

        let mut tracks = Vec::new();
        for color in &colors {
            let output = ctx.work_path(&format!("noise_{}.mp3", color));
            let track = {
                let mut rng = ctx.rng();
                synth.synthesize(
                    *color,
                    duration_seconds,
                    ctx.settings.noise.track_volume,
                    &mut *rng,
                    output,
                )
            };
            match track {
                Ok(t) => {
                    ctx.logger.info(&format!(
                        "generated {} noise (seed {}, eq {}/{}/{} dB)",
                        t.color, t.seed, t.bass_gain_db, t.mid_gain_db, t.treble_gain_db
                    ));
                    tracks.push(t);
                }
                Err(e) => {
                    // A missing track must not reach the mixer; discard
                    // what was already rendered and abort.
                    for t in &tracks {
                        NoiseSynthesizer::discard(t);
                    }
                    return Err(e.into());
                }
            }
        }

        let mixer = NoiseMixer::new(&ctx.settings.noise, &ctx.settings.encoder);
        let audio_path = ctx.work_path("soundtrack.mp3");
        let audio_path = mixer.mix(&tracks, &audio_path)?;

        state.soundtrack = Some(SoundtrackOutput {
            audio_path,
            colors,
            duration_seconds,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .soundtrack
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("soundtrack result not recorded"))?;
        if !output.audio_path.exists() {
            return Err(StepError::invalid_output(format!(
                "soundtrack missing: {}",
                output.audio_path.display()
            )));
        }
        Ok(())
    }
}
