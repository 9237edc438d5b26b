//! Upload step: publish the finished video with generated metadata.

use std::fs;
use std::path::PathBuf;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{RunContext, RunState, StepOutcome, UploadOutput};
use crate::text::TextClient;
use crate::upload::{MetadataGenerator, TokenManager, UploadClient};

/// Uploads the final video, attaches a thumbnail when one is staged,
/// and fans the video out to every channel playlist.
///
/// Skipped entirely when uploads are disabled or no channel is
/// configured.
pub struct UploadStep;

impl UploadStep {
    /// A pre-rendered thumbnail staged next to the assets, if any.
    ///
    /// Thumbnail rendering happens outside this pipeline; only the
    /// attach call is made here.
    fn staged_thumbnail(ctx: &RunContext) -> Option<PathBuf> {
        let path = ctx
            .asset_resolver()
            .root()
            .join("thumbnails")
            .join("cover.png");
        path.exists().then_some(path)
    }
}

impl PipelineStep for UploadStep {
    fn name(&self) -> &str {
        "Upload"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let expand = state
            .expand
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("expand step has not run"))?;
        if !expand.output_path.exists() {
            return Err(StepError::file_not_found(
                expand.output_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StepResult<StepOutcome> {
        let upload_settings = &ctx.settings.upload;
        if !upload_settings.enabled {
            return Ok(StepOutcome::Skipped("uploads disabled".to_string()));
        }
        if upload_settings.channel_id.is_empty() {
            return Ok(StepOutcome::Skipped("no channel configured".to_string()));
        }

        let video_path = state
            .expand
            .as_ref()
            .expect("validated")
            .output_path
            .clone();

        // Proactive refresh; a failed refresh leaves the stored record
        // untouched and fails this run.
        let token_dir = PathBuf::from(&ctx.settings.paths.token_folder);
        let tokens = TokenManager::new(upload_settings, &token_dir)?;
        let token = tokens.ensure_fresh(&upload_settings.channel_id)?;

        // Metadata falls back to templates inside the generator.
        let text = TextClient::new(ctx.settings.text.clone())
            .map_err(|e| StepError::UploadFailed(e.to_string()))?;
        let metadata =
            MetadataGenerator::new(upload_settings, &text).generate(ctx.profile.target.nominal_hours());
        ctx.logger.info(&format!("title: {}", metadata.title));

        let client = UploadClient::new(upload_settings)?;
        let video_id = client.upload_video(&token.access_token, &video_path, &metadata)?;
        ctx.logger.success(&format!("uploaded video {}", video_id));

        if let Some(thumb_path) = Self::staged_thumbnail(ctx) {
            match fs::read(&thumb_path) {
                Ok(bytes) => {
                    if let Err(e) = client.set_thumbnail(&token.access_token, &video_id, bytes) {
                        ctx.logger.warn(&format!("thumbnail attach failed: {}", e));
                    }
                }
                Err(e) => ctx.logger.warn(&format!("thumbnail unreadable: {}", e)),
            }
        }

        // Per-playlist failures are warned and skipped inside the
        // fan-out; a listing failure is warned here - the video itself
        // is already live.
        let playlists_added = match client.add_to_all_playlists(&token.access_token, &video_id) {
            Ok(n) => n,
            Err(e) => {
                ctx.logger.warn(&format!("playlist fan-out failed: {}", e));
                0
            }
        };

        state.upload = Some(UploadOutput {
            video_id,
            title: metadata.title,
            playlists_added,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &RunContext, state: &RunState) -> StepResult<()> {
        let output = state
            .upload
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("upload result not recorded"))?;
        if output.video_id.is_empty() {
            return Err(StepError::invalid_output("upload returned empty video id"));
        }
        Ok(())
    }
}
