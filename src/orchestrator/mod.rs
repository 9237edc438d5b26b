//! Pipeline orchestration: steps, runner, and the job-level retry loop.

pub mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use runner::{JobResult, JobRunner};
pub use step::PipelineStep;
pub use types::{
    ComposeOutput, CompressOutput, ExpandStepOutput, MuxOutput, RunContext, RunState,
    SoundtrackOutput, StepOutcome, UploadOutput,
};

use steps::{ComposeStep, CompressStep, ExpandStep, MuxStep, SoundtrackStep, UploadStep};

/// Build the standard assembly pipeline.
///
/// Compose -> Soundtrack -> Mux -> Compress -> Expand -> Upload.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ComposeStep)
        .with_step(SoundtrackStep)
        .with_step(MuxStep)
        .with_step(CompressStep)
        .with_step(ExpandStep)
        .with_step(UploadStep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_has_all_stages_in_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Compose", "Soundtrack", "Mux", "Compress", "Expand", "Upload"]
        );
    }
}
