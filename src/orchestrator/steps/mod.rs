//! Concrete pipeline steps in execution order.

mod compose;
mod compress;
mod expand;
mod mux;
mod soundtrack;
mod upload;

pub use compose::ComposeStep;
pub use compress::CompressStep;
pub use expand::ExpandStep;
pub use mux::MuxStep;
pub use soundtrack::SoundtrackStep;
pub use upload::UploadStep;
