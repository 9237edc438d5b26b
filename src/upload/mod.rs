//! Upload platform client: tokens, resumable upload, metadata, playlists.

mod client;
mod metadata;
mod playlists;
mod token;

pub use client::{UploadClient, UploadError, UploadResult};
pub use metadata::{MetadataGenerator, VideoMetadata};
pub use playlists::PlaylistRef;
pub use token::{ChannelToken, TokenError, TokenManager, TokenResult, TokenStore};
