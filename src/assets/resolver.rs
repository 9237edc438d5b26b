//! Random asset picking with existence validation.
//!
//! Assets are numbered clips in fixed category directories under the
//! asset root. Picking never invents paths: the chosen file must exist
//! or the pick fails naming the exact expected path, before any external
//! tool is invoked.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::models::{AssetCategory, AssetVariant};

/// Errors from asset resolution.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The expected clip file does not exist.
    #[error("Asset not found: {path}")]
    NotFound { path: PathBuf },

    /// A category directory exists but holds no usable clips.
    #[error("No media files in asset directory: {dir}")]
    EmptyCategory { dir: PathBuf },

    /// Directory listing failed.
    #[error("Failed to read asset directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Media extensions accepted for free-form categories (intros).
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];

/// Resolves random clips from the category directories under one root.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    asset_root: PathBuf,
}

impl AssetResolver {
    /// Create a resolver over the given asset root.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    /// The asset root directory.
    pub fn root(&self) -> &Path {
        &self.asset_root
    }

    /// Directory holding the given category's clips.
    pub fn category_dir(&self, category: AssetCategory) -> PathBuf {
        self.asset_root.join(category.dir_name())
    }

    /// Pick a random clip from a numbered category.
    ///
    /// The chosen path is validated before being returned. Whether a
    /// failure is fatal is the caller's decision: composition layers are
    /// required, intros are skippable.
    pub fn pick<R: Rng>(
        &self,
        category: AssetCategory,
        variant: AssetVariant,
        rng: &mut R,
    ) -> AssetResult<PathBuf> {
        if category == AssetCategory::Intro {
            return self.pick_intro(rng);
        }

        let index = rng.gen_range(category.index_range());
        let path = self
            .category_dir(category)
            .join(variant.file_name(index));

        if !path.exists() {
            return Err(AssetError::NotFound { path });
        }

        Ok(path)
    }

    /// Pick a random intro clip.
    ///
    /// Intros are free-form files rather than numbered clips; any media
    /// file in the directory qualifies. A missing or empty directory is
    /// reported so the caller can skip the intro-prepend step.
    pub fn pick_intro<R: Rng>(&self, rng: &mut R) -> AssetResult<PathBuf> {
        let dir = self.category_dir(AssetCategory::Intro);
        if !dir.exists() {
            return Err(AssetError::NotFound { path: dir });
        }

        let entries = fs::read_dir(&dir).map_err(|e| AssetError::ReadDir {
            dir: dir.clone(),
            source: e,
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_media_file(p))
            .collect();
        candidates.sort();

        if candidates.is_empty() {
            return Err(AssetError::EmptyCategory { dir });
        }

        let index = rng.gen_range(0..candidates.len());
        Ok(candidates.swap_remove(index))
    }
}

fn is_media_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| MEDIA_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}
