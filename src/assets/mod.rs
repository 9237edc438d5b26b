//! Source asset resolution.

mod resolver;

pub use resolver::{AssetError, AssetResolver, AssetResult};
