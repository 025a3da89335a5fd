//! Block kinds and the static catalog of their properties.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod types;

pub use catalog::{AtlasLayout, BlockCatalog, BlockProps, TextureRegion, Tile};
pub use types::{BlockKind, FaceRole};
