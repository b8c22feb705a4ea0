//! The filesystem-to-entity build pipeline.

pub mod cascade;
pub mod transform;

pub use cascade::Cascade;
pub use transform::{TreeBuilder, RESERVED_KEYS};
