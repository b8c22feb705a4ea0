//! The entity graph model: collections, components and variants.

pub mod collection;
pub mod component;
pub mod entity;
pub mod variant;
pub mod variants;

pub use collection::{Collection, EntityRef, Item};
pub use component::Component;
pub use entity::{entity_id, EntityMeta, Identifiable, Orderable};
pub use variant::Variant;
pub use variants::VariantCollection;
