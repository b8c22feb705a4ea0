//! Componentry: a component-library compiler.
//!
//! Ingests a directory tree describing UI components (views, per-variant
//! overrides, config files, readmes) and compiles it into a typed,
//! queryable entity graph of collections, components and variants, with
//! cascading configuration inheritance and lazy, memoized resolution of
//! cross-entity context references.

pub mod build;
pub mod compiler;
pub mod config;
pub mod data;
pub mod entities;
pub mod error;
pub mod fs;
pub mod logging;
pub mod naming;
pub mod render;
pub mod resolve;
pub mod watch;

pub use compiler::{Compiler, Found};
pub use config::CompilerConfig;
pub use entities::{Collection, Component, EntityRef, Variant, VariantCollection};
pub use error::CompileError;
pub use resolve::ContextResolver;
