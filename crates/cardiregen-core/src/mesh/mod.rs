//! Mesh handling: OBJ parsing and normalization into renderer geometry.

mod geometry;
mod normalizer;
pub mod obj;

pub use geometry::{MeshSummary, RenderableGeometry};
pub use normalizer::normalize;
