//! World module - the objects being rendered and the scene file they come from
//!
//! - Ordered list of scene objects, drawn in order with no depth sorting
//! - RON scene files describing camera, objects, movement and raster settings

mod config;
mod scene;

pub use config::*;
pub use scene::*;
