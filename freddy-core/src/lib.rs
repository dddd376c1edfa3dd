//! Freddy Core Library - parametrized transforms and body-part hierarchies
//!
//! The transform algebra and the body-part tree are the heart of the crate.
//! Meshes, the camera, the matrix stack and the Freddy rig are the pieces a
//! renderer needs around them.

pub mod body;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod ik;
pub mod pose;
pub mod projection;
pub mod rig;
pub mod stack;
pub mod transform;

// Re-export commonly used types
pub use body::{BodyPart, NodeKind};
pub use draw::{render_tree, Canvas, Drawable, Figure, Rgb, Shape};
pub use error::{HierarchyError, PoseError, RigError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use pose::Pose;
pub use projection::{Camera, ProjectionMode};
pub use rig::Freddy;
pub use stack::MatrixStack;
pub use transform::{Axis, Combo, Parametrized, Rotate, RotateAbout, Scale, Transform, Translate};
