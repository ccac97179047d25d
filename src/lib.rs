//! ALICE Spatial: the web recompiled into walkable 3D.
//!
//! Pipeline: Extract → Classify (inline) → Group → Layout → `SceneGraph`,
//! with the LOD manager as a side channel over the finished scene.

pub mod classify;
pub mod dom;
pub mod engine;
pub mod extract;
pub mod net;
pub mod render;
pub mod scene;
pub mod section;

pub use engine::{Compilation, CompileError, CompilerConfig, SceneCompiler};
pub use scene::{CameraPose, LayoutMode, LodManager, SceneGraph};
