pub mod pipeline;

pub use pipeline::{Compilation, CompileError, CompilerConfig, SceneCompiler};
