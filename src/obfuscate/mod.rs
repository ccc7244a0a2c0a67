//! Texture name obfuscation.

mod apply;
mod names;

pub use apply::*;
pub use names::*;
