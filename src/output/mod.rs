//! Inspection report writers.

mod json;
mod summary;
mod text;

pub use self::json::*;
pub use self::summary::*;
pub use self::text::*;
