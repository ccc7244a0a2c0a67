//! BSPX extension region editing.

mod edit;
mod rewriter;

pub use edit::{output_path_for, remove_lump, set_lump};
pub(crate) use edit::{ensure_distinct, open_input};
pub use rewriter::*;
