//! Binary parser for the BSP container and its BSPX extension area.

mod container;
mod faces;
mod header;
mod textures;

pub use container::*;
pub use faces::*;
pub use header::{BspVersion, Lump, LumpKind, PrimaryHeader};
pub use textures::*;
