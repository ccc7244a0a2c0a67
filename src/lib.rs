//! BSPX manager library
//!
//! Reads Quake BSP containers, rewrites their BSPX extension lumps and
//! obfuscates texture names.

pub mod bspx;
pub mod error;
pub mod obfuscate;
pub mod output;
pub mod parser;

pub use bspx::{output_path_for, remove_lump, rewrite, set_lump, ExtensionLumps};
pub use error::{BspError, Result};
pub use obfuscate::{obfuscate_file, TextureNameObfuscator};
pub use parser::{BspFile, BspVersion, LumpKind, LumpName};
