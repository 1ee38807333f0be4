//! Generates Rust FFI bindings from the Vulkan API registry (`vk.xml`).
//!
//! The registry is parsed into [`Registry`], narrowed to one API version and
//! a selection of extensions as a [`VersionView`], and rendered into seven
//! source units by [`Generator`].

#[macro_use]
extern crate serde_derive;

#[macro_use]
mod parse;
mod c;
pub mod config;
pub mod constants;
pub mod depends;
pub mod driver;
pub mod emit;
pub mod error;
pub mod layout;
pub mod names;
pub mod resolve;
mod types;
pub mod view;

pub use config::GeneratorConfig;
pub use driver::Generator;
pub use emit::{Category, OutputUnit};
pub use error::{GenError, Result};
pub use parse::{parse_file, parse_stream};
pub use types::*;
pub use view::VersionView;
