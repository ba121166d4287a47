//! Tool Integration
//!
//! Run external toolchain binaries (rustc) as subprocesses and capture
//! their output.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod r#trait;
pub mod builtin;

pub use r#trait::{Tool, ToolInput, ToolOutput};
pub use builtin::{RustcTool, run_command};
