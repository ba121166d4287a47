//! Storage abstraction and implementations for Quine.
//!
//! This crate provides a trait-based interface over the persisted state of
//! a run (the live candidate slot and the per-generation backup log) with a
//! plain filesystem implementation.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod trait_;
pub mod fs_store;

pub use trait_::{ArtifactStore, StorageError, Result, GenerationRecord};
pub use fs_store::FsArtifactStore;
