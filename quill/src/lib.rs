//! Crate for reading and writing mapping files, and for merging two mappings that share a namespace.
//!
//! This crate supports reading and writing Tiny v2 (`.tiny`) files, see the [`tiny_v2`] module, and reading the
//! older Tiny v1 format line by line, see the [`tiny_v1`] module.
//!
//! Two Tiny v2 mappings are merged with [`Mappings::merge`][tree::mappings::Mappings::merge], two Tiny v1 files
//! with [`TinyV1File::merge`][tiny_v1::TinyV1File::merge]. Both take [`MergeOptions`] and report the failures
//! listed in [`MergeError`].

mod lines;

pub mod tiny_v1;
pub mod tiny_v2;

pub mod tree;
mod action;
mod error;

pub use action::MergeOptions;
pub use error::{MergeError, Side};
