//! Waveform function registry.
//!
//! A fixed catalog of named signal shapes, each with its aliases, its
//! dependency list, the C helper fragment emitted into generated sketches,
//! and a pure Rust evaluator used for offline testing. The registry is
//! immutable: built once by [`Registry::standard`], never mutated afterward.

pub mod catalog;
pub mod registry;

pub use registry::{Registry, RegistryError, WaveformFn};

/// Canonical name of the noise-family waveform. Its fragment carries the
/// `randCache` struct that generated globals reference, so the assembler
/// forces it ahead of every other fragment.
pub const RANDOM: &str = "RANDOM";
