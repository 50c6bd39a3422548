//! Cuesmith code generator: compiles a validated [`cuesmith_types::ShowModel`]
//! into one self-contained Arduino sketch.
//!
//! # Generated program contract
//!
//! The sketch targets the cooperative Coroutines library plus the standard
//! Arduino runtime (`digitalWrite`, `analogWrite`, `Servo`). Layout, in
//! order:
//!
//! - dependency-closed waveform helper fragments (noise family first)
//! - the `scale()` helper
//! - the coroutine pool and per-cue `prevValue` / `isActive` / `startTimes`
//! - a state enum + `curr_state` (omitted for single-state models)
//! - variable-output initial values, the servo table, `randCache` globals
//! - one coroutine per effect
//! - `setup()` (pin modes, dormant initialization, unconditional cue starts)
//! - `loop()` (cue dispatch + coroutine pump)
//!
//! The generated scheduling model is static: a fixed-size pool, one resume
//! opportunity per routine per tick, no dynamic allocation.

pub mod error;
pub mod routine;
pub mod sketch;

pub use error::{CodegenError, CodegenResult};
pub use sketch::generate_sketch;
