//! Shared types for the cuesmith compiler: the normalized effect/cue data
//! model, the derived show model, and structured diagnostics.

pub mod diag;
pub mod effect;
pub mod model;

pub use diag::{DiagCategory, DiagCode, Diagnostic, Diagnostics, Severity};
pub use effect::{
    Cue, Effect, InputRef, Level, OutputKind, OutputRef, OutputValue, PinClass, TriggerKind,
    TriggerState,
};
pub use model::{OutputBinding, ShowModel, StateModel};

/// Name of the state every generated program starts in.
pub const DEFAULT_STATE: &str = "A";
