//! The derived show model: everything the code generator consumes.

use serde::{Deserialize, Serialize};

use crate::effect::{Cue, OutputKind, OutputRef, OutputValue, PinClass};
use crate::DEFAULT_STATE;

/// The global state machine derived from trigger/exit columns.
///
/// The default state is always present and always first; the rest follow in
/// first-seen order so generated enums are deterministic. A single-state
/// model elides all state machinery from generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateModel {
    states: Vec<String>,
}

impl StateModel {
    pub fn new() -> Self {
        Self {
            states: vec![DEFAULT_STATE.to_string()],
        }
    }

    /// Record a state, preserving first-seen order.
    pub fn insert(&mut self, name: &str) {
        if !self.states.iter().any(|s| s == name) {
            self.states.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.iter().any(|s| s == name)
    }

    /// States in emission order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Whether the generated program needs a state machine at all.
    pub fn is_multi(&self) -> bool {
        self.states.len() > 1
    }
}

impl Default for StateModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregated description of one distinct output reference.
///
/// The first row mentioning an output fixes its binding; later contradictory
/// rows warn but never replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub output: OutputRef,
    pub description: String,
    pub kind: OutputKind,
    pub pin_class: PinClass,
    pub dormant: Option<OutputValue>,
}

/// The complete derived model of one table, ready for code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowModel {
    /// Cues in first-seen order.
    pub cues: Vec<Cue>,
    pub states: StateModel,
    /// One binding per distinct output reference, first-seen order.
    pub bindings: Vec<OutputBinding>,
    /// Distinct integer input pins with the cues they drive, first-seen order.
    pub input_pins: Vec<(u32, Vec<String>)>,
    /// Servo output pins; the index is the servo id.
    pub servo_pins: Vec<u32>,
    /// Variable outputs with their reconciled dormant values, first-seen order.
    pub variables: Vec<(String, Option<OutputValue>)>,
    /// Canonical waveform names in use, first-seen order.
    pub waveforms: Vec<String>,
}

impl ShowModel {
    /// Total number of generated routines.
    pub fn effect_count(&self) -> usize {
        self.cues.iter().map(|c| c.effects.len()).sum()
    }

    pub fn uses_waveform(&self, canonical: &str) -> bool {
        self.waveforms.iter().any(|w| w == canonical)
    }

    /// The servo table index for a servo output pin.
    pub fn servo_id(&self, pin: u32) -> Option<usize> {
        self.servo_pins.iter().position(|&p| p == pin)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|(v, _)| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_model_default_first() {
        let mut states = StateModel::new();
        states.insert("B");
        states.insert("A");
        states.insert("B");
        assert_eq!(states.states(), ["A", "B"]);
        assert!(states.is_multi());
    }

    #[test]
    fn test_state_model_single_state() {
        let states = StateModel::new();
        assert!(states.contains(DEFAULT_STATE));
        assert!(!states.is_multi());
    }
}
