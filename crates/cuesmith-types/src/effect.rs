//! The normalized effect/cue model.
//!
//! Every type here is produced by the row validator; downstream components
//! (model builder, code generator) consume these typed records and never see
//! raw table text. All values are immutable once the show model is built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A digital logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A validated min/max/dormant literal.
///
/// The pin class decides which variant a row's literals take: a DIGITAL pin
/// carries levels, an ANALOG pin carries non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputValue {
    Level(Level),
    Analog(i64),
}

impl OutputValue {
    /// The level a variable initialized to this value holds: analog values
    /// collapse to HIGH when positive, LOW otherwise.
    pub fn as_level(&self) -> Level {
        match self {
            Self::Level(level) => *level,
            Self::Analog(n) if *n > 0 => Level::High,
            Self::Analog(_) => Level::Low,
        }
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Analog(n) => write!(f, "{n}"),
        }
    }
}

/// Output kind, as declared in the table's Output Type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Digital,
    Pwm,
    Servo,
    Variable,
}

impl OutputKind {
    /// Parse the table keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "DIGITAL" => Some(Self::Digital),
            "PWM" => Some(Self::Pwm),
            "SERVO" => Some(Self::Servo),
            "VARIABLE" => Some(Self::Variable),
            _ => None,
        }
    }

    /// The pin class this kind requires, or `None` for VARIABLE (either).
    pub fn required_class(&self) -> Option<PinClass> {
        match self {
            Self::Digital => Some(PinClass::Digital),
            Self::Pwm | Self::Servo => Some(PinClass::Analog),
            Self::Variable => None,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital => write!(f, "DIGITAL"),
            Self::Pwm => write!(f, "PWM"),
            Self::Servo => write!(f, "SERVO"),
            Self::Variable => write!(f, "VARIABLE"),
        }
    }
}

/// Pin class inferred from the literal forms of min/max/dormant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinClass {
    Digital,
    Analog,
}

impl fmt::Display for PinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital => write!(f, "DIGITAL"),
            Self::Analog => write!(f, "ANALOG"),
        }
    }
}

/// Trigger kind. Level kinds test the current read; edge kinds compare the
/// current read against the previous tick's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// `on_closed` / `on_high`
    LevelHigh,
    /// `on_open` / `on_low`
    LevelLow,
    /// `on_open_to_closed` / `on_low_to_high`
    Rising,
    /// `on_closed_to_open` / `on_high_to_low`
    Falling,
}

impl TriggerKind {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "on_closed" | "on_high" => Some(Self::LevelHigh),
            "on_open" | "on_low" => Some(Self::LevelLow),
            "on_open_to_closed" | "on_low_to_high" => Some(Self::Rising),
            "on_closed_to_open" | "on_high_to_low" => Some(Self::Falling),
            _ => None,
        }
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, Self::Rising | Self::Falling)
    }
}

/// The input driving a cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRef {
    Pin(u32),
    Variable(String),
    None,
}

impl InputRef {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The output an effect writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputRef {
    Pin(u32),
    Variable(String),
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(pin) => write!(f, "{pin}"),
            Self::Variable(name) => write!(f, "{name}"),
        }
    }
}

/// The state within which a cue may be triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    /// The cue runs regardless of the global state.
    Always,
    State(String),
}

impl TriggerState {
    /// The state name, if this is a named state.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Always => None,
            Self::State(name) => Some(name),
        }
    }
}

/// One normalized row: a timed waveform applied to one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Global sequence id; doubles as the generated routine number.
    pub id: usize,
    /// Owning cue name.
    pub cue: String,
    /// Free-text description from the table.
    pub description: String,
    pub output: OutputRef,
    pub kind: OutputKind,
    pub pin_class: PinClass,
    pub offset_ms: u32,
    pub duration_ms: u32,
    /// Canonical waveform name, already registry-resolved.
    pub waveform: String,
    /// Repeats per second; validated > 0.
    pub frequency: f32,
    pub min: OutputValue,
    pub max: OutputValue,
    pub dormant: Option<OutputValue>,
    /// Noise severity from param1 (fraction, default 1.0). Only the noise
    /// waveform reads it.
    pub severity: f32,
    /// Index into the servo table; assigned by the model builder for SERVO
    /// outputs, `None` otherwise.
    pub servo_id: Option<usize>,
}

/// A named group of effects sharing one trigger condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Declaration-order id; indexes the generated per-cue arrays.
    pub id: usize,
    pub name: String,
    pub input: InputRef,
    pub trigger: TriggerKind,
    pub trigger_state: TriggerState,
    /// State entered once every effect in the cue has terminated.
    pub exit_state: Option<String>,
    pub effects: Vec<Effect>,
}

impl Cue {
    pub fn has_input(&self) -> bool {
        !self.input.is_none()
    }
}
