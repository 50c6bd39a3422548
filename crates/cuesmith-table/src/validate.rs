//! The row validation chain.
//!
//! Checks run in a fixed order and the first failure aborts that row, but
//! diagnostics accumulate across all rows — generation is only attempted
//! once the whole table has been swept.

use cuesmith_signals::Registry;
use cuesmith_types::{
    DiagCode, Diagnostic, Diagnostics, Effect, InputRef, Level, OutputKind, OutputRef,
    OutputValue, PinClass, TriggerKind, TriggerState, DEFAULT_STATE,
};

use crate::row::RawRow;

/// A row that passed every check: the typed effect plus the cue attributes
/// the model builder groups on.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub row: u32,
    pub cue: String,
    pub input: InputRef,
    pub trigger: TriggerKind,
    pub trigger_state: TriggerState,
    pub exit_state: Option<String>,
    pub effect: Effect,
}

/// Validates rows one at a time, assigning global effect ids in table order.
pub struct RowValidator<'a> {
    registry: &'a Registry,
    next_id: usize,
}

impl<'a> RowValidator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            next_id: 0,
        }
    }

    /// Apply the full check chain to one record.
    ///
    /// Returns `None` after pushing a diagnostic if any check fails; the
    /// effect id counter only advances for valid rows.
    pub fn validate(&mut self, raw: &RawRow, diags: &mut Diagnostics) -> Option<ValidatedRow> {
        let row = raw.row;

        // Normalization: blank → NONE sentinels, state labels uppercased,
        // blank/NONE trigger state → the default state.
        let input = sentinel(&raw.input);
        let output = sentinel(&raw.output);
        let dormant = sentinel(&raw.dormant);
        let trigger_state = match raw.trigger_state.to_uppercase() {
            s if s.is_empty() || s == "NONE" => DEFAULT_STATE.to_string(),
            s => s,
        };
        let exit_state = raw.exit_state.to_uppercase();
        let exit_declared = !exit_state.is_empty() && exit_state != "NONE";

        if !(is_int(&input) || input == "NONE" || is_symbol(&input)) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_INPUT_REF,
                format!("input '{input}' is not an integer, variable name, NONE, or blank"),
            ));
            return None;
        }
        let Some(input_ref) = parse_input(&input) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_INPUT_REF,
                format!("input pin '{input}' is out of range"),
            ));
            return None;
        };

        let Some(trigger) = TriggerKind::from_keyword(&raw.trigger) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::UNKNOWN_TRIGGER,
                format!("'{}' is not a known trigger type", raw.trigger),
            ));
            return None;
        };

        if !is_state_label(&trigger_state) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_TRIGGER_STATE,
                "trigger state label must only use A-Z characters",
            ));
            return None;
        }

        if exit_declared && !is_state_label(&exit_state) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_EXIT_STATE,
                "exit state must be a label using only A-Z characters, NONE, or blank",
            ));
            return None;
        }

        if trigger_state == "ALWAYS" && exit_declared {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::ALWAYS_EXIT_CONFLICT,
                "trigger state ALWAYS conflicts with exit state; exit state must be NONE or blank",
            ));
            return None;
        }

        if !(is_int(&output) || is_symbol(&output)) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_OUTPUT_REF,
                format!("output '{output}' is not an integer or variable name"),
            ));
            return None;
        }

        let output_is_symbol = !is_int(&output);
        let output_ref = if output_is_symbol {
            OutputRef::Variable(output.clone())
        } else {
            let Ok(pin) = output.parse::<u32>() else {
                diags.push_error(Diagnostic::error(
                    row,
                    DiagCode::BAD_OUTPUT_REF,
                    format!("output pin '{output}' is out of range"),
                ));
                return None;
            };
            OutputRef::Pin(pin)
        };
        if output_is_symbol && raw.output_kind != "VARIABLE" {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::VARIABLE_KIND_MISMATCH,
                "output is non-numeric, but output type is not set to VARIABLE",
            ));
            return None;
        }
        if !output_is_symbol && raw.output_kind == "VARIABLE" {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::VARIABLE_KIND_MISMATCH,
                "output type is set to VARIABLE, but output is not a variable name",
            ));
            return None;
        }

        let Some(kind) = OutputKind::from_keyword(&raw.output_kind) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::UNKNOWN_OUTPUT_KIND,
                format!("'{}' is not a supported output type", raw.output_kind),
            ));
            return None;
        };

        if !is_int(&raw.offset) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_OFFSET,
                "offset value is not an integer",
            ));
            return None;
        }
        let Ok(offset_ms) = raw.offset.parse::<u32>() else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_OFFSET,
                "offset value is out of range",
            ));
            return None;
        };
        if !is_int(&raw.duration) {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_DURATION,
                "duration value is not an integer",
            ));
            return None;
        }
        let Ok(duration_ms) = raw.duration.parse::<u32>() else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_DURATION,
                "duration value is out of range",
            ));
            return None;
        };

        let Some(waveform) = self.registry.resolve(&raw.waveform) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::UNKNOWN_WAVEFORM,
                format!("'{}' is not a supported signal type", raw.waveform),
            ));
            return None;
        };

        let frequency = positive_decimal(&raw.frequency);
        let Some(frequency) = frequency else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::BAD_FREQUENCY,
                "frequency is not a positive decimal",
            ));
            return None;
        };

        let Some(pin_class) = infer_pin_class(&raw.min, &raw.max, &dormant) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::UNKNOWN_PIN_CLASS,
                "min/max/dormant values fit neither DIGITAL (HIGH/LOW) nor ANALOG (non-negative integers)",
            ));
            return None;
        };

        if dormant != "NONE" {
            let agrees = match pin_class {
                PinClass::Digital => level_of(&dormant).is_some(),
                PinClass::Analog => is_int(&dormant),
            };
            if !agrees {
                diags.push_error(Diagnostic::error(
                    row,
                    DiagCode::DORMANT_CLASS_MISMATCH,
                    "dormant value does not match the type of the min and max values",
                ));
                return None;
            }
        }

        // inference only checks the digit grammar; magnitude is checked here
        let min = parse_value(&raw.min, pin_class);
        let max = parse_value(&raw.max, pin_class);
        let (Some(min), Some(max)) = (min, max) else {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::VALUE_OUT_OF_RANGE,
                format!("min/max value is too large ({}..{})", raw.min, raw.max),
            ));
            return None;
        };
        let ordered = match (min, max) {
            (OutputValue::Analog(lo), OutputValue::Analog(hi)) => lo <= hi,
            (OutputValue::Level(lo), OutputValue::Level(hi)) => {
                !(lo == Level::High && hi == Level::Low)
            }
            _ => true,
        };
        if !ordered {
            diags.push_error(Diagnostic::error(
                row,
                DiagCode::MIN_ABOVE_MAX,
                format!("min value ({}) is larger than max value ({})", raw.min, raw.max),
            ));
            return None;
        }

        if let Some(required) = kind.required_class() {
            if required != pin_class {
                diags.push_error(Diagnostic::error(
                    row,
                    DiagCode::KIND_CLASS_MISMATCH,
                    format!("output type {kind} does not match the {pin_class} pin values given"),
                ));
                return None;
            }
        }

        let dormant_value = if dormant == "NONE" {
            None
        } else {
            let Some(value) = parse_value(&dormant, pin_class) else {
                diags.push_error(Diagnostic::error(
                    row,
                    DiagCode::VALUE_OUT_OF_RANGE,
                    format!("dormant value is too large ({dormant})"),
                ));
                return None;
            };
            Some(value)
        };

        let severity = if !raw.param1.is_empty() && is_int(&raw.param1) {
            raw.param1.parse::<f32>().unwrap_or(100.0) / 100.0
        } else {
            1.0
        };

        let id = self.next_id;
        self.next_id += 1;

        Some(ValidatedRow {
            row,
            cue: raw.cue.clone(),
            input: input_ref,
            trigger,
            trigger_state: if trigger_state == "ALWAYS" {
                TriggerState::Always
            } else {
                TriggerState::State(trigger_state)
            },
            // an ALWAYS exit label degrades to no exit, as NONE does
            exit_state: (exit_declared && exit_state != "ALWAYS").then_some(exit_state),
            effect: Effect {
                id,
                cue: raw.cue.clone(),
                description: raw.description.clone(),
                output: output_ref,
                kind,
                pin_class,
                offset_ms,
                duration_ms,
                waveform: waveform.canonical.to_string(),
                frequency,
                min,
                max,
                dormant: dormant_value,
                severity,
                servo_id: None,
            },
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Field grammars
// ══════════════════════════════════════════════════════════════════════════

fn sentinel(s: &str) -> String {
    if s.trim().is_empty() {
        "NONE".to_string()
    } else {
        s.to_string()
    }
}

fn is_int(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_symbol(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b == b'_')
}

fn is_state_label(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

/// `[0-9]*.?[0-9]+`, value strictly positive. No sign, no exponent.
fn positive_decimal(s: &str) -> Option<f32> {
    let mut parts = s.split('.');
    let whole = parts.next()?;
    let frac = parts.next();
    if parts.next().is_some() {
        return None;
    }
    let frac_ok = match frac {
        Some(f) => is_int(f),
        None => true,
    };
    if !frac_ok || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_none() {
        return None;
    }
    let value: f32 = s.parse().ok()?;
    (value > 0.0).then_some(value)
}

fn level_of(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "HIGH" => Some(Level::High),
        "LOW" => Some(Level::Low),
        _ => None,
    }
}

/// DIGITAL iff min, max, and a declared dormant are all HIGH/LOW; ANALOG iff
/// all are non-negative integers; otherwise unknown (fatal). Deterministic
/// and order-independent in its three inputs.
fn infer_pin_class(min: &str, max: &str, dormant: &str) -> Option<PinClass> {
    let mut values = vec![min, max];
    if dormant != "NONE" {
        values.push(dormant);
    }
    if values.iter().all(|v| level_of(v).is_some()) {
        Some(PinClass::Digital)
    } else if values.iter().all(|v| is_int(v)) {
        Some(PinClass::Analog)
    } else {
        None
    }
}

fn parse_value(s: &str, class: PinClass) -> Option<OutputValue> {
    match class {
        PinClass::Digital => level_of(s).map(OutputValue::Level),
        PinClass::Analog => s.parse::<i64>().ok().map(OutputValue::Analog),
    }
}

/// `None` only for a digits-only literal too large for a pin number.
fn parse_input(s: &str) -> Option<InputRef> {
    if s == "NONE" {
        Some(InputRef::None)
    } else if is_int(s) {
        s.parse().ok().map(InputRef::Pin)
    } else {
        Some(InputRef::Variable(s.to_string()))
    }
}
