//! Show model construction.
//!
//! Turns the flat list of validated rows into the grouped [`ShowModel`]:
//! cues, the state set, reconciled output bindings, the servo table, and
//! the variable/input indexes. All cross-row (referential) checks live
//! here; they only ever warn.

use cuesmith_table::ValidatedRow;
use cuesmith_types::{
    Cue, DiagCode, Diagnostic, Diagnostics, InputRef, OutputBinding, OutputKind, OutputRef,
    OutputValue, ShowModel, StateModel, TriggerState, DEFAULT_STATE,
};
use tracing::debug;

/// Build the model from validated rows, accumulating referential warnings.
pub fn build_model(rows: Vec<ValidatedRow>, diags: &mut Diagnostics) -> ShowModel {
    let bindings = reconcile_bindings(&rows, diags);
    let mut cues = group_cues(rows, diags);

    apply_binding_dormants(&mut cues, &bindings);
    let servo_pins = assign_servo_ids(&mut cues);
    let states = collect_states(&cues, diags);
    let input_pins = collect_input_pins(&cues);
    let variables = collect_variables(&cues, &bindings, diags);
    let waveforms = collect_waveforms(&cues);

    debug!(
        cues = cues.len(),
        states = states.states().len(),
        bindings = bindings.len(),
        servos = servo_pins.len(),
        "model built"
    );

    ShowModel {
        cues,
        states,
        bindings,
        input_pins,
        servo_pins,
        variables,
        waveforms,
    }
}

/// Group rows into cues by name, first-seen order. The first row of a cue
/// fixes its trigger attributes; a later row with a different input warns
/// and is otherwise folded in.
fn group_cues(rows: Vec<ValidatedRow>, diags: &mut Diagnostics) -> Vec<Cue> {
    let mut cues: Vec<Cue> = Vec::new();
    for row in rows {
        match cues.iter_mut().find(|c| c.name == row.cue) {
            Some(cue) => {
                if cue.input != row.input {
                    diags.push_warning(Diagnostic::warning(
                        row.row,
                        DiagCode::INPUT_MISMATCH,
                        format!(
                            "cue '{}' already reads a different input; keeping the first",
                            row.cue
                        ),
                    ));
                }
                cue.effects.push(row.effect);
            }
            None => {
                let id = cues.len();
                cues.push(Cue {
                    id,
                    name: row.cue,
                    input: row.input,
                    trigger: row.trigger,
                    trigger_state: row.trigger_state,
                    exit_state: row.exit_state,
                    effects: vec![row.effect],
                });
            }
        }
    }
    cues
}

/// One binding per distinct output, first row wins. Later rows that
/// disagree on kind, pin class, or description warn; a second distinct
/// dormant value poisons the binding back to no-dormant.
fn reconcile_bindings(rows: &[ValidatedRow], diags: &mut Diagnostics) -> Vec<OutputBinding> {
    let mut bindings: Vec<OutputBinding> = Vec::new();
    let mut poisoned: Vec<bool> = Vec::new();

    for row in rows {
        let effect = &row.effect;
        let index = bindings.iter().position(|b| b.output == effect.output);
        let Some(index) = index else {
            bindings.push(OutputBinding {
                output: effect.output.clone(),
                description: effect.description.clone(),
                kind: effect.kind,
                pin_class: effect.pin_class,
                dormant: effect.dormant,
            });
            poisoned.push(false);
            continue;
        };

        let binding = &mut bindings[index];
        if binding.kind != effect.kind {
            diags.push_warning(Diagnostic::warning(
                row.row,
                DiagCode::BINDING_CONFLICT,
                format!(
                    "output {} was first declared {}; keeping {0}",
                    binding.output, binding.kind
                ),
            ));
        }
        if binding.pin_class != effect.pin_class {
            diags.push_warning(Diagnostic::warning(
                row.row,
                DiagCode::BINDING_CONFLICT,
                format!(
                    "output {} was first declared with pin class {}; keeping it",
                    binding.output, binding.pin_class
                ),
            ));
        }
        if binding.description != effect.description {
            diags.push_warning(Diagnostic::warning(
                row.row,
                DiagCode::BINDING_CONFLICT,
                format!(
                    "output {} description differs from its first declaration",
                    binding.output
                ),
            ));
        }
        match (binding.dormant, effect.dormant) {
            (None, Some(value)) if !poisoned[index] => binding.dormant = Some(value),
            (Some(first), Some(second)) if first != second => {
                diags.push_warning(Diagnostic::warning(
                    row.row,
                    DiagCode::DORMANT_CONFLICT,
                    format!(
                        "output {} declares dormant {second} but was already dormant {first}; \
                         dropping the dormant value entirely",
                        binding.output
                    ),
                ));
                binding.dormant = None;
                poisoned[index] = true;
            }
            _ => {}
        }
    }
    bindings
}

/// An output whose binding ended up with no dormant (contradictory values
/// dropped it) keeps none anywhere: clear it from every effect. Effects of
/// outputs that still carry one keep their own row's declaration — a row
/// that said NONE does not inherit a neighbor's value.
fn apply_binding_dormants(cues: &mut [Cue], bindings: &[OutputBinding]) {
    for cue in cues {
        for effect in &mut cue.effects {
            let dropped = bindings
                .iter()
                .any(|b| b.output == effect.output && b.dormant.is_none());
            if dropped {
                effect.dormant = None;
            }
        }
    }
}

/// Servo ids follow first appearance in effect order.
fn assign_servo_ids(cues: &mut [Cue]) -> Vec<u32> {
    let mut servo_pins: Vec<u32> = Vec::new();
    for cue in cues {
        for effect in &mut cue.effects {
            if effect.kind != OutputKind::Servo {
                continue;
            }
            if let OutputRef::Pin(pin) = effect.output {
                let id = match servo_pins.iter().position(|&p| p == pin) {
                    Some(id) => id,
                    None => {
                        servo_pins.push(pin);
                        servo_pins.len() - 1
                    }
                };
                effect.servo_id = Some(id);
            }
        }
    }
    servo_pins
}

/// Collect the state set (default state first, then first use order) and
/// warn about trigger states no cue ever exits into.
fn collect_states(cues: &[Cue], diags: &mut Diagnostics) -> StateModel {
    let mut states = StateModel::new();
    for cue in cues {
        if let TriggerState::State(name) = &cue.trigger_state {
            states.insert(name);
        }
        if let Some(exit) = &cue.exit_state {
            states.insert(exit);
        }
    }

    if states.is_multi() {
        for state in states.states() {
            if state == DEFAULT_STATE {
                continue;
            }
            let entered = cues.iter().any(|c| c.exit_state.as_deref() == Some(state));
            let triggers = cues
                .iter()
                .any(|c| matches!(&c.trigger_state, TriggerState::State(s) if s == state));
            if triggers && !entered {
                diags.push_warning(Diagnostic::pass_warning(
                    DiagCode::UNREACHABLE_STATE,
                    format!("state {state} gates cues but no cue ever enters it"),
                ));
            }
        }
    }
    states
}

fn collect_input_pins(cues: &[Cue]) -> Vec<(u32, Vec<String>)> {
    let mut pins: Vec<(u32, Vec<String>)> = Vec::new();
    for cue in cues {
        if let InputRef::Pin(pin) = cue.input {
            match pins.iter_mut().find(|(p, _)| *p == pin) {
                Some((_, names)) => {
                    if !names.contains(&cue.name) {
                        names.push(cue.name.clone());
                    }
                }
                None => pins.push((pin, vec![cue.name.clone()])),
            }
        }
    }
    pins
}

/// Variables written by effects, plus any variable only ever read. Both
/// one-sided uses warn; read-only variables are still declared so the
/// generated sketch compiles.
fn collect_variables(
    cues: &[Cue],
    bindings: &[OutputBinding],
    diags: &mut Diagnostics,
) -> Vec<(String, Option<OutputValue>)> {
    let mut variables: Vec<(String, Option<OutputValue>)> = Vec::new();
    for binding in bindings {
        if let OutputRef::Variable(name) = &binding.output {
            variables.push((name.clone(), binding.dormant));
        }
    }

    let read = |name: &str| {
        cues.iter()
            .any(|c| matches!(&c.input, InputRef::Variable(v) if v == name))
    };

    for (name, _) in &variables {
        if !read(name) {
            diags.push_warning(Diagnostic::pass_warning(
                DiagCode::UNUSED_VARIABLE,
                format!("variable {name} is written but never read"),
            ));
        }
    }

    let mut read_only: Vec<String> = Vec::new();
    for cue in cues {
        if let InputRef::Variable(name) = &cue.input {
            if !variables.iter().any(|(v, _)| v == name) && !read_only.contains(name) {
                diags.push_warning(Diagnostic::pass_warning(
                    DiagCode::UNUSED_VARIABLE,
                    format!("variable {name} is read but never written"),
                ));
                read_only.push(name.clone());
            }
        }
    }
    for name in read_only {
        variables.push((name, None));
    }
    variables
}

fn collect_waveforms(cues: &[Cue]) -> Vec<String> {
    let mut waveforms: Vec<String> = Vec::new();
    for cue in cues {
        for effect in &cue.effects {
            if !waveforms.contains(&effect.waveform) {
                waveforms.push(effect.waveform.clone());
            }
        }
    }
    waveforms
}
