//! Whole-sketch assembly.
//!
//! Orchestrates the emission pipeline: helper fragments, globals, the state
//! enum, the servo table, per-effect routines, then `setup` and `loop`.
//! Section order matters — generated C has no forward declarations.

use std::fmt::Write as _;

use cuesmith_signals::{Registry, RANDOM};
use cuesmith_types::{Cue, OutputKind, OutputRef, ShowModel, TriggerState};
use tracing::debug;

use crate::error::{CodegenError, CodegenResult};
use crate::routine::{
    emit_routine, input_expr, join_conditions, resting_value, trigger_expr,
};

/// Default servo pulse bounds in microseconds (0° and 180°).
const SERVO_DEFAULT_MIN: u32 = 544;
const SERVO_DEFAULT_MAX: u32 = 2400;

/// Compile a validated [`ShowModel`] into complete sketch source.
///
/// `source_name` and `fingerprint` only feed the generated header comment;
/// identical models with identical headers produce byte-identical output.
pub fn generate_sketch(
    model: &ShowModel,
    registry: &Registry,
    source_name: &str,
    fingerprint: &str,
) -> CodegenResult<String> {
    let mut gen = SketchBuilder {
        model,
        registry,
        out: String::new(),
    };
    gen.generate(source_name, fingerprint)?;
    Ok(gen.out)
}

struct SketchBuilder<'a> {
    model: &'a ShowModel,
    registry: &'a Registry,
    out: String,
}

impl SketchBuilder<'_> {
    fn generate(&mut self, source_name: &str, fingerprint: &str) -> CodegenResult<()> {
        debug!(
            cues = self.model.cues.len(),
            effects = self.model.effect_count(),
            states = self.model.states.states().len(),
            "generating sketch"
        );

        self.emit_header(source_name, fingerprint)?;
        self.emit_fragments()?;
        self.emit_scale()?;
        self.emit_globals()?;
        self.emit_state_enum()?;
        self.emit_variables()?;
        self.emit_servo_table()?;
        self.emit_rand_caches()?;
        self.emit_routines()?;
        self.emit_setup()?;
        self.emit_loop()?;
        Ok(())
    }

    fn emit_header(&mut self, source_name: &str, fingerprint: &str) -> CodegenResult<()> {
        writeln!(self.out, "// Sketch generated by cuesmith; do not edit.")?;
        writeln!(self.out, "// source: {source_name} (sha256 {fingerprint})")?;
        writeln!(self.out)?;
        writeln!(self.out, "#include \"Coroutines.h\"")?;
        if !self.model.servo_pins.is_empty() {
            writeln!(self.out, "#include <Servo.h>")?;
        }
        Ok(())
    }

    /// Dependency-closed helper fragments, noise family first.
    fn emit_fragments(&mut self) -> CodegenResult<()> {
        let requested: Vec<&str> = self.model.waveforms.iter().map(String::as_str).collect();
        for entry in self.registry.close(&requested) {
            writeln!(self.out, "{}", entry.fragment)?;
        }
        Ok(())
    }

    fn emit_scale(&mut self) -> CodegenResult<()> {
        writeln!(self.out)?;
        writeln!(self.out, "int scale( int minVal, int maxVal, float x )")?;
        writeln!(self.out, "{{")?;
        writeln!(self.out, "    return (int)(minVal + x * (maxVal-minVal));")?;
        writeln!(self.out, "}}")?;
        Ok(())
    }

    /// Coroutine pool and the per-cue dispatch bookkeeping arrays.
    fn emit_globals(&mut self) -> CodegenResult<()> {
        let cues = self.model.cues.len();
        writeln!(self.out)?;
        writeln!(self.out, "Coroutines<{}> coroutines;", self.model.effect_count())?;
        writeln!(self.out)?;
        writeln!(self.out, "int prevValue[{cues}] = {{{}}};", repeat_list("LOW", cues))?;
        writeln!(self.out, "int isActive[{cues}] = {{{}}};", repeat_list("0", cues))?;
        writeln!(
            self.out,
            "unsigned long startTimes[{cues}] = {{{}}};",
            repeat_list("0u", cues)
        )?;
        Ok(())
    }

    fn emit_state_enum(&mut self) -> CodegenResult<()> {
        if !self.model.states.is_multi() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "typedef enum")?;
        writeln!(self.out, "{{")?;
        let names: Vec<String> = self
            .model
            .states
            .states()
            .iter()
            .map(|s| format!("    STATE_{s}"))
            .collect();
        writeln!(self.out, "{}", names.join(",\n"))?;
        writeln!(self.out, "}} state_enum;")?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "state_enum curr_state = STATE_{};",
            cuesmith_types::DEFAULT_STATE
        )?;
        Ok(())
    }

    /// Variable outputs get an initial level instead of a pin-mode call.
    fn emit_variables(&mut self) -> CodegenResult<()> {
        if self.model.variables.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        for (name, dormant) in &self.model.variables {
            let level = dormant
                .as_ref()
                .map(|v| v.as_level())
                .unwrap_or(cuesmith_types::Level::Low);
            writeln!(self.out, "int {name} = {level};")?;
        }
        Ok(())
    }

    fn emit_servo_table(&mut self) -> CodegenResult<()> {
        if self.model.servo_pins.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "Servo servos[{}];", self.model.servo_pins.len())?;
        writeln!(self.out)?;
        for id in 0..self.model.servo_pins.len() {
            writeln!(self.out, "#define SERVO_{id:02}_MIN {SERVO_DEFAULT_MIN}")?;
            writeln!(self.out, "#define SERVO_{id:02}_MAX {SERVO_DEFAULT_MAX}")?;
        }
        Ok(())
    }

    /// One `randCache` per noise effect, keyed by (cue, effect) ids.
    fn emit_rand_caches(&mut self) -> CodegenResult<()> {
        let mut caches = Vec::new();
        for cue in &self.model.cues {
            for effect in &cue.effects {
                if effect.waveform == RANDOM {
                    caches.push((cue.id, effect.id));
                }
            }
        }
        if caches.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "// noise caches")?;
        for (cue_id, effect_id) in caches {
            writeln!(
                self.out,
                "randCache rc_cr{cue_id:02}_out{effect_id:02} = {{ true, 0, 0u }};"
            )?;
        }
        Ok(())
    }

    fn emit_routines(&mut self) -> CodegenResult<()> {
        for cue in &self.model.cues {
            for effect in &cue.effects {
                emit_routine(&mut self.out, self.model, cue, effect, self.registry)?;
            }
        }
        Ok(())
    }

    /// A cue with no input and no state machine dispatches exactly once,
    /// here in setup. Everything else dispatches from loop.
    fn is_unconditional(&self, cue: &Cue) -> bool {
        !cue.has_input() && !self.model.states.is_multi()
    }

    fn emit_setup(&mut self) -> CodegenResult<()> {
        writeln!(self.out)?;
        writeln!(self.out, "void setup() {{")?;

        if self.model.uses_waveform(RANDOM) {
            writeln!(self.out, "    randomSeed(analogRead(0));")?;
            writeln!(self.out)?;
        }

        for (pin, cue_names) in &self.model.input_pins {
            writeln!(
                self.out,
                "    pinMode( {pin:2}, INPUT_PULLUP ); // {}",
                cue_names.join(", ")
            )?;
        }

        for binding in &self.model.bindings {
            if let (OutputRef::Pin(pin), OutputKind::Digital | OutputKind::Pwm) =
                (&binding.output, binding.kind)
            {
                writeln!(self.out, "    pinMode( {pin:2}, OUTPUT ); // {}", binding.description)?;
            }
        }

        for binding in &self.model.bindings {
            if let (OutputRef::Pin(pin), OutputKind::Servo) = (&binding.output, binding.kind) {
                let id = self.model.servo_id(*pin).ok_or_else(|| {
                    CodegenError::Internal(format!("servo pin {pin} missing from servo table"))
                })?;
                writeln!(
                    self.out,
                    "    servos[{id}].attach( {pin:2}, SERVO_{id:02}_MIN, SERVO_{id:02}_MAX );"
                )?;
            }
        }

        writeln!(self.out)?;
        writeln!(self.out, "    // initial values")?;
        for binding in &self.model.bindings {
            let value = resting_value(binding.pin_class, binding.dormant);
            match (&binding.output, binding.kind) {
                (OutputRef::Pin(pin), OutputKind::Servo) => {
                    let id = self.model.servo_id(*pin).ok_or_else(|| {
                        CodegenError::Internal(format!("servo pin {pin} missing from servo table"))
                    })?;
                    writeln!(self.out, "    servos[{id}].writeMicroseconds({value});")?;
                }
                (OutputRef::Pin(pin), OutputKind::Digital) => {
                    writeln!(self.out, "    digitalWrite({pin:2},{value});")?;
                }
                (OutputRef::Pin(pin), OutputKind::Pwm) => {
                    writeln!(self.out, "    analogWrite({pin:2},{value});")?;
                }
                // variables are initialized at declaration
                _ => {}
            }
        }

        let unconditional: Vec<usize> = self
            .model
            .cues
            .iter()
            .enumerate()
            .filter(|(_, c)| self.is_unconditional(c))
            .map(|(i, _)| i)
            .collect();
        for index in unconditional {
            writeln!(self.out)?;
            let cue = self.model.cues[index].clone();
            self.emit_dispatch_body(&cue, 4)?;
        }

        writeln!(self.out, "}}")?;
        Ok(())
    }

    fn emit_loop(&mut self) -> CodegenResult<()> {
        writeln!(self.out)?;
        writeln!(self.out, "void loop() {{")?;
        writeln!(self.out, "    coroutines.update();")?;

        if self.model.cues.iter().any(Cue::has_input) {
            writeln!(self.out, "    int inputTemp;")?;
        }

        for index in 0..self.model.cues.len() {
            let cue = self.model.cues[index].clone();
            if self.is_unconditional(&cue) {
                continue;
            }

            let mut conditions: Vec<String> = Vec::new();
            if self.model.states.is_multi() {
                if let TriggerState::State(name) = &cue.trigger_state {
                    conditions.push(format!("curr_state == STATE_{name}"));
                }
            }
            if cue.has_input() {
                let read = input_expr(&cue).ok_or_else(|| {
                    CodegenError::Internal(format!("cue '{}' lost its input reference", cue.name))
                })?;
                writeln!(self.out, "    inputTemp = {read};")?;
                conditions.push(trigger_expr(cue.trigger, "inputTemp", cue.id));
            }
            conditions.push(format!("isActive[{}] <= 0", cue.id));

            writeln!(self.out, "    if( {} )", join_conditions(&conditions))?;
            writeln!(self.out, "    {{")?;
            self.emit_dispatch_body(&cue, 8)?;
            writeln!(self.out, "    }}")?;
            if cue.has_input() {
                writeln!(self.out, "    prevValue[{}] = inputTemp;", cue.id)?;
            }
        }

        writeln!(self.out, "}}")?;
        Ok(())
    }

    /// Arm a cue: reset its counter and trigger timestamp, start every
    /// effect routine, reset its noise caches.
    fn emit_dispatch_body(&mut self, cue: &Cue, indent: usize) -> CodegenResult<()> {
        let pad = " ".repeat(indent);
        writeln!(self.out, "{pad}// Cue: {}", cue.name)?;
        writeln!(self.out, "{pad}isActive[{}] = {};", cue.id, cue.effects.len())?;
        writeln!(self.out, "{pad}startTimes[{}] = millis();", cue.id)?;
        for effect in &cue.effects {
            writeln!(self.out, "{pad}coroutines.start(coroutineN{:02});", effect.id)?;
        }
        for effect in &cue.effects {
            if effect.waveform == RANDOM {
                writeln!(self.out, "{pad}rc_cr{:02}_out{:02}.isLevel = true;", cue.id, effect.id)?;
                writeln!(self.out, "{pad}rc_cr{:02}_out{:02}.cacheTime = 0;", cue.id, effect.id)?;
            }
        }
        Ok(())
    }
}

fn repeat_list(item: &str, count: usize) -> String {
    vec![item; count].join(",")
}
