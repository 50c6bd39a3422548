//! Per-effect coroutine emission.
//!
//! Each effect compiles to one `coroutineNxx` routine with three phases:
//! an optional offset wait, the active waveform loop, and an exit tail that
//! decrements the cue counter, advances the state machine once the whole
//! cue has drained, and applies the dormant value.

use std::fmt::Write as _;

use cuesmith_signals::{Registry, RANDOM};
use cuesmith_types::{
    Cue, Effect, OutputKind, OutputValue, PinClass, ShowModel, TriggerKind, TriggerState,
};

use crate::error::{CodegenError, CodegenResult};

/// Emit one routine into `out`.
pub fn emit_routine(
    out: &mut String,
    model: &ShowModel,
    cue: &Cue,
    effect: &Effect,
    registry: &Registry,
) -> CodegenResult<()> {
    let multi = model.states.is_multi();

    writeln!(out)?;
    writeln!(out, "// Cue:    {}", cue.name)?;
    writeln!(out, "// Effect: {}", effect.description)?;
    writeln!(out, "void coroutineN{:02}(COROUTINE_CONTEXT(coroutine))", effect.id)?;
    writeln!(out, "{{")?;
    writeln!(out, "    COROUTINE_LOCAL(int, val);")?;
    writeln!(out, "    COROUTINE_LOCAL(unsigned long, currTime);")?;
    writeln!(out, "    COROUTINE_LOCAL(unsigned long, endTime);")?;
    writeln!(out)?;
    writeln!(out, "    BEGIN_COROUTINE;")?;

    // WAIT_OFFSET: fires once elapsed time since the cue trigger reaches
    // the offset; elided entirely for offset 0.
    if effect.offset_ms > 0 {
        writeln!(out)?;
        writeln!(out, "    endTime = startTimes[{}]+{}u;", cue.id, effect.offset_ms)?;
        writeln!(out, "    if( (long)(endTime-millis()) > 0 )")?;
        writeln!(out, "    {{")?;
        writeln!(out, "        coroutine.wait({});", effect.offset_ms)?;
        writeln!(out, "        COROUTINE_YIELD;")?;
        writeln!(out, "    }}")?;
    }

    // ACTIVE: one output write per tick while time remains and the global
    // state (when there is one) still matches.
    writeln!(out)?;
    writeln!(out, "    endTime = millis()+{}u;", effect.duration_ms)?;
    let state_gate = match &cue.trigger_state {
        TriggerState::State(name) if multi => format!("curr_state == STATE_{name} && "),
        _ => String::new(),
    };
    writeln!(out, "    while( {state_gate}(long)(endTime-millis()) > 0 )")?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        currTime = millis()-startTimes[{}]-{}u;",
        cue.id, effect.offset_ms
    )?;

    let entry = registry.require(&effect.waveform)?;
    if entry.canonical == RANDOM {
        writeln!(
            out,
            "        val = randomSignal(&rc_cr{:02}_out{:02}, {}, {}, {:.6}f, currTime, {:.6}f );",
            cue.id, effect.id, effect.min, effect.max, effect.frequency, effect.severity
        )?;
    } else {
        let period = 1000.0f64 / f64::from(effect.frequency);
        // frequencies above 1 kHz would truncate to a zero modulus
        let period_int = (period as u64).max(1);
        writeln!(
            out,
            "        val = scale({}, {}, {}( (float)(currTime % {}u / {:.6}f) ));",
            effect.min, effect.max, entry.func_name, period_int, period
        )?;
    }

    writeln!(out, "        {}", write_stmt(effect, "val")?)?;
    writeln!(out, "        coroutine.wait(1);")?;
    writeln!(out, "        COROUTINE_YIELD;")?;
    writeln!(out, "    }}")?;

    emit_exit_tail(out, cue, effect, multi)?;

    writeln!(out)?;
    writeln!(out, "    END_COROUTINE;")?;
    writeln!(out, "}}")?;
    Ok(())
}

/// EXIT phase. An effect with neither input nor state gating never reaches
/// it: the routine restarts forever and a dormant value is never applied.
fn emit_exit_tail(out: &mut String, cue: &Cue, effect: &Effect, multi: bool) -> CodegenResult<()> {
    let gated_by_state = multi && !matches!(cue.trigger_state, TriggerState::Always);

    if !cue.has_input() && !gated_by_state {
        writeln!(out)?;
        writeln!(out, "    coroutine.loop();")?;
        return Ok(());
    }

    let advance = state_advance(cue, multi);
    let dormant = match effect.dormant {
        Some(value) => Some(write_stmt(effect, &value.to_string())?),
        None => None,
    };

    // A state-gated cue with no input and a declared exit state cannot see
    // its trigger go false; it exits unconditionally once time runs out.
    if !cue.has_input() && multi && cue.exit_state.is_some() {
        writeln!(out)?;
        writeln!(out, "    isActive[{}]--;", cue.id)?;
        if let Some((from, to)) = advance {
            emit_advance(out, cue, 4, &from, &to)?;
        }
        if let Some(stmt) = dormant {
            writeln!(out, "    {stmt}")?;
        }
        return Ok(());
    }

    let mut conditions: Vec<String> = Vec::new();
    if let TriggerState::State(name) = &cue.trigger_state {
        if multi {
            conditions.push(format!("curr_state == STATE_{name}"));
        }
    }
    if cue.has_input() {
        let input = input_expr(cue).ok_or_else(|| {
            CodegenError::Internal(format!("cue '{}' lost its input reference", cue.name))
        })?;
        conditions.push(trigger_expr(cue.trigger, &input, cue.id));
    }

    if conditions.is_empty() {
        // ALWAYS-triggered, no input: nothing can cancel it
        writeln!(out)?;
        writeln!(out, "    coroutine.loop();")?;
        return Ok(());
    }

    let condition = join_conditions(&conditions);
    writeln!(out)?;
    writeln!(out, "    if( {condition} )")?;
    writeln!(out, "    {{")?;
    writeln!(out, "        coroutine.loop();")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    else")?;
    writeln!(out, "    {{")?;
    writeln!(out, "        isActive[{}]--;", cue.id)?;
    if let Some((from, to)) = advance {
        emit_advance(out, cue, 8, &from, &to)?;
    }
    if let Some(stmt) = dormant {
        writeln!(out, "        {stmt}")?;
    }
    writeln!(out, "    }}")?;
    Ok(())
}

/// The one-shot state transition: fires only when the cue's counter has
/// drained, a distinct exit state is declared, and the machine is still in
/// the trigger state.
fn state_advance(cue: &Cue, multi: bool) -> Option<(String, String)> {
    match (&cue.trigger_state, &cue.exit_state) {
        (TriggerState::State(from), Some(to)) if multi && from != to => {
            Some((from.clone(), to.clone()))
        }
        _ => None,
    }
}

fn emit_advance(out: &mut String, cue: &Cue, indent: usize, from: &str, to: &str) -> CodegenResult<()> {
    let pad = " ".repeat(indent);
    writeln!(out, "{pad}if( isActive[{}] <= 0 && curr_state == STATE_{from} )", cue.id)?;
    writeln!(out, "{pad}{{")?;
    writeln!(out, "{pad}    curr_state = STATE_{to};")?;
    writeln!(out, "{pad}}}")?;
    Ok(())
}

/// One output write, exhaustive over the validated (kind, class) pairs.
pub(crate) fn write_stmt(effect: &Effect, value: &str) -> CodegenResult<String> {
    Ok(match (effect.kind, effect.pin_class) {
        (OutputKind::Servo, _) => {
            let servo = effect.servo_id.ok_or_else(|| {
                CodegenError::Internal(format!("effect {} has no servo id", effect.id))
            })?;
            format!("servos[{servo}].writeMicroseconds({value});")
        }
        (OutputKind::Variable, PinClass::Digital) => format!("{} = {value};", effect.output),
        (OutputKind::Variable, PinClass::Analog) => {
            format!("{} = {value} > 0 ? HIGH : LOW;", effect.output)
        }
        (OutputKind::Digital, _) => format!("digitalWrite({}, {value});", effect.output),
        (OutputKind::Pwm, _) => format!("analogWrite({}, {value});", effect.output),
    })
}

/// The C expression that reads a cue's input.
pub(crate) fn input_expr(cue: &Cue) -> Option<String> {
    match &cue.input {
        cuesmith_types::InputRef::Pin(pin) => Some(format!("digitalRead({pin})")),
        cuesmith_types::InputRef::Variable(name) => Some(name.clone()),
        cuesmith_types::InputRef::None => None,
    }
}

/// Trigger predicate over `input`. Edge kinds compare against the previous
/// tick's cached value; level kinds only test the current read.
pub(crate) fn trigger_expr(trigger: TriggerKind, input: &str, cue_id: usize) -> String {
    match trigger {
        TriggerKind::LevelLow => format!("{input} == LOW"),
        TriggerKind::LevelHigh => format!("{input} == HIGH"),
        TriggerKind::Rising => {
            format!("({input} != prevValue[{cue_id}] && {input} == HIGH)")
        }
        TriggerKind::Falling => {
            format!("({input} != prevValue[{cue_id}] && {input} == LOW)")
        }
    }
}

pub(crate) fn join_conditions(conditions: &[String]) -> String {
    conditions
        .iter()
        .map(|c| format!("({c})"))
        .collect::<Vec<_>>()
        .join(" && ")
}

/// The dormant literal actually written for an output that declares none:
/// digital pins rest LOW, analog pins rest at 0.
pub(crate) fn resting_value(class: PinClass, dormant: Option<OutputValue>) -> String {
    match dormant {
        Some(value) => value.to_string(),
        None => match class {
            PinClass::Digital => "LOW".to_string(),
            PinClass::Analog => "0".to_string(),
        },
    }
}
