//! End-to-end pipeline tests: CSV text in, sketch text (or diagnostics) out.

use cuesmith_compiler::{compile, CompileError};
use cuesmith_types::DiagCode;

const HEADER: &str = "Cue,Effect,Input,Trigger,Output,Output Type,Offset (ms),Duration (ms),Signal,Frequency,Min,Max,Dormant,Param1\n";
const HEADER_LONG: &str = "Cue,Effect,Input,Trigger,Trigger State,Exit State,Output,Output Type,Offset (ms),Duration (ms),Signal,Frequency,Min,Max,Dormant,Param1\n";

fn compile_ok(source: &str) -> cuesmith_compiler::CompileOutput {
    match compile(source, "table.csv") {
        Ok(output) => output,
        Err(CompileError::Invalid(diags)) => {
            panic!(
                "expected success, got errors:\n{}",
                diags
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        }
        Err(err) => panic!("expected success, got {err}"),
    }
}

fn compile_err(source: &str) -> cuesmith_types::Diagnostics {
    match compile(source, "table.csv") {
        Err(CompileError::Invalid(diags)) => diags,
        Ok(_) => panic!("expected validation errors, got a sketch"),
        Err(err) => panic!("expected validation errors, got {err}"),
    }
}

// A cue with no input and no states runs forever from setup.
#[test]
fn test_untriggered_steady_output() {
    let src = format!("{HEADER}Show,warm white,,on_high,13,DIGITAL,0,1000,HIGH,1,LOW,HIGH,,\n");
    let output = compile_ok(&src);
    let sketch = &output.sketch;

    assert!(sketch.contains("// Cue: Show"));
    let setup = sketch.find("void setup()").unwrap();
    let main_loop = sketch.find("void loop()").unwrap();
    let dispatch = sketch.find("coroutines.start(coroutineN00);").unwrap();
    assert!(setup < dispatch && dispatch < main_loop);

    assert!(sketch.contains("coroutine.loop();"));
    assert!(sketch.contains("digitalWrite(13, val);"));
    assert!(!sketch.contains("state_enum"));
    assert!(!sketch.contains("int inputTemp;"));
    // No empty dispatch condition can appear.
    assert!(!sketch.contains("if(  )"));
    assert!(output.diagnostics.warnings.is_empty());
}

// Two effects in one cue: counter starts at 2 and gates the state advance.
#[test]
fn test_two_effect_cue_advances_state_once_drained() {
    let src = format!(
        "{HEADER_LONG}\
         Act,flicker,2,on_low,A,B,9,PWM,0,3000,RANDOM,8,0,255,0,50\n\
         Act,fade,2,on_low,A,B,10,PWM,500,2500,EASEOUT,1,0,255,0,\n"
    );
    let output = compile_ok(&src);
    let sketch = &output.sketch;

    assert!(sketch.contains("Coroutines<2> coroutines;"));
    assert!(sketch.contains("isActive[0] = 2;"));
    assert!(sketch.contains("state_enum curr_state = STATE_A;"));
    // Both routines decrement the shared counter; the advance is gated on it.
    assert_eq!(sketch.matches("isActive[0]--;").count(), 2);
    assert_eq!(
        sketch
            .matches("if( isActive[0] <= 0 && curr_state == STATE_A )")
            .count(),
        2
    );
    assert!(sketch.contains("curr_state = STATE_B;"));
    // param1 50 became noise severity 0.5.
    assert!(sketch.contains("0.500000f );"));
    // Offset prologue only on the second effect.
    assert!(sketch.contains("coroutine.wait(500);"));
    // Reconciled dormant 0 is applied on exit and at startup.
    assert!(sketch.contains("analogWrite(10, 0);"));
    assert!(sketch.contains("analogWrite( 9,0);"));
}

// The noise family is emitted before any other fragment, exactly once,
// however many effects request it.
#[test]
fn test_noise_fragment_leads_and_is_unique() {
    let src = format!(
        "{HEADER}\
         C1,a,2,on_high,9,PWM,0,1000,NOISE,4,0,255,,\n\
         C1,b,2,on_high,10,PWM,0,1000,TRIANGLE,1,0,255,,\n\
         C2,c,3,on_high,11,PWM,0,1000,RANDOM,2,0,255,,\n"
    );
    let output = compile_ok(&src);
    let sketch = &output.sketch;

    let noise = sketch.find("int randomSignal(").unwrap();
    let tri = sketch.find("float triangleWave(").unwrap();
    assert!(noise < tri);
    assert_eq!(sketch.matches("int randomSignal(").count(), 1);
    assert_eq!(sketch.matches("float triangleWave(").count(), 1);
    assert!(sketch.contains("randomSeed(analogRead(0));"));
    // One cache per noise effect, none for the triangle.
    assert!(sketch.contains("randCache rc_cr00_out00"));
    assert!(sketch.contains("randCache rc_cr01_out02"));
    assert!(!sketch.contains("rc_cr00_out01"));
}

// A single semantic error anywhere suppresses the sketch entirely.
#[test]
fn test_min_above_max_blocks_generation() {
    let src = format!(
        "{HEADER}\
         C1,good,2,on_high,13,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n\
         C2,bad,3,on_high,12,DIGITAL,0,1000,BOX,1,HIGH,LOW,,\n"
    );
    let diags = compile_err(&src);
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(diags.errors[0].code, DiagCode::MIN_ABOVE_MAX);
    assert_eq!(diags.errors[0].row, Some(2));
}

// A literal too large for its type is a real diagnostic on its row, not a
// silently vanished coroutine.
#[test]
fn test_oversized_max_literal_blocks_generation() {
    let src = format!(
        "{HEADER}\
         C1,good,2,on_high,13,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n\
         C2,huge,3,on_high,9,PWM,0,1000,EASEIN,1,0,99999999999999999999,,\n"
    );
    let diags = compile_err(&src);
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(diags.errors[0].code, DiagCode::VALUE_OUT_OF_RANGE);
    assert_eq!(diags.errors[0].row, Some(2));
}

// An offset past u32::MAX is rejected instead of wrapping to zero wait.
#[test]
fn test_oversized_offset_is_rejected_not_truncated() {
    let src =
        format!("{HEADER}C1,late,2,on_high,13,DIGITAL,4294967296,1000,BOX,1,LOW,HIGH,,\n");
    let diags = compile_err(&src);
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(diags.errors[0].code, DiagCode::BAD_OFFSET);
}

// Cross-cue output conflicts warn but never block, and the result is
// byte-stable across repeated compilations.
#[test]
fn test_binding_conflict_warns_and_output_is_deterministic() {
    let src = format!(
        "{HEADER}\
         C1,lamp,2,on_high,9,PWM,0,1000,TRIANGLE,1,0,255,,\n\
         C2,lamp,3,on_high,9,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n"
    );
    let first = compile_ok(&src);
    assert!(first
        .diagnostics
        .warnings
        .iter()
        .any(|w| w.code == DiagCode::BINDING_CONFLICT));

    for _ in 0..10 {
        let again = compile_ok(&src);
        assert_eq!(first.sketch, again.sketch);
        assert_eq!(first.fingerprint, again.fingerprint);
    }
}

#[test]
fn test_errors_accumulate_across_the_whole_table() {
    let src = format!(
        "{HEADER}\
         C1,bad trigger,2,on_tap,13,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n\
         C2,bad wave,3,on_high,12,DIGITAL,0,1000,WOBBLE,1,LOW,HIGH,,\n\
         C3,bad freq,4,on_high,11,DIGITAL,0,1000,BOX,0,LOW,HIGH,,\n"
    );
    let diags = compile_err(&src);
    let codes: Vec<DiagCode> = diags.errors.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            DiagCode::UNKNOWN_TRIGGER,
            DiagCode::UNKNOWN_WAVEFORM,
            DiagCode::BAD_FREQUENCY,
        ]
    );
}

// A trigger state alone still pulls the default state into the enum.
#[test]
fn test_default_state_always_present() {
    let src = format!(
        "{HEADER_LONG}Act,glow,2,on_low,B,,9,PWM,0,1000,TRIANGLE,1,0,255,,\n"
    );
    let output = compile_ok(&src);
    assert!(output
        .sketch
        .contains("typedef enum\n{\n    STATE_A,\n    STATE_B\n} state_enum;"));
    assert!(output.sketch.contains("state_enum curr_state = STATE_A;"));
    // B gates a cue but nothing enters it.
    assert!(output
        .diagnostics
        .warnings
        .iter()
        .any(|w| w.code == DiagCode::UNREACHABLE_STATE));
}

// Variables bridge cues: one writes, the other reads, no pin is touched.
#[test]
fn test_variable_bridges_two_cues() {
    let src = format!(
        "{HEADER}\
         C1,arm,2,on_high,ARMED,VARIABLE,0,10,HIGH,1,LOW,HIGH,LOW,\n\
         C2,fire,ARMED,on_high,13,DIGITAL,0,1000,BOX,2,LOW,HIGH,,\n"
    );
    let output = compile_ok(&src);
    let sketch = &output.sketch;

    assert!(sketch.contains("int ARMED = LOW;"));
    assert!(sketch.contains("ARMED = val;"));
    assert!(sketch.contains("inputTemp = ARMED;"));
    assert!(!sketch.contains("pinMode( ARMED"));
    assert!(output.diagnostics.warnings.is_empty());
}

#[test]
fn test_fingerprint_lands_in_header() {
    let src = format!("{HEADER}C1,x,2,on_high,13,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n");
    let output = compile_ok(&src);
    assert_eq!(output.fingerprint.len(), 12);
    assert!(output
        .sketch
        .contains(&format!("// source: table.csv (sha256 {})", output.fingerprint)));
}

#[test]
fn test_model_json_dump_is_valid() {
    let src = format!("{HEADER}C1,x,2,on_high,13,DIGITAL,0,1000,BOX,1,LOW,HIGH,,\n");
    let output = compile_ok(&src);
    let json = output.model_json().expect("model serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["cues"][0]["name"], "C1");
}
