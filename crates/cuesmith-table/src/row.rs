//! Raw record reading.
//!
//! A table is a header line (discarded) followed by one record per line.
//! Short-form records omit the trigger/exit state columns; the trailing
//! param1 column is optional in both forms:
//!
//! ```text
//! cue,description,input,trigger,[trigger-state,exit-state,]output,kind,
//! offset,duration,waveform,frequency,min,max,dormant[,param1]
//! ```

use cuesmith_types::{DiagCode, Diagnostic, Diagnostics};

/// One record, fields named but still raw text. `row` is the 1-based line
/// number below the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row: u32,
    pub cue: String,
    pub description: String,
    pub input: String,
    pub trigger: String,
    pub trigger_state: String,
    pub exit_state: String,
    pub output: String,
    pub output_kind: String,
    pub offset: String,
    pub duration: String,
    pub waveform: String,
    pub frequency: String,
    pub min: String,
    pub max: String,
    pub dormant: String,
    pub param1: String,
}

/// Split a table into raw records, discarding the header line.
///
/// Wrong column counts are structural errors; fully blank lines are skipped
/// (trailing newlines are routine in exported CSV) but still consume a row
/// number, so diagnostics line up with the table a user is looking at: row
/// N is the Nth line below the header, blank or not.
pub fn read_records(source: &str, diags: &mut Diagnostics) -> Vec<RawRow> {
    let mut records = Vec::new();

    for (index, line) in source.lines().enumerate().skip(1) {
        let row = index as u32;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        match parse_fields(row, &fields) {
            Some(record) => records.push(record),
            None => diags.push_error(Diagnostic::error(
                row,
                DiagCode::WRONG_COLUMN_COUNT,
                format!(
                    "expected 13-16 columns (state columns and param1 optional), found {}",
                    fields.len()
                ),
            )),
        }
    }
    records
}

fn parse_fields(row: u32, fields: &[&str]) -> Option<RawRow> {
    let long_form = match fields.len() {
        13 | 14 => false,
        15 | 16 => true,
        _ => return None,
    };
    let mut it = fields.iter().map(|f| f.trim().to_string());

    let cue = it.next()?;
    let description = it.next()?;
    let input = it.next()?;
    let trigger = it.next()?;
    let (trigger_state, exit_state) = if long_form {
        (it.next()?, it.next()?)
    } else {
        (String::new(), String::new())
    };
    Some(RawRow {
        row,
        cue,
        description,
        input,
        trigger,
        trigger_state,
        exit_state,
        output: it.next()?,
        output_kind: it.next()?,
        offset: it.next()?,
        duration: it.next()?,
        waveform: it.next()?,
        frequency: it.next()?,
        min: it.next()?,
        max: it.next()?,
        dormant: it.next()?,
        param1: it.next().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Cue,Effect,Input,Trigger,Output,Output Type,Offset (ms),Duration (ms),Signal,Frequency,Min,Max,Dormant,Param1\n";

    #[test]
    fn test_short_form_record() {
        let mut diags = Diagnostics::new();
        let src = format!("{HEADER}C1,blink,2,on_high,13,DIGITAL,0,1000,BOX,2,LOW,HIGH,LOW,\n");
        let rows = read_records(&src, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.row, 1);
        assert_eq!(r.cue, "C1");
        assert_eq!(r.trigger_state, "");
        assert_eq!(r.exit_state, "");
        assert_eq!(r.output, "13");
        assert_eq!(r.dormant, "LOW");
    }

    #[test]
    fn test_long_form_record_carries_states() {
        let mut diags = Diagnostics::new();
        let src = format!("{HEADER}C1,glow,2,on_high,A,B,9,PWM,0,500,TRIANGLE,1,0,255,0,\n");
        let rows = read_records(&src, &mut diags);
        assert_eq!(rows[0].trigger_state, "A");
        assert_eq!(rows[0].exit_state, "B");
        assert_eq!(rows[0].output, "9");
    }

    #[test]
    fn test_param1_optional() {
        let mut diags = Diagnostics::new();
        let src = format!("{HEADER}C1,blink,2,on_high,13,DIGITAL,0,1000,BOX,2,LOW,HIGH,LOW\n");
        let rows = read_records(&src, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(rows[0].param1, "");
    }

    #[test]
    fn test_wrong_column_count_is_structural() {
        let mut diags = Diagnostics::new();
        let src = format!("{HEADER}C1,blink,2,on_high\n");
        let rows = read_records(&src, &mut diags);
        assert!(rows.is_empty());
        assert!(diags.has_errors());
        assert_eq!(diags.errors[0].code, DiagCode::WRONG_COLUMN_COUNT);
        assert_eq!(diags.errors[0].row, Some(1));
    }

    #[test]
    fn test_blank_lines_skipped_but_still_numbered() {
        let mut diags = Diagnostics::new();
        let src = format!(
            "{HEADER}C1,blink,2,on_high,13,DIGITAL,0,1000,BOX,2,LOW,HIGH,LOW,\n\
             \n\
             C2,glow,3,on_high,12,DIGITAL,0,1000,BOX,2,LOW,HIGH,LOW,\n\n"
        );
        let rows = read_records(&src, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        // the interior blank line is line 2 of the table
        assert_eq!(rows[1].row, 3);
    }
}
