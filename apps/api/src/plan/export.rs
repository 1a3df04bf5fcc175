//! CSV export of the current plan: one line per row, comma-separated,
//! header included, UTF-8.

use crate::models::plan::PlanRow;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: &str =
    "id,user_id,date,workout,exercise,set_number,weight_kg,reps,completed,coach_message,rir";

pub fn rows_to_csv(rows: &[PlanRow]) -> String {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            row.id.to_string(),
            row.user_id.to_string(),
            row.date.to_string(),
            row.workout.clone(),
            row.exercise.clone(),
            row.set_number.to_string(),
            row.weight_kg.to_string(),
            row.reps.clone(),
            row.completed.to_string(),
            row.coach_message.clone(),
            row.rir.map(|r| r.to_string()).unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a field when it contains a separator, quote or newline; embedded
/// quotes are doubled.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
