//! Plan parser: turns free-text training plans produced by the LLM into
//! structured `NewPlanRow` records.
//!
//! This is a best-effort heuristic extractor, not a grammar. It is a pure
//! function of its input: no I/O, no shared state, identical output on
//! re-parse. Malformed lines degrade to zero rows plus a warning; the parser
//! itself never fails.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::models::plan::{NewPlanRow, DEFAULT_REPS, DEFAULT_SETS, DEFAULT_WEIGHT_KG, MAX_SETS};

/// Workout headers, in priority order. A line is matched against these
/// before the exercise pattern and never against both.
///
/// 1. Bold-colon:       `**Push:**` or `**Push**:`
/// 2. Level-2 heading:  `## Push`
/// 3. Level-3 heading:  `### Push`
/// 4. Trailing colon:   `Push:`
static HEADER_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(.+?)\*\*:?\s*$").unwrap());
static HEADER_H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+([^#].*?)\s*$").unwrap());
static HEADER_H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^###\s+(.+?)\s*$").unwrap());
static HEADER_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^-*#\s][^:]*):\s*$").unwrap());

/// `- ExerciseName: details` with an optional `-`/`*` bullet.
static EXERCISE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]?\s*([^:]+?)\s*:\s*(.+)$").unwrap());

/// Trailing parenthetical note, e.g. `(Fokus: Brust)` or `(Erklärung: ...)`.
/// Extracted and removed from the details before the other extractions run,
/// so digits inside the note cannot leak into sets/weight/reps.
static EXPLANATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((?:Fokus|Erklärung)\s*:\s*([^)]*)\)").unwrap());

/// First integer followed by an x / Sätze / Sets token. Longest tokens first.
static SET_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:sätze|satz|sets|set|x)").unwrap());

/// First `<number>kg`, comma or dot decimal separator.
static WEIGHT_KG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*kg").unwrap());

/// Body-weight keyword: forces weight to 0.0 regardless of any kg token.
static BODY_WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)körpergewicht|eigengewicht|bodyweight").unwrap());

/// First integer or integer-dash-integer range followed by a rep token.
/// Only the lower bound of a range is stored.
static REPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?:\s*[-–]\s*\d+)?\s*(?:wiederholungen|wdh|reps)").unwrap()
});

/// A non-fatal problem encountered while parsing. `line` is the offending
/// input line when the warning is line-scoped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    pub message: String,
}

/// Output of a parse run: expanded rows plus everything worth telling the user.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedPlan {
    pub rows: Vec<NewPlanRow>,
    pub warnings: Vec<ParseWarning>,
}

/// Fields extracted from one exercise line, before set expansion.
#[derive(Debug, PartialEq)]
struct ExerciseEntry {
    exercise: String,
    sets: u32,
    weight_kg: f64,
    reps: String,
    coach_message: String,
}

/// Parses a free-text training plan into one row per set.
///
/// Line-oriented single pass with one piece of state: the currently active
/// workout name. Exercise lines appearing before any recognized header are
/// dropped; there is no "unnamed workout" bucket.
pub fn parse_plan_text(text: &str, user_id: Uuid, date: NaiveDate) -> ParsedPlan {
    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut current_workout: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(workout) = match_workout_header(line) {
            current_workout = Some(workout);
            continue;
        }

        // Deliberate gate: exercise lines are only meaningful under a header.
        let Some(workout) = current_workout.as_deref() else {
            continue;
        };

        let Some(caps) = EXERCISE_LINE.captures(line) else {
            continue;
        };
        let exercise = caps[1].trim().to_string();
        let details = caps[2].trim();

        match parse_exercise_details(exercise, details) {
            Ok(entry) => {
                for set_number in 1..=entry.sets {
                    rows.push(NewPlanRow {
                        user_id,
                        date,
                        workout: workout.to_string(),
                        exercise: entry.exercise.clone(),
                        set_number: set_number as i32,
                        weight_kg: entry.weight_kg,
                        reps: entry.reps.clone(),
                        completed: false,
                        coach_message: entry.coach_message.clone(),
                        rir: None,
                    });
                }
            }
            Err(message) => {
                tracing::warn!("Skipping unparseable plan line '{line}': {message}");
                warnings.push(ParseWarning {
                    line: Some(line.to_string()),
                    message,
                });
            }
        }
    }

    if rows.is_empty() {
        warnings.push(ParseWarning {
            line: None,
            message: "No workout names found in the plan text. Expected headers like \
                      '**Push:**', '## Push' or 'Push:' followed by '- Übung: ...' lines."
                .to_string(),
        });
    }

    ParsedPlan { rows, warnings }
}

/// Tests a line against the ordered header patterns. The first matching
/// pattern wins; the captured name is trimmed of any trailing colon.
fn match_workout_header(line: &str) -> Option<String> {
    for pattern in [&*HEADER_BOLD, &*HEADER_H2, &*HEADER_H3, &*HEADER_COLON] {
        if let Some(caps) = pattern.captures(line) {
            let name = caps[1].trim().trim_end_matches(':').trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Extracts set count, weight, reps and the explanation note from the free
/// text after the exercise name. Each extraction is independent, except that
/// the explanation is removed first so its content cannot skew the others.
fn parse_exercise_details(exercise: String, details: &str) -> Result<ExerciseEntry, String> {
    let coach_message = EXPLANATION
        .captures(details)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();
    let details = EXPLANATION.replace(details, "");

    let sets = match SET_COUNT.captures(&details) {
        Some(caps) => {
            let sets = caps[1]
                .parse::<u32>()
                .map_err(|e| format!("set count '{}' out of range: {e}", &caps[1]))?;
            if sets == 0 || sets > MAX_SETS {
                return Err(format!("set count {sets} outside 1..={MAX_SETS}"));
            }
            sets
        }
        None => DEFAULT_SETS,
    };

    let weight_kg = if BODY_WEIGHT.is_match(&details) {
        DEFAULT_WEIGHT_KG
    } else {
        match WEIGHT_KG.captures(&details) {
            Some(caps) => caps[1]
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|e| format!("weight '{}' not a number: {e}", &caps[1]))?,
            None => DEFAULT_WEIGHT_KG,
        }
    };

    // Ranges like "8-10 Wdh" keep only their lower bound for storage.
    let reps = REPS
        .captures(&details)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| DEFAULT_REPS.to_string());

    Ok(ExerciseEntry {
        exercise,
        sets,
        weight_kg,
        reps,
        coach_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedPlan {
        parse_plan_text(
            text,
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        )
    }

    #[test]
    fn test_reference_line_expands_to_three_rows() {
        let plan = parse("**Push:**\n- Bankdrücken: 3 Sätze, 8-10 Wdh, 60 kg (Fokus: Brust)");
        assert_eq!(plan.rows.len(), 3);
        for (i, row) in plan.rows.iter().enumerate() {
            assert_eq!(row.workout, "Push");
            assert_eq!(row.exercise, "Bankdrücken");
            assert_eq!(row.set_number, (i + 1) as i32);
            assert_eq!(row.weight_kg, 60.0);
            assert_eq!(row.reps, "8", "range stored as lower bound");
            assert_eq!(row.coach_message, "Brust");
            assert!(!row.completed);
        }
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_bullet_before_any_header_is_dropped_silently() {
        let plan = parse("- Bankdrücken: 3 Sätze, 60 kg\n**Push:**\n- Dips: 2 Sätze");
        assert_eq!(plan.rows.len(), 2);
        assert!(plan.rows.iter().all(|r| r.exercise == "Dips"));
        // Dropped pre-header line produces no line warning.
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_no_header_anywhere_yields_zero_rows_and_distinct_warning() {
        let plan = parse("- Bankdrücken: 3 Sätze, 60 kg\n- Dips: 2 Sätze");
        assert!(plan.rows.is_empty());
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].line.is_none());
        assert!(plan.warnings[0].message.contains("No workout names found"));
    }

    #[test]
    fn test_empty_input_yields_zero_rows_and_warning() {
        let plan = parse("");
        assert!(plan.rows.is_empty());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_header_priority_bold_over_trailing_colon() {
        // "**Push:**" also ends in a colon-ish form; bold must win and the
        // captured name must carry no markup.
        let plan = parse("**Push:**\n- Dips: 3x");
        assert_eq!(plan.rows[0].workout, "Push");
    }

    #[test]
    fn test_h2_header_recognized() {
        let plan = parse("## Pull Day\n- Rudern: 3 Sätze");
        assert_eq!(plan.rows[0].workout, "Pull Day");
    }

    #[test]
    fn test_h3_header_recognized() {
        let plan = parse("### Beine\n- Kniebeugen: 4 Sätze");
        assert_eq!(plan.rows[0].workout, "Beine");
        assert_eq!(plan.rows.len(), 4);
    }

    #[test]
    fn test_trailing_colon_header_recognized() {
        let plan = parse("Oberkörper:\n- Schulterdrücken: 2 Sätze");
        assert_eq!(plan.rows[0].workout, "Oberkörper");
    }

    #[test]
    fn test_h2_not_swallowed_by_h3_pattern() {
        let plan = parse("## Push\n- Dips: 1x\n### Pull\n- Rudern: 1x");
        assert_eq!(plan.rows[0].workout, "Push");
        assert_eq!(plan.rows[1].workout, "Pull");
    }

    #[test]
    fn test_header_line_is_never_also_an_exercise() {
        // "Push:" matches the trailing-colon header; it must not fall through
        // to the exercise pattern even though a later header exists.
        let plan = parse("**Tag 1:**\nPush:\n- Dips: 2x");
        assert_eq!(plan.rows.len(), 2);
        assert!(plan.rows.iter().all(|r| r.workout == "Push"));
        assert!(plan.rows.iter().all(|r| r.exercise == "Dips"));
    }

    #[test]
    fn test_defaults_applied_when_details_are_bare() {
        let plan = parse("**Push:**\n- Liegestütze: locker bleiben");
        assert_eq!(plan.rows.len(), DEFAULT_SETS as usize);
        assert_eq!(plan.rows[0].weight_kg, 0.0);
        assert_eq!(plan.rows[0].reps, "10");
        assert_eq!(plan.rows[0].coach_message, "");
    }

    #[test]
    fn test_comma_decimal_weight() {
        let plan = parse("**Push:**\n- Schrägbank: 3 Sätze, 62,5 kg, 8 Wdh");
        assert_eq!(plan.rows[0].weight_kg, 62.5);
    }

    #[test]
    fn test_dot_decimal_weight() {
        let plan = parse("**Push:**\n- Schrägbank: 3 Sätze, 62.5kg, 8 Wdh");
        assert_eq!(plan.rows[0].weight_kg, 62.5);
    }

    #[test]
    fn test_body_weight_keyword_forces_zero() {
        let plan = parse("**Pull:**\n- Klimmzüge: 3 Sätze, Körpergewicht, 6-8 Wdh");
        assert_eq!(plan.rows[0].weight_kg, 0.0);
        assert_eq!(plan.rows[0].reps, "6");
    }

    #[test]
    fn test_body_weight_wins_over_explicit_kg() {
        let plan = parse("**Pull:**\n- Dips: 3 Sätze, Körpergewicht +5 kg");
        assert_eq!(plan.rows[0].weight_kg, 0.0);
    }

    #[test]
    fn test_set_count_via_x_token() {
        let plan = parse("**Push:**\n- Dips: 4x 10 Wdh");
        assert_eq!(plan.rows.len(), 4);
        assert_eq!(plan.rows[0].reps, "10");
    }

    #[test]
    fn test_english_tokens_recognized() {
        let plan = parse("**Push:**\n- Bench Press: 5 Sets, 5 reps, 100 kg");
        assert_eq!(plan.rows.len(), 5);
        assert_eq!(plan.rows[0].reps, "5");
        assert_eq!(plan.rows[0].weight_kg, 100.0);
    }

    #[test]
    fn test_erklaerung_note_extracted() {
        let plan = parse("**Push:**\n- Dips: 3 Sätze (Erklärung: langsam absenken)");
        assert_eq!(plan.rows[0].coach_message, "langsam absenken");
    }

    #[test]
    fn test_explanation_digits_do_not_leak_into_extraction() {
        // The note is stripped before set/weight/rep extraction runs.
        let plan = parse("**Push:**\n- Dips: 2 Sätze (Fokus: 3 Sekunden x halten, 99 kg Gefühl)");
        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.rows[0].weight_kg, 0.0);
        assert_eq!(plan.rows[0].coach_message, "3 Sekunden x halten, 99 kg Gefühl");
    }

    #[test]
    fn test_note_shared_by_every_set_of_the_exercise() {
        let plan = parse("**Push:**\n- Dips: 3 Sätze (Fokus: Trizeps)");
        assert!(plan.rows.iter().all(|r| r.coach_message == "Trizeps"));
    }

    #[test]
    fn test_unbulleted_exercise_line_accepted() {
        let plan = parse("**Push:**\nBankdrücken: 2 Sätze, 40 kg");
        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.rows[0].exercise, "Bankdrücken");
    }

    #[test]
    fn test_asterisk_bullet_accepted() {
        let plan = parse("**Push:**\n* Bankdrücken: 2 Sätze");
        assert_eq!(plan.rows.len(), 2);
    }

    #[test]
    fn test_malformed_line_warns_and_parsing_continues() {
        // Absurd set count overflows u32: the line degrades to a warning,
        // the following line still parses.
        let text = "**Push:**\n- Dips: 99999999999999999999 Sätze\n- Rudern: 2 Sätze";
        let plan = parse(text);
        assert_eq!(plan.rows.len(), 2);
        assert!(plan.rows.iter().all(|r| r.exercise == "Rudern"));
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].line.as_deref().unwrap().contains("Dips"));
    }

    #[test]
    fn test_huge_set_count_degrades_to_warning() {
        // Set expansion is bounded; an absurd count never allocates rows.
        let text = "**Push:**\n- Dips: 1000000000 Sätze\n- Rudern: 2 Sätze";
        let plan = parse(text);
        assert_eq!(plan.rows.len(), 2);
        assert!(plan.rows.iter().all(|r| r.exercise == "Rudern"));
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].line.as_deref().unwrap().contains("Dips"));
    }

    #[test]
    fn test_set_count_limit_boundary() {
        let plan = parse("**Push:**\n- Dips: 20 Sätze");
        assert_eq!(plan.rows.len(), 20);

        let plan = parse("**Push:**\n- Dips: 21 Sätze");
        assert!(plan.rows.is_empty());
        assert!(plan
            .warnings
            .iter()
            .any(|w| w.line.as_deref().is_some_and(|l| l.contains("Dips"))));
    }

    #[test]
    fn test_zero_set_count_degrades_to_warning() {
        let plan = parse("**Push:**\n- Dips: 0 Sätze");
        assert!(plan.rows.is_empty());
        assert!(plan
            .warnings
            .iter()
            .any(|w| w.message.contains("set count 0")));
    }

    #[test]
    fn test_multiple_workouts_tracked_across_lines() {
        let text = "**Push:**\n- Bankdrücken: 1x\n\n**Pull:**\n- Rudern: 1x\n- Curls: 1x";
        let plan = parse(text);
        assert_eq!(plan.rows.len(), 3);
        assert_eq!(plan.rows[0].workout, "Push");
        assert_eq!(plan.rows[1].workout, "Pull");
        assert_eq!(plan.rows[2].workout, "Pull");
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let text = "**Push:**\n- Bankdrücken: 3 Sätze, 8-10 Wdh, 60 kg (Fokus: Brust)";
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let first = parse_plan_text(text, user, date);
        let second = parse_plan_text(text, user, date);
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn test_set_numbers_contiguous_from_one() {
        let plan = parse("**Push:**\n- Dips: 5 Sätze");
        let numbers: Vec<i32> = plan.rows.iter().map(|r| r.set_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_details_extraction_order_independent_of_rep_truncation() {
        // Weight and note extraction are unaffected by the range reduction.
        let plan = parse("**Push:**\n- Bankdrücken: 2 Sätze, 8-12 Wdh, 72,5 kg (Fokus: Tempo)");
        assert_eq!(plan.rows[0].reps, "8");
        assert_eq!(plan.rows[0].weight_kg, 72.5);
        assert_eq!(plan.rows[0].coach_message, "Tempo");
    }

    #[test]
    fn test_rep_token_number_not_mistaken_for_set_count() {
        let plan = parse("**Push:**\n- Dips: 12 Wdh, 2 Sätze");
        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.rows[0].reps, "12");
    }

    #[test]
    fn test_user_and_date_stamped_on_every_row() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let plan = parse_plan_text("**Push:**\n- Dips: 2x", user, date);
        assert!(plan.rows.iter().all(|r| r.user_id == user && r.date == date));
    }
}
