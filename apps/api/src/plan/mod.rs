//! Plan domain operations: listing, manual edits, AI generation, CSV export.

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::{PlanRow, RowPatch};

pub mod export;
pub mod generate;
pub mod handlers;

/// Next set number within a (workout, exercise) group. Set numbers are
/// 1-based and contiguous, so this is simply max + 1.
pub fn next_set_number(rows: &[PlanRow], workout: &str, exercise: &str) -> i32 {
    rows.iter()
        .filter(|r| r.workout == workout && r.exercise == exercise)
        .map(|r| r.set_number)
        .max()
        .unwrap_or(0)
        + 1
}

/// Patches restoring contiguous 1-based set numbers within one
/// (workout, exercise) group after a row was removed. Rows already at
/// their position get no patch.
pub fn renumber_sets(rows: &[PlanRow], workout: &str, exercise: &str) -> Vec<(Uuid, RowPatch)> {
    let mut group: Vec<&PlanRow> = rows
        .iter()
        .filter(|r| r.workout == workout && r.exercise == exercise)
        .collect();
    group.sort_by_key(|r| r.set_number);
    group
        .into_iter()
        .enumerate()
        .filter(|(i, r)| r.set_number != *i as i32 + 1)
        .map(|(i, r)| {
            (
                r.id,
                RowPatch {
                    set_number: Some(i as i32 + 1),
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// Completed rows are immutable until the patch explicitly resets the
/// completed flag to false.
pub fn ensure_editable(row: &PlanRow, patch: &RowPatch) -> Result<(), AppError> {
    if row.completed && patch.completed != Some(false) {
        return Err(AppError::Validation(format!(
            "Set {} of '{}' is completed; reset it before editing",
            row.set_number, row.exercise
        )));
    }
    Ok(())
}

/// Rejects patches that would violate the row invariants before any remote
/// call is made.
pub fn validate_patch(patch: &RowPatch) -> Result<(), AppError> {
    if patch.is_empty() {
        return Err(AppError::Validation("empty update".to_string()));
    }
    if let Some(w) = patch.weight_kg {
        if w < 0.0 || !w.is_finite() {
            return Err(AppError::Validation(
                "weight_kg must be a non-negative number".to_string(),
            ));
        }
    }
    if let Some(n) = patch.set_number {
        if n < 1 {
            return Err(AppError::Validation("set_number must be >= 1".to_string()));
        }
    }
    if let Some(rir) = patch.rir {
        if rir < 0 {
            return Err(AppError::Validation("rir must be >= 0".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(workout: &str, exercise: &str, set_number: i32, completed: bool) -> PlanRow {
        PlanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            workout: workout.to_string(),
            exercise: exercise.to_string(),
            set_number,
            weight_kg: 60.0,
            reps: "8".to_string(),
            completed,
            coach_message: String::new(),
            rir: None,
        }
    }

    #[test]
    fn test_next_set_number_empty_group_starts_at_one() {
        assert_eq!(next_set_number(&[], "Push", "Dips"), 1);
    }

    #[test]
    fn test_next_set_number_continues_group() {
        let rows = vec![
            row("Push", "Dips", 1, false),
            row("Push", "Dips", 2, false),
            row("Push", "Bankdrücken", 4, false),
            row("Pull", "Dips", 7, false),
        ];
        assert_eq!(next_set_number(&rows, "Push", "Dips"), 3);
        assert_eq!(next_set_number(&rows, "Push", "Bankdrücken"), 5);
        assert_eq!(next_set_number(&rows, "Pull", "Rudern"), 1);
    }

    #[test]
    fn test_renumber_closes_gap_after_middle_delete() {
        // A group left as [1, 3] collapses back to [1, 2].
        let rows = vec![row("Push", "Dips", 1, false), row("Push", "Dips", 3, true)];
        let patches = renumber_sets(&rows, "Push", "Dips");
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, rows[1].id);
        assert_eq!(patches[0].1.set_number, Some(2));
    }

    #[test]
    fn test_renumber_noop_for_contiguous_group() {
        let rows = vec![
            row("Push", "Dips", 1, false),
            row("Push", "Dips", 2, false),
            row("Push", "Dips", 3, false),
        ];
        assert!(renumber_sets(&rows, "Push", "Dips").is_empty());
    }

    #[test]
    fn test_renumber_leaves_other_groups_alone() {
        let rows = vec![row("Push", "Dips", 5, false), row("Pull", "Rudern", 9, false)];
        let patches = renumber_sets(&rows, "Push", "Dips");
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, rows[0].id);
        assert_eq!(patches[0].1.set_number, Some(1));
    }

    #[test]
    fn test_completed_row_is_immutable() {
        let completed = row("Push", "Dips", 1, true);
        let patch = RowPatch {
            weight_kg: Some(70.0),
            ..Default::default()
        };
        assert!(ensure_editable(&completed, &patch).is_err());
    }

    #[test]
    fn test_completed_row_editable_when_patch_resets_flag() {
        let completed = row("Push", "Dips", 1, true);
        let patch = RowPatch {
            completed: Some(false),
            weight_kg: Some(70.0),
            ..Default::default()
        };
        assert!(ensure_editable(&completed, &patch).is_ok());
    }

    #[test]
    fn test_open_row_is_editable() {
        let open = row("Push", "Dips", 1, false);
        let patch = RowPatch {
            reps: Some("12".to_string()),
            ..Default::default()
        };
        assert!(ensure_editable(&open, &patch).is_ok());
    }

    #[test]
    fn test_validate_patch_rejects_negative_weight() {
        let patch = RowPatch {
            weight_kg: Some(-1.0),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn test_validate_patch_rejects_zero_set_number() {
        let patch = RowPatch {
            set_number: Some(0),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn test_validate_patch_rejects_empty_patch() {
        assert!(validate_patch(&RowPatch::default()).is_err());
    }

    #[test]
    fn test_validate_patch_accepts_reasonable_update() {
        let patch = RowPatch {
            weight_kg: Some(62.5),
            reps: Some("8".to_string()),
            rir: Some(2),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_ok());
    }
}
