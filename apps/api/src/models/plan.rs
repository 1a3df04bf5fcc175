//! The training-plan row schema: one row per set of one exercise for one
//! user on one day. This is the single record shape flowing between parser,
//! storage backends, and handlers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default rep target when an exercise line carries no parseable rep token.
pub const DEFAULT_REPS: &str = "10";
/// Default weight when no `kg` token is present or body weight is implied.
pub const DEFAULT_WEIGHT_KG: f64 = 0.0;
/// Default set count when an exercise line carries no set token.
pub const DEFAULT_SETS: u32 = 3;
/// Upper bound on sets per exercise, shared by parsed and manual input.
pub const MAX_SETS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    /// Session grouping, e.g. "Push" or "Tag 1".
    pub workout: String,
    pub exercise: String,
    /// 1-based and contiguous within a (workout, exercise) group.
    pub set_number: i32,
    /// Kilograms; 0.0 means body weight or unknown.
    pub weight_kg: f64,
    /// Kept as a string: a plain count ("10") after range reduction.
    pub reps: String,
    pub completed: bool,
    /// Annotation from the AI parser's explanation field or manual coach input.
    pub coach_message: String,
    /// Reps in reserve, reported by the user per set.
    pub rir: Option<i32>,
}

/// A row before the backend has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlanRow {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub workout: String,
    pub exercise: String,
    pub set_number: i32,
    pub weight_kg: f64,
    pub reps: String,
    pub completed: bool,
    pub coach_message: String,
    pub rir: Option<i32>,
}

impl NewPlanRow {
    pub fn into_row(self, id: Uuid) -> PlanRow {
        PlanRow {
            id,
            user_id: self.user_id,
            date: self.date,
            workout: self.workout,
            exercise: self.exercise,
            set_number: self.set_number,
            weight_kg: self.weight_kg,
            reps: self.reps,
            completed: self.completed,
            coach_message: self.coach_message,
            rir: self.rir,
        }
    }
}

/// Partial update applied to a single row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rir: Option<i32>,
}

impl RowPatch {
    pub fn is_empty(&self) -> bool {
        self.workout.is_none()
            && self.exercise.is_none()
            && self.set_number.is_none()
            && self.weight_kg.is_none()
            && self.reps.is_none()
            && self.completed.is_none()
            && self.coach_message.is_none()
            && self.rir.is_none()
    }

    /// Applies the patch to a row, returning the merged result.
    pub fn apply(&self, row: &PlanRow) -> PlanRow {
        PlanRow {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            workout: self.workout.clone().unwrap_or_else(|| row.workout.clone()),
            exercise: self
                .exercise
                .clone()
                .unwrap_or_else(|| row.exercise.clone()),
            set_number: self.set_number.unwrap_or(row.set_number),
            weight_kg: self.weight_kg.unwrap_or(row.weight_kg),
            reps: self.reps.clone().unwrap_or_else(|| row.reps.clone()),
            completed: self.completed.unwrap_or(row.completed),
            coach_message: self
                .coach_message
                .clone()
                .unwrap_or_else(|| row.coach_message.clone()),
            rir: self.rir.or(row.rir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> PlanRow {
        PlanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            workout: "Push".to_string(),
            exercise: "Bankdrücken".to_string(),
            set_number: 1,
            weight_kg: 60.0,
            reps: "8".to_string(),
            completed: false,
            coach_message: "Brust".to_string(),
            rir: None,
        }
    }

    #[test]
    fn test_patch_apply_overrides_only_set_fields() {
        let row = sample_row();
        let patch = RowPatch {
            weight_kg: Some(62.5),
            completed: Some(true),
            ..Default::default()
        };
        let merged = patch.apply(&row);
        assert_eq!(merged.weight_kg, 62.5);
        assert!(merged.completed);
        assert_eq!(merged.exercise, "Bankdrücken");
        assert_eq!(merged.reps, "8");
        assert_eq!(merged.id, row.id);
    }

    #[test]
    fn test_empty_patch_detected() {
        assert!(RowPatch::default().is_empty());
        let patch = RowPatch {
            reps: Some("12".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = RowPatch {
            completed: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "completed": true }));
    }

    #[test]
    fn test_new_row_into_row_carries_all_fields() {
        let new = NewPlanRow {
            user_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            workout: "Pull".to_string(),
            exercise: "Klimmzüge".to_string(),
            set_number: 2,
            weight_kg: 0.0,
            reps: "10".to_string(),
            completed: false,
            coach_message: String::new(),
            rir: Some(2),
        };
        let id = Uuid::new_v4();
        let row = new.clone().into_row(id);
        assert_eq!(row.id, id);
        assert_eq!(row.exercise, new.exercise);
        assert_eq!(row.rir, Some(2));
    }
}
