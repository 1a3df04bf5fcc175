//! Spreadsheet backend: plan rows live in a sheet, one row per set, addressed
//! by row/column coordinates through a values API (read range, append, range
//! write, structural batchUpdate).
//!
//! The sheet has a header row; data starts at row 2. Column layout A..K:
//! id, user_id, date, workout, exercise, set_number, weight_kg, reps,
//! completed, coach_message, rir. Rows are identified by the uuid stored in
//! column A since the backend itself has no row ids.
//!
//! Cells are strings; coercion to the typed row schema happens here, at the
//! storage boundary, with the documented defaults for unparseable values.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::plan::{NewPlanRow, PlanRow, RowPatch, DEFAULT_REPS, DEFAULT_WEIGHT_KG};
use crate::storage::{PlanStore, StoreError};

const HTTP_TIMEOUT_SECS: u64 = 30;
/// First data row (1-based); row 1 is the header.
const FIRST_DATA_ROW: usize = 2;
const LAST_COLUMN: char = 'K';

pub struct SheetStore {
    client: Client,
    base_url: String,
    api_key: String,
    spreadsheet_id: String,
    sheet_name: String,
    /// Numeric sheet id required by structural batchUpdate requests.
    sheet_gid: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default)]
    values: Option<Vec<Vec<String>>>,
}

impl SheetStore {
    pub fn new(
        base_url: String,
        api_key: String,
        spreadsheet_id: String,
        sheet_name: String,
        sheet_gid: i64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            spreadsheet_id,
            sheet_name,
            sheet_gid,
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{range}",
            self.base_url, self.spreadsheet_id
        )
    }

    fn data_range(&self) -> String {
        format!("{}!A{FIRST_DATA_ROW}:{LAST_COLUMN}", self.sheet_name)
    }

    fn row_range(&self, sheet_row: usize) -> String {
        format!("{}!A{sheet_row}:{LAST_COLUMN}{sheet_row}", self.sheet_name)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Reads every data row together with its 1-based sheet row number.
    /// Rows whose id/user_id cells are not valid uuids are skipped with a
    /// warning rather than failing the whole read.
    async fn read_all(&self) -> Result<Vec<(usize, PlanRow)>, StoreError> {
        let response = self
            .client
            .get(self.values_url(&self.data_range()))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let range: ValueRange = Self::check(response).await?.json().await?;

        let mut rows = Vec::new();
        for (offset, cells) in range.values.unwrap_or_default().iter().enumerate() {
            let sheet_row = FIRST_DATA_ROW + offset;
            match cells_to_row(cells) {
                Some(row) => rows.push((sheet_row, row)),
                None => {
                    tracing::warn!("Skipping malformed sheet row {sheet_row}: {cells:?}");
                }
            }
        }
        Ok(rows)
    }

    async fn find_row(&self, id: Uuid) -> Result<(usize, PlanRow), StoreError> {
        self.read_all()
            .await?
            .into_iter()
            .find(|(_, row)| row.id == id)
            .ok_or_else(|| StoreError::RowNotFound(format!("Row {id} not found")))
    }

    /// Writes one full row back to its range.
    async fn write_row(&self, sheet_row: usize, row: &PlanRow) -> Result<(), StoreError> {
        let range = self.row_range(sheet_row);
        let body = ValueRange {
            range: Some(range.clone()),
            values: Some(vec![row_to_cells(row)]),
        };
        let response = self
            .client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "RAW"), ("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Structural batchUpdate deleting the given 1-based sheet rows.
    /// Rows are removed bottom-up so earlier deletions do not shift the
    /// indices of later ones.
    async fn delete_rows(&self, mut sheet_rows: Vec<usize>) -> Result<(), StoreError> {
        if sheet_rows.is_empty() {
            return Ok(());
        }
        sheet_rows.sort_unstable_by(|a, b| b.cmp(a));
        let requests: Vec<_> = sheet_rows
            .iter()
            .map(|row| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": self.sheet_gid,
                            "dimension": "ROWS",
                            "startIndex": row - 1,
                            "endIndex": row
                        }
                    }
                })
            })
            .collect();
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PlanStore for SheetStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<PlanRow>, StoreError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .map(|(_, row)| row)
            .filter(|row| row.user_id == user_id)
            .collect())
    }

    async fn insert(&self, rows: &[NewPlanRow]) -> Result<Vec<PlanRow>, StoreError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let stored: Vec<PlanRow> = rows
            .iter()
            .map(|r| r.clone().into_row(Uuid::new_v4()))
            .collect();
        let body = ValueRange {
            range: None,
            values: Some(stored.iter().map(row_to_cells).collect()),
        };
        let url = format!("{}:append", self.values_url(&self.data_range()));
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!("Appended {} rows to sheet {}", stored.len(), self.sheet_name);
        Ok(stored)
    }

    async fn update(&self, id: Uuid, patch: &RowPatch) -> Result<PlanRow, StoreError> {
        let (sheet_row, existing) = self.find_row(id).await?;
        let merged = patch.apply(&existing);
        self.write_row(sheet_row, &merged).await?;
        Ok(merged)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let (sheet_row, _) = self.find_row(id).await?;
        self.delete_rows(vec![sheet_row]).await
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let targets: Vec<usize> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(sheet_row, _)| sheet_row)
            .collect();
        let count = targets.len() as u64;
        self.delete_rows(targets).await?;
        tracing::info!("Deleted {count} sheet rows for user {user_id}");
        Ok(count)
    }

    async fn batch_update(&self, updates: &[(Uuid, RowPatch)]) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        // One read, then a single values:batchUpdate writing every touched row.
        let current = self.read_all().await?;
        let mut data = Vec::new();
        for (id, patch) in updates {
            let (sheet_row, existing) = current
                .iter()
                .find(|(_, row)| row.id == *id)
                .ok_or_else(|| StoreError::RowNotFound(format!("Row {id} not found")))?;
            let merged = patch.apply(existing);
            data.push(ValueRange {
                range: Some(self.row_range(*sheet_row)),
                values: Some(vec![row_to_cells(&merged)]),
            });
        }
        let url = format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "valueInputOption": "RAW", "data": data }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn row_to_cells(row: &PlanRow) -> Vec<String> {
    vec![
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
    ]
}

/// Coerces one sheet row into the typed schema. Returns `None` only when the
/// identifying uuids are unusable; every other field falls back to a default.
fn cells_to_row(cells: &[String]) -> Option<PlanRow> {
    let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

    let id = cell(0).parse::<Uuid>().ok()?;
    let user_id = cell(1).parse::<Uuid>().ok()?;
    let date = NaiveDate::parse_from_str(cell(2), "%Y-%m-%d")
        .unwrap_or_else(|_| Utc::now().date_naive());

    Some(PlanRow {
        id,
        user_id,
        date,
        workout: cell(3).to_string(),
        exercise: cell(4).to_string(),
        set_number: cell(5).parse::<i32>().unwrap_or(1),
        weight_kg: cell(6).parse::<f64>().unwrap_or(DEFAULT_WEIGHT_KG),
        reps: {
            let reps = cell(7);
            if reps.is_empty() {
                DEFAULT_REPS.to_string()
            } else {
                reps.to_string()
            }
        },
        completed: matches!(cell(8).to_ascii_lowercase().as_str(), "true" | "1"),
        coach_message: cell(9).to_string(),
        rir: cell(10).parse::<i32>().ok(),
    })
}
