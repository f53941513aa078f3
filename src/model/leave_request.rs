use super::employee::EmployeeSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Pending and Approved requests hold their dates; Rejected ones release them.
    pub fn blocks_dates(self) -> bool {
        match self {
            LeaveStatus::Pending | LeaveStatus::Approved => true,
            LeaveStatus::Rejected => false,
        }
    }
}

/// Decision taken on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveAction {
    Approve,
    Reject,
}

impl LeaveAction {
    /// Parses the `{action}` path segment. Only the terminal statuses are actions.
    pub fn parse(raw: &str) -> Option<Self> {
        match LeaveStatus::from_str(raw).ok()? {
            LeaveStatus::Approved => Some(LeaveAction::Approve),
            LeaveStatus::Rejected => Some(LeaveAction::Reject),
            LeaveStatus::Pending => None,
        }
    }

    pub fn resulting_status(self) -> LeaveStatus {
        match self {
            LeaveAction::Approve => LeaveStatus::Approved,
            LeaveAction::Reject => LeaveStatus::Rejected,
        }
    }
}

/// A `leaves` row joined with the owning employee's display fields.
#[derive(Debug, sqlx::FromRow)]
pub struct LeaveRow {
    pub id: i64,
    pub employee_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub applied_on: NaiveDate,
    pub employee_name: String,
    pub employee_department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1,
    "start_date": "2024-01-01",
    "end_date": "2024-01-05",
    "status": "Pending",
    "applied_on": "2023-12-20",
    "employee": { "id": 1, "name": "Asha Rao", "department": "Engineering" }
}))]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: i64,
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    #[schema(example = "2023-12-20", format = "date", value_type = String)]
    /// date the application was submitted
    pub applied_on: NaiveDate,
    pub employee: EmployeeSummary,
}

impl LeaveResponse {
    pub fn days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

impl TryFrom<LeaveRow> for LeaveResponse {
    type Error = strum::ParseError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: LeaveStatus::from_str(&row.status)?,
            applied_on: row.applied_on,
            employee: EmployeeSummary {
                id: row.employee_id,
                name: row.employee_name,
                department: row.employee_department,
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "balance": 15, "leavehistory": [] }))]
pub struct LeaveBalanceResponse {
    #[schema(example = 15)]
    pub balance: i64,
    pub leavehistory: Vec<LeaveResponse>,
}

/// Number of calendar days in `[start, end]`, both ends included.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// `[a_start, a_end]` and `[b_start, b_end]` share at least one day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}
