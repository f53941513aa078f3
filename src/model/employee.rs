use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days granted to every new employee.
pub const DEFAULT_LEAVE_BALANCE: i64 = 20;

/// Joining dates are rejected if they fall before this year (same month and day as today).
pub const JOINING_FLOOR_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Asha Rao",
        "email": "asha@company.com",
        "department": "Engineering",
        "joining_date": "2023-04-01",
        "leave_balance": 20
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Asha Rao")]
    pub name: String,

    #[schema(example = "asha@company.com", format = "email")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(
        example = "2023-04-01",
        value_type = String,
        format = "date"
    )]
    pub joining_date: NaiveDate,

    #[schema(example = 20)]
    pub leave_balance: i64,
}

/// Minimal employee fields embedded in every leave record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeSummary {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "Engineering")]
    pub department: String,
}

impl From<&Employee> for EmployeeSummary {
    fn from(emp: &Employee) -> Self {
        Self {
            id: emp.id,
            name: emp.name.clone(),
            department: emp.department.clone(),
        }
    }
}

/// Earliest joining date accepted on `today`.
pub fn joining_date_floor(today: NaiveDate) -> NaiveDate {
    // 2000 is a leap year, so Feb 29 always maps
    today
        .with_year(JOINING_FLOOR_YEAR)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(JOINING_FLOOR_YEAR, 1, 1).unwrap_or_default())
}

/// Loose `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
