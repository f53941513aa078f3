//! Employee directory: registration and listing.

use crate::error::{ServiceError, ServiceResult};
use crate::model::employee::{
    DEFAULT_LEAVE_BALANCE, Employee, is_valid_email, joining_date_floor,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use utoipa::ToSchema;

const EMPLOYEE_COLUMNS: &str = "id, name, email, department, joining_date, leave_balance";

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "2023-04-01", format = "date", value_type = String)]
    pub joining_date: NaiveDate,
}

pub async fn add_employee(
    pool: &SqlitePool,
    input: NewEmployee,
    today: NaiveDate,
) -> ServiceResult<Employee> {
    let name = input.name.trim();
    let department = input.department.trim();
    let email = input.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ServiceError::invalid("Name must not be empty"));
    }
    if department.is_empty() {
        return Err(ServiceError::invalid("Department must not be empty"));
    }
    if !is_valid_email(&email) {
        return Err(ServiceError::invalid("Invalid email address"));
    }

    let mut conn = pool.acquire().await?;

    if find_by_email(&mut conn, &email).await?.is_some() {
        debug!(email = %email, "Rejected duplicate email");
        return Err(ServiceError::conflict("Email already exists"));
    }
    if input.joining_date < joining_date_floor(today) {
        return Err(ServiceError::invalid("Invalid joining date"));
    }

    let sql = format!(
        "INSERT INTO employees (name, email, department, joining_date, leave_balance) \
         VALUES (?, ?, ?, ?, ?) RETURNING {EMPLOYEE_COLUMNS}"
    );
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(name)
        .bind(&email)
        .bind(department)
        .bind(input.joining_date)
        .bind(DEFAULT_LEAVE_BALANCE)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            // lost a race against a concurrent registration
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.is_unique_violation()
            );
            if duplicate {
                ServiceError::conflict("Email already exists")
            } else {
                ServiceError::from(e)
            }
        })?;

    info!(employee_id = employee.id, "Employee registered");
    Ok(employee)
}

pub async fn list_employees(pool: &SqlitePool) -> ServiceResult<Vec<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
    let employees = sqlx::query_as::<_, Employee>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(employees)
}

pub async fn find_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> ServiceResult<Option<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(employee)
}

async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> ServiceResult<Option<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(employee)
}
