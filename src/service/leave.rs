//! Leave ledger: applications, approvals and balances.

use crate::error::{ServiceError, ServiceResult};
use crate::model::leave_request::{
    LeaveAction, LeaveBalanceResponse, LeaveResponse, LeaveRow, LeaveStatus, inclusive_days,
    ranges_overlap,
};
use crate::service::employee::find_employee;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info};
use utoipa::ToSchema;

const LEAVE_VIEW: &str = r#"
    SELECT
        l.id,
        l.employee_id,
        l.start_date,
        l.end_date,
        l.status,
        l.applied_on,
        e.name AS employee_name,
        e.department AS employee_department
    FROM leaves l
    JOIN employees e ON e.id = l.employee_id
"#;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

pub async fn apply_leave(
    pool: &SqlitePool,
    req: LeaveApplication,
    today: NaiveDate,
) -> ServiceResult<LeaveResponse> {
    let mut conn = pool.acquire().await?;

    let emp = find_employee(&mut conn, req.employee_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee not found"))?;

    if req.start_date < emp.joining_date {
        return Err(ServiceError::invalid(
            "Cannot apply for leave before joining date",
        ));
    }
    if req.start_date > req.end_date {
        return Err(ServiceError::invalid("End date must be after start date"));
    }

    let history = leaves_for_employee(&mut conn, emp.id).await?;
    let overlapping = history.iter().any(|leave| {
        leave.status.blocks_dates()
            && ranges_overlap(leave.start_date, leave.end_date, req.start_date, req.end_date)
    });
    if overlapping {
        debug!(employee_id = emp.id, "Rejected overlapping leave request");
        return Err(ServiceError::conflict("Overlapping leave request exists"));
    }

    let days = inclusive_days(req.start_date, req.end_date);
    if days > emp.leave_balance {
        debug!(
            employee_id = emp.id,
            days,
            balance = emp.leave_balance,
            "Rejected leave request over balance"
        );
        return Err(ServiceError::invalid("Insufficient leave balance"));
    }

    let leave_id = insert_pending(&mut conn, emp.id, req.start_date, req.end_date, today).await?;
    info!(leave_id, employee_id = emp.id, days, "Leave request submitted");

    find_leave(&mut conn, leave_id)
        .await?
        .ok_or(ServiceError::Internal)
}

/// Inserts a Pending request unless a Pending or Approved request of the same
/// employee overlaps it. The overlap test runs inside the INSERT, so a
/// concurrent application that slipped past the earlier checks still conflicts.
pub(crate) async fn insert_pending(
    conn: &mut SqliteConnection,
    employee_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    applied_on: NaiveDate,
) -> ServiceResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO leaves (employee_id, start_date, end_date, status, applied_on)
        SELECT ?, ?, ?, ?, ?
        WHERE NOT EXISTS (
            SELECT 1 FROM leaves
            WHERE employee_id = ?
              AND status IN (?, ?)
              AND start_date <= ?
              AND end_date >= ?
        )
        "#,
    )
    .bind(employee_id)
    .bind(start_date)
    .bind(end_date)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(applied_on)
    .bind(employee_id)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(LeaveStatus::Approved.as_ref())
    .bind(end_date)
    .bind(start_date)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::conflict("Overlapping leave request exists"));
    }
    Ok(result.last_insert_rowid())
}

pub async fn list_leaves(pool: &SqlitePool) -> ServiceResult<Vec<LeaveResponse>> {
    let sql = format!("{LEAVE_VIEW} ORDER BY l.id");
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(to_response).collect()
}

/// Moves a pending request to Approved or Rejected. Approval debits the
/// employee's balance in the same transaction.
pub async fn act_on_leave(
    pool: &SqlitePool,
    leave_id: i64,
    action: LeaveAction,
) -> ServiceResult<LeaveResponse> {
    let mut tx = pool.begin().await?;

    // Writing first takes SQLite's write lock before anything is read, so a
    // competing decision is waited out instead of failing the upgrade.
    let status = action.resulting_status();
    let decided = sqlx::query(
        r#"
        UPDATE leaves
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(status.as_ref())
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(&mut *tx)
    .await?;

    if decided.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM leaves WHERE id = ?)")
            .bind(leave_id)
            .fetch_one(&mut *tx)
            .await?;
        return Err(if exists {
            ServiceError::conflict("Request already processed")
        } else {
            ServiceError::not_found("Leave request not found")
        });
    }

    let leave = find_leave(&mut tx, leave_id)
        .await?
        .ok_or(ServiceError::Internal)?;

    let days = leave.days();
    match action {
        LeaveAction::Approve => {
            let debited = sqlx::query(
                r#"
                UPDATE employees
                SET leave_balance = leave_balance - ?
                WHERE id = ?
                AND leave_balance >= ?
                "#,
            )
            .bind(days)
            .bind(leave.employee_id)
            .bind(days)
            .execute(&mut *tx)
            .await?;

            // dropping tx rolls the status change back
            if debited.rows_affected() == 0 {
                return Err(ServiceError::invalid("Insufficient leave balance"));
            }
        }
        LeaveAction::Reject => {}
    }

    tx.commit().await?;

    info!(leave_id, %status, days, "Leave request processed");
    Ok(leave)
}

pub async fn leave_balance(
    pool: &SqlitePool,
    employee_id: i64,
) -> ServiceResult<LeaveBalanceResponse> {
    let mut conn = pool.acquire().await?;

    let emp = find_employee(&mut conn, employee_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee not found"))?;
    let leavehistory = leaves_for_employee(&mut conn, emp.id).await?;

    Ok(LeaveBalanceResponse {
        balance: emp.leave_balance,
        leavehistory,
    })
}

async fn find_leave(
    conn: &mut SqliteConnection,
    leave_id: i64,
) -> ServiceResult<Option<LeaveResponse>> {
    let sql = format!("{LEAVE_VIEW} WHERE l.id = ?");
    let row = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(leave_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(to_response).transpose()
}

async fn leaves_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> ServiceResult<Vec<LeaveResponse>> {
    let sql = format!("{LEAVE_VIEW} WHERE l.employee_id = ? ORDER BY l.id");
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(employee_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(to_response).collect()
}

fn to_response(row: LeaveRow) -> ServiceResult<LeaveResponse> {
    let leave_id = row.id;
    LeaveResponse::try_from(row).map_err(|e| {
        error!(error = %e, leave_id, "Unknown leave status in storage");
        ServiceError::Internal
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::service::employee::{NewEmployee, add_employee};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2023-12-20")
    }

    async fn setup() -> (SqlitePool, i64) {
        let pool = init_db("sqlite::memory:", 1).await.unwrap();
        let emp = add_employee(
            &pool,
            NewEmployee {
                name: "Asha Rao".into(),
                email: "asha@company.com".into(),
                department: "Engineering".into(),
                joining_date: date("2023-01-01"),
            },
            today(),
        )
        .await
        .unwrap();
        (pool, emp.id)
    }

    fn application(employee_id: i64, start: &str, end: &str) -> LeaveApplication {
        LeaveApplication {
            employee_id,
            start_date: date(start),
            end_date: date(end),
        }
    }

    #[actix_web::test]
    async fn applying_creates_a_pending_request() {
        let (pool, emp_id) = setup().await;

        let leave = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();

        assert_eq!(leave.status, LeaveStatus::Pending);
        assert_eq!(leave.applied_on, today());
        assert_eq!(leave.employee.id, emp_id);
        assert_eq!(leave.employee.name, "Asha Rao");
        assert_eq!(leave.employee.department, "Engineering");

        // applying does not touch the balance
        let balance = leave_balance(&pool, emp_id).await.unwrap();
        assert_eq!(balance.balance, 20);
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let (pool, _) = setup().await;
        let err = apply_leave(&pool, application(404, "2024-01-01", "2024-01-02"), today())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::not_found("Employee not found"));
    }

    #[actix_web::test]
    async fn date_rules_are_enforced() {
        let (pool, emp_id) = setup().await;

        let err = apply_leave(&pool, application(emp_id, "2022-12-30", "2023-01-02"), today())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::invalid("Cannot apply for leave before joining date")
        );

        let err = apply_leave(&pool, application(emp_id, "2024-01-05", "2024-01-01"), today())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::invalid("End date must be after start date"));
    }

    #[actix_web::test]
    async fn overlapping_requests_conflict_until_rejected() {
        let (pool, emp_id) = setup().await;
        let first = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();

        let err = apply_leave(&pool, application(emp_id, "2024-01-03", "2024-01-10"), today())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::conflict("Overlapping leave request exists"));

        act_on_leave(&pool, first.id, LeaveAction::Reject).await.unwrap();

        let second = apply_leave(&pool, application(emp_id, "2024-01-03", "2024-01-10"), today())
            .await
            .unwrap();
        assert_eq!(second.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn approved_requests_still_block_dates() {
        let (pool, emp_id) = setup().await;
        let first = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();
        act_on_leave(&pool, first.id, LeaveAction::Approve).await.unwrap();

        let err = apply_leave(&pool, application(emp_id, "2024-01-05", "2024-01-06"), today())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[actix_web::test]
    async fn requests_longer_than_balance_are_refused() {
        let (pool, emp_id) = setup().await;
        let err = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-21"), today())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::invalid("Insufficient leave balance"));

        // exactly the balance is fine
        assert!(
            apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-20"), today())
                .await
                .is_ok()
        );
    }

    #[actix_web::test]
    async fn approval_debits_and_rejection_does_not() {
        let (pool, emp_id) = setup().await;
        let a = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();
        let b = apply_leave(&pool, application(emp_id, "2024-02-01", "2024-02-03"), today())
            .await
            .unwrap();

        let approved = act_on_leave(&pool, a.id, LeaveAction::Approve).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(leave_balance(&pool, emp_id).await.unwrap().balance, 15);

        let rejected = act_on_leave(&pool, b.id, LeaveAction::Reject).await.unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(leave_balance(&pool, emp_id).await.unwrap().balance, 15);
    }

    #[actix_web::test]
    async fn second_action_is_a_conflict() {
        let (pool, emp_id) = setup().await;
        let leave = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();

        act_on_leave(&pool, leave.id, LeaveAction::Approve).await.unwrap();
        let err = act_on_leave(&pool, leave.id, LeaveAction::Reject)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::conflict("Request already processed"));

        // the failed action left the first decision and balance in place
        let balance = leave_balance(&pool, emp_id).await.unwrap();
        assert_eq!(balance.balance, 15);
        assert_eq!(balance.leavehistory[0].status, LeaveStatus::Approved);
    }

    #[actix_web::test]
    async fn approval_over_balance_keeps_request_pending() {
        let (pool, emp_id) = setup().await;
        let big = apply_leave(&pool, application(emp_id, "2024-03-01", "2024-03-15"), today())
            .await
            .unwrap();
        let other = apply_leave(&pool, application(emp_id, "2024-04-01", "2024-04-10"), today())
            .await
            .unwrap();

        act_on_leave(&pool, big.id, LeaveAction::Approve).await.unwrap();
        let err = act_on_leave(&pool, other.id, LeaveAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::invalid("Insufficient leave balance"));

        let balance = leave_balance(&pool, emp_id).await.unwrap();
        assert_eq!(balance.balance, 5);
        assert_eq!(balance.leavehistory[1].status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn unknown_leave_is_not_found() {
        let (pool, _) = setup().await;
        let err = act_on_leave(&pool, 77, LeaveAction::Approve).await.unwrap_err();
        assert_eq!(err, ServiceError::not_found("Leave request not found"));
    }

    #[actix_web::test]
    async fn fresh_employee_has_full_balance_and_no_history() {
        let (pool, emp_id) = setup().await;
        let balance = leave_balance(&pool, emp_id).await.unwrap();
        assert_eq!(balance.balance, 20);
        assert!(balance.leavehistory.is_empty());

        let err = leave_balance(&pool, emp_id + 1).await.unwrap_err();
        assert_eq!(err, ServiceError::not_found("Employee not found"));
    }

    #[actix_web::test]
    async fn listing_embeds_current_employee_state() {
        let (pool, emp_id) = setup().await;
        apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-02"), today())
            .await
            .unwrap();

        sqlx::query("UPDATE employees SET department = 'Research' WHERE id = ?")
            .bind(emp_id)
            .execute(&pool)
            .await
            .unwrap();

        let leaves = list_leaves(&pool).await.unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].employee.department, "Research");
    }

    #[actix_web::test]
    async fn guarded_insert_refuses_overlap_on_its_own() {
        let (pool, emp_id) = setup().await;
        let first = apply_leave(&pool, application(emp_id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let err = insert_pending(
            &mut conn,
            emp_id,
            date("2024-01-03"),
            date("2024-01-10"),
            today(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ServiceError::conflict("Overlapping leave request exists"));
        drop(conn);

        // once the blocking request is rejected the same insert goes through
        act_on_leave(&pool, first.id, LeaveAction::Reject).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let id = insert_pending(
            &mut conn,
            emp_id,
            date("2024-01-03"),
            date("2024-01-10"),
            today(),
        )
        .await
        .unwrap();
        assert!(id > first.id);
    }

    #[actix_web::test]
    async fn decision_racing_a_committed_one_conflicts() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("race.db").display());
        let pool = init_db(&url, 5).await.unwrap();
        let emp = add_employee(
            &pool,
            NewEmployee {
                name: "Asha Rao".into(),
                email: "asha@company.com".into(),
                department: "Engineering".into(),
                joining_date: date("2023-01-01"),
            },
            today(),
        )
        .await
        .unwrap();
        let leave = apply_leave(&pool, application(emp.id, "2024-01-01", "2024-01-05"), today())
            .await
            .unwrap();

        // another reviewer holds the write lock with a decision not yet committed
        let mut other = pool.begin().await.unwrap();
        sqlx::query("UPDATE leaves SET status = 'Rejected' WHERE id = ? AND status = 'Pending'")
            .bind(leave.id)
            .execute(&mut *other)
            .await
            .unwrap();

        let racer = {
            let pool = pool.clone();
            actix_web::rt::spawn(
                async move { act_on_leave(&pool, leave.id, LeaveAction::Approve).await },
            )
        };
        actix_web::rt::time::sleep(std::time::Duration::from_millis(300)).await;
        other.commit().await.unwrap();

        let err = racer.await.unwrap().unwrap_err();
        assert_eq!(err, ServiceError::conflict("Request already processed"));

        let balance = leave_balance(&pool, emp.id).await.unwrap();
        assert_eq!(balance.balance, 20);
        assert_eq!(balance.leavehistory[0].status, LeaveStatus::Rejected);
    }
}
