use crate::error::ServiceError;
use crate::model::leave_request::{LeaveAction, LeaveBalanceResponse, LeaveResponse};
use crate::service::leave::{self as ledger, LeaveApplication};
use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/leaves/apply",
    request_body(
        content = LeaveApplication,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Invalid dates or insufficient balance", body = Object, example = json!({
            "detail": "Insufficient leave balance"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 409, description = "Overlaps a pending or approved request", body = Object, example = json!({
            "detail": "Overlapping leave request exists"
        }))
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    pool: web::Data<SqlitePool>,
    payload: web::Json<LeaveApplication>,
) -> Result<HttpResponse, ServiceError> {
    let today = chrono::Local::now().date_naive();
    let leave = ledger::apply_leave(pool.get_ref(), payload.into_inner(), today).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// List every leave request with its employee
#[utoipa::path(
    get,
    path = "/leaves",
    responses(
        (status = 200, description = "All leave requests", body = [LeaveResponse])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ServiceError> {
    let leaves = ledger::list_leaves(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    post,
    path = "/leaves/{leave_id}/{action}",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request"),
        ("action" = String, Path, description = "Approved or Rejected")
    ),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveResponse),
        (status = 400, description = "Invalid action or insufficient balance", body = Object, example = json!({
            "detail": "Insufficient leave balance"
        })),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "detail": "Leave request not found"
        })),
        (status = 409, description = "Already approved or rejected", body = Object, example = json!({
            "detail": "Request already processed"
        }))
    ),
    tag = "Leave"
)]
pub async fn act_on_leave(
    pool: web::Data<SqlitePool>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, ServiceError> {
    let (leave_id, action) = path.into_inner();

    let action = LeaveAction::parse(&action)
        .ok_or_else(|| ServiceError::invalid("Invalid action, expected Approved or Rejected"))?;

    let leave = ledger::act_on_leave(pool.get_ref(), leave_id, action).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Current balance and full leave history of one employee
#[utoipa::path(
    get,
    path = "/employees/{emp_id}/leave",
    params(
        ("emp_id" = i64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Balance and history", body = LeaveBalanceResponse),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave_balance(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let emp_id = path.into_inner();
    let balance = ledger::leave_balance(pool.get_ref(), emp_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}
