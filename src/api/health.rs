use crate::error::ServiceError;
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::SqlitePool;

/// Liveness probe, round-trips the database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database reachable", body = Object, example = json!({
            "status": "ok"
        })),
        (status = 500, description = "Database unreachable")
    ),
    tag = "Health"
)]
pub async fn health(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ServiceError> {
    sqlx::query("SELECT 1").execute(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}
