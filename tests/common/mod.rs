// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use leave_ledger::db::init_db;
use serde_json::{Value, json};
use sqlx::SqlitePool;

/// Builds the full application (routing, CORS, path normalization, error shaping)
/// over `$pool` with the given `Config`.
#[macro_export]
macro_rules! test_app {
    ($pool:expr) => {
        test_app!($pool, leave_ledger::config::Config::default())
    };
    ($pool:expr, $config:expr) => {{
        let config = $config;
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(leave_ledger::routes::cors(&config))
                .wrap(actix_web::middleware::NormalizePath::trim())
                .app_data(actix_web::web::Data::new($pool.clone()))
                .configure(|cfg| leave_ledger::routes::configure(cfg, &config)),
        )
        .await
    }};
}

/// Fresh in-memory database with the schema in place.
pub async fn test_pool() -> SqlitePool {
    init_db("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}

/// Sends `req` and returns the status with the JSON body (`Null` when empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON response body")
    };
    (status, json)
}

pub fn employee_body(name: &str, email: &str, department: &str, joining_date: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "department": department,
        "joining_date": joining_date,
    })
}

pub fn leave_body(employee_id: i64, start_date: &str, end_date: &str) -> Value {
    json!({
        "employee_id": employee_id,
        "start_date": start_date,
        "end_date": end_date,
    })
}
