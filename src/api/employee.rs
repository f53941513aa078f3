use crate::error::ServiceError;
use crate::model::employee::Employee;
use crate::service::employee::{self as directory, NewEmployee};
use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;

/// Register an employee
#[utoipa::path(
    post,
    path = "/employees",
    request_body = NewEmployee,
    responses(
        (status = 200, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid input", body = Object, example = json!({
            "detail": "Invalid joining date"
        })),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "detail": "Email already exists"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<SqlitePool>,
    payload: web::Json<NewEmployee>,
) -> Result<HttpResponse, ServiceError> {
    let today = chrono::Local::now().date_naive();
    let employee = directory::add_employee(pool.get_ref(), payload.into_inner(), today).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// List every employee
#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "All employees", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ServiceError> {
    let employees = directory::list_employees(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(employees))
}
