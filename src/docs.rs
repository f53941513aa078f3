use crate::model::employee::{Employee, EmployeeSummary};
use crate::model::leave_request::{LeaveBalanceResponse, LeaveResponse, LeaveStatus};
use crate::service::employee::NewEmployee;
use crate::service::leave::LeaveApplication;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "0.1.0",
        description = r#"
## Leave Management

Records employees, accepts leave applications and tracks their approval.

### Rules
- Every employee starts with **20** days of leave.
- A request may not start before the employee joined, and may not overlap a
  pending or approved request of the same employee.
- Approval debits the inclusive day count from the balance; rejection does not.
- Approved and Rejected are final.

### Errors
Failures return `{"detail": "<message>"}` with 400, 404 or 409.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,

        crate::api::leave_request::apply_leave,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::act_on_leave,
        crate::api::leave_request::get_leave_balance,

        crate::api::health::health
    ),
    components(
        schemas(
            Employee,
            EmployeeSummary,
            NewEmployee,
            LeaveApplication,
            LeaveStatus,
            LeaveResponse,
            LeaveBalanceResponse
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;
