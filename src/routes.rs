use crate::{
    api::{employee, health, leave_request},
    config::Config,
    error::extractor_error,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_cors::Cors;
use actix_web::{guard, middleware::Condition, web};
use std::sync::Arc;

type WriteLimiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

// Helper to build the per-peer limiter shared by the write resources
fn build_limiter(requests_per_min: u32) -> WriteLimiter {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Arc::new(Governor::new(&cfg))
}

/// CORS policy for the configured browser origins.
pub fn cors(config: &Config) -> Cors {
    config
        .cors_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limit_writes = config.rate_write_per_min > 0;
    let limiter = build_limiter(config.rate_write_per_min);
    let write_limit = || Condition::new(limit_writes, limiter.clone());

    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| extractor_error(err.to_string())),
    )
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| extractor_error(err.to_string())),
    );

    cfg.service(web::resource("/health").route(web::get().to(health::health)));

    cfg.service(
        web::scope("/employees")
            // POST /employees, throttled; the guard lets GET fall through to the next resource
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(write_limit())
                    .route(web::post().to(employee::create_employee)),
            )
            // GET /employees
            .service(web::resource("").route(web::get().to(employee::list_employees)))
            // /employees/{emp_id}/leave
            .service(
                web::resource("/{emp_id}/leave")
                    .route(web::get().to(leave_request::get_leave_balance)),
            ),
    );

    cfg.service(
        web::scope("/leaves")
            // /leaves
            .service(web::resource("").route(web::get().to(leave_request::list_leaves)))
            // /leaves/apply
            .service(
                web::resource("/apply")
                    .wrap(write_limit())
                    .route(web::post().to(leave_request::apply_leave)),
            )
            // /leaves/{leave_id}/{action}
            .service(
                web::resource("/{leave_id}/{action}")
                    .wrap(write_limit())
                    .route(web::post().to(leave_request::act_on_leave)),
            ),
    );
}
