use crate::{
    api::{admin, attendance, modification, overtime, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/users/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/attendance")
                    // /attendance/checkin
                    .service(
                        web::resource("/checkin").route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/checkout
                    .service(
                        web::resource("/checkout").route(web::post().to(attendance::check_out)),
                    )
                    // /attendance/weekly
                    .service(web::resource("/weekly").route(web::get().to(attendance::weekly))),
            )
            .service(
                web::scope("/modifications")
                    // /modifications
                    .service(
                        web::resource("")
                            .route(web::post().to(modification::create_modification))
                            .route(web::get().to(modification::list_modifications)),
                    )
                    // /modifications/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(modification::approve_modification)),
                    )
                    // /modifications/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(modification::reject_modification)),
                    ),
            )
            .service(
                web::scope("/overtime")
                    // /overtime
                    .service(
                        web::resource("")
                            .route(web::post().to(overtime::create_overtime))
                            .route(web::get().to(overtime::list_overtime)),
                    )
                    // /overtime/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(overtime::approve_overtime)),
                    )
                    // /overtime/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(overtime::reject_overtime)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(web::resource("/users").route(web::get().to(admin::list_users)))
                    .service(
                        web::resource("/sessions").route(web::get().to(admin::list_sessions)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(report::attendance_summary)),
                    )
                    .service(
                        web::resource("/overtime").route(web::get().to(report::overtime_report)),
                    )
                    .service(
                        web::resource("/locations").route(web::get().to(report::location_stats)),
                    ),
            ),
    );
}
