use actix_web::web;

pub mod appointments;
pub mod reminders;
pub mod users;

/// Mounts the whole REST surface under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(appointments::configure)
            .configure(users::configure)
            .configure(reminders::configure),
    );
}
