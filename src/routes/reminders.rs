use actix_web::{web, HttpResponse};
use chrono::{Days, Local, NaiveDate};
use serde_json::json;

use crate::{
    db,
    error::ApiError,
    models::{Appointment, ServiceType, DEFAULT_LANG},
    reminder,
    state::AppState,
    whatsapp::{self, SendError},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/send-daily-reminders").route(web::post().to(send_daily)))
        .service(web::resource("/send-tomorrow-reminders").route(web::post().to(send_tomorrow)));
}

async fn send_daily(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    send_for_date(&state, Local::now().date_naive()).await
}

async fn send_tomorrow(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tomorrow = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| Local::now().date_naive());
    send_for_date(&state, tomorrow).await
}

/// Sends one freeform reminder per appointment on `date`. Failures are
/// logged and counted, never retried; a client without a phone number is
/// skipped before any network call.
async fn send_for_date(state: &AppState, date: NaiveDate) -> Result<HttpResponse, ApiError> {
    let rows = db::appointments_on(&state.db, date).await?;
    let total = rows.len();
    let mut sent = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for row in rows {
        let appointment = Appointment::from(row);
        let Some(service) = ServiceType::parse(&appointment.service) else {
            log::warn!(
                "Appointment {} has unknown service type {:?}",
                appointment.id,
                appointment.service
            );
            failed += 1;
            continue;
        };
        let message = reminder::reminder_message(
            DEFAULT_LANG,
            &appointment.name,
            date,
            &appointment.time,
            service,
        );

        match whatsapp::send_text(&state.whatsapp, &state.http, &appointment.phone, &message).await
        {
            Ok(()) => sent += 1,
            Err(SendError::MissingPhone) => {
                log::warn!(
                    "Skipping reminder for appointment {}: no phone number",
                    appointment.id
                );
                skipped += 1;
            }
            Err(err) => {
                log::warn!("Reminder for appointment {} failed: {err}", appointment.id);
                failed += 1;
            }
        }
    }

    let message = format!(
        "Sent {sent} of {total} reminders for {date} ({skipped} skipped, {failed} failed)"
    );
    Ok(HttpResponse::Ok().json(json!({ "success": failed == 0, "message": message })))
}
