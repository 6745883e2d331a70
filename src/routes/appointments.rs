use actix_web::{web, HttpResponse};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db,
    error::ApiError,
    form::{self, AppointmentInput, ClientRef},
    models::{Appointment, Lang, ServiceType, CLOSE_HOUR, DEFAULT_LANG, OPEN_HOUR},
    reminder, schedule,
    state::AppState,
    whatsapp::{self, SendError},
};

const STARTS_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/appointments")
            .route(web::get().to(list_for_day))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/appointments/{id}")
            .route(web::put().to(update))
            .route(web::delete().to(delete)),
    )
    .service(
        web::resource("/appointments/{id}/send-whatsapp").route(web::post().to(send_whatsapp)),
    )
    .service(web::resource("/schedule").route(web::get().to(day_schedule)));
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

fn parse_date(query: &DateQuery) -> Result<NaiveDate, ApiError> {
    let raw = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ApiError::BadRequest("date query parameter is required".to_string()))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("invalid date format, expected YYYY-MM-DD".to_string()))
}

fn parse_starts_at(raw: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(raw, STARTS_AT_FORMAT)
        .map_err(|_| ApiError::BadRequest("stored appointment time is malformed".to_string()))
}

async fn list_for_day(
    state: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = parse_date(&query)?;
    let rows = db::appointments_on(&state.db, date).await?;
    let appointments: Vec<Appointment> = rows.into_iter().map(Appointment::from).collect();
    Ok(HttpResponse::Ok().json(appointments))
}

async fn create(
    state: web::Data<AppState>,
    payload: web::Json<AppointmentInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let normalized = form::validate_appointment(&input, Local::now().date_naive())
        .map_err(ApiError::Validation)?;

    let user_id = resolve_client(&state.db, normalized.client).await?;
    let id = db::new_id();
    db::insert_appointment(
        &state.db,
        &id,
        &user_id,
        normalized.service.as_str(),
        &normalized.starts_at.format(STARTS_AT_FORMAT).to_string(),
        normalized.duration_minutes,
        normalized.notes.as_deref(),
    )
    .await?;

    let row = db::fetch_appointment(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Created().json(Appointment::from(row)))
}

/// Resolves the submission's client to a user id, creating the user when
/// raw details name a phone number we have not seen before.
async fn resolve_client(pool: &sqlx::SqlitePool, client: ClientRef) -> Result<String, ApiError> {
    match client {
        ClientRef::Id(id) => {
            db::fetch_user(pool, &id)
                .await?
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown client reference {id:?}.")))?;
            Ok(id)
        }
        ClientRef::Details { name, phone } => {
            if let Some(user) = db::find_user_by_phone(pool, &phone).await? {
                return Ok(user.id);
            }
            let id = db::new_id();
            db::insert_user(pool, &id, &name, &phone).await?;
            Ok(id)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentPatch {
    user_id: Option<String>,
    #[serde(rename = "type")]
    service: Option<String>,
    date: Option<String>,
    time: Option<String>,
    duration: Option<i64>,
    notes: Option<String>,
}

async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<AppointmentPatch>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = db::fetch_appointment(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let existing_start = parse_starts_at(&existing.starts_at)?;
    let patch = payload.into_inner();
    let mut errors = Vec::new();

    let user_id = match patch.user_id.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => {
            if db::fetch_user(&state.db, user_id).await?.is_none() {
                errors.push(format!("Unknown client reference {user_id:?}."));
            }
            user_id.to_string()
        }
        _ => existing.user_id.clone(),
    };

    let service = match patch.service.as_deref() {
        Some(raw) => match ServiceType::parse(raw) {
            Some(service) => Some(service),
            None => {
                errors.push(format!("Unknown service type {raw:?}."));
                None
            }
        },
        None => None,
    };
    let service_name = service
        .map(|service| service.as_str().to_string())
        .unwrap_or_else(|| existing.service.clone());

    let date = match patch.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(format!("Invalid appointment date {raw:?}."));
                None
            }
        },
        _ => Some(existing_start.date()),
    };

    let starts_at = match (patch.time.as_deref(), date) {
        (Some(time), Some(date)) => match form::resolve_start(time, date) {
            Ok(starts_at) => Some(starts_at),
            Err(message) => {
                errors.push(message);
                None
            }
        },
        (None, Some(date)) => Some(date.and_time(existing_start.time())),
        _ => None,
    };

    // An explicit duration wins; otherwise a service change re-derives it.
    let duration_minutes = match patch.duration {
        Some(duration) if duration <= 0 => {
            errors.push("Duration must be positive.".to_string());
            None
        }
        Some(duration) => Some(duration),
        None => match service {
            Some(service) => Some(service.duration_minutes()),
            None => Some(existing.duration_minutes),
        },
    };

    let notes = match patch.notes {
        Some(notes) => {
            let trimmed = notes.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        None => existing.notes.clone(),
    };

    match (starts_at, duration_minutes) {
        (Some(starts_at), Some(duration_minutes)) if errors.is_empty() => {
            db::update_appointment(
                &state.db,
                &id,
                &user_id,
                &service_name,
                &starts_at.format(STARTS_AT_FORMAT).to_string(),
                duration_minutes,
                notes.as_deref(),
            )
            .await?;
            let row = db::fetch_appointment(&state.db, &id)
                .await?
                .ok_or(ApiError::NotFound)?;
            Ok(HttpResponse::Ok().json(Appointment::from(row)))
        }
        _ => Err(ApiError::Validation(errors)),
    }
}

async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if db::delete_appointment(&state.db, &id).await? == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Appointment deleted" })))
}

#[derive(Debug, Default, Deserialize)]
struct SendReminderBody {
    lang: Option<String>,
}

async fn send_whatsapp(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Option<web::Json<SendReminderBody>>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let row = db::fetch_appointment(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let lang = payload
        .and_then(|body| body.into_inner().lang)
        .map(|code| Lang::from_code(&code))
        .unwrap_or(DEFAULT_LANG);
    let service = ServiceType::parse(&row.service)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown service type {:?}.", row.service)))?;
    let starts_at = parse_starts_at(&row.starts_at)?;

    let labels = reminder::meridiem_labels(lang);
    let date = starts_at.date().format("%Y/%m/%d").to_string();
    let time = reminder::format_time_12h(&row.starts_at, &labels);

    match whatsapp::send_template(
        &state.whatsapp,
        &state.http,
        &row.user_phone,
        lang,
        [&row.user_name, &date, &time, service.label(lang)],
    )
    .await
    {
        Ok(()) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Reminder sent" })))
        }
        Err(err @ (SendError::MissingPhone | SendError::NotConfigured)) => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Provider(err.to_string())),
    }
}

async fn day_schedule(
    state: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = parse_date(&query)?;
    let rows = db::appointments_on(&state.db, date).await?;
    let appointments: Vec<Appointment> = rows.into_iter().map(Appointment::from).collect();
    let slots = schedule::build_day_schedule(
        date,
        OPEN_HOUR,
        CLOSE_HOUR,
        &appointments,
        Local::now().naive_local(),
    );
    Ok(HttpResponse::Ok().json(slots))
}
