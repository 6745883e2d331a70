use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{Days, Local};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use purenails::{db, routes, state::AppState, whatsapp::WhatsAppConfig};

fn disabled_whatsapp() -> WhatsAppConfig {
    WhatsAppConfig {
        api_version: "v22.0".to_string(),
        phone_number_id: String::new(),
        access_token: String::new(),
        template_name: "appointment_reminder".to_string(),
    }
}

async fn test_state() -> AppState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    AppState {
        db: pool,
        whatsapp: disabled_whatsapp(),
        http: reqwest::Client::new(),
    }
}

async fn test_app(
    state: &AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure),
    )
    .await
}

async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

async fn post_json<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::post().uri(uri).set_json(body).to_request()).await
}

async fn put_json<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::put().uri(uri).set_json(body).to_request()).await
}

async fn get<S, B>(app: &S, uri: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::get().uri(uri).to_request()).await
}

async fn delete<S, B>(app: &S, uri: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::delete().uri(uri).to_request()).await
}

#[actix_web::test]
async fn clients_and_appointments_round_trip() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (status, user) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, appointment) = post_json(
        &app,
        "/api/appointments",
        json!({
            "userId": user_id,
            "type": "PEDICURE",
            "date": "2025-06-25",
            "time": "14:00",
            "notes": "first visit"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appointment["type"], "PEDICURE");
    assert_eq!(appointment["time"], "2025-06-25T14:00:00");
    assert_eq!(appointment["duration"], 45);
    assert_eq!(appointment["name"], "Ghazal");
    assert_eq!(appointment["phone"], "+972591234567");
    let appointment_id = appointment["id"].as_str().unwrap().to_string();

    let (status, listed) = get(&app, "/api/appointments?date=2025-06-25").await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], appointment_id.as_str());

    let (_, other_day) = get(&app, "/api/appointments?date=2025-06-26").await;
    assert!(other_day.as_array().unwrap().is_empty());

    let (status, deleted) = delete(&app, &format!("/api/appointments/{appointment_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (status, body) = delete(&app, &format!("/api/appointments/{appointment_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));
}

#[actix_web::test]
async fn raw_client_details_create_the_user_once() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let booking = json!({
        "name": "Maya",
        "phone": "+972599876543",
        "type": "MANICURE",
        "date": "2025-06-25",
        "time": "10:30"
    });
    let (status, _) = post_json(&app, "/api/appointments", booking.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = booking;
    second["time"] = json!("11:00");
    let (status, _) = post_json(&app, "/api/appointments", second).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, users) = get(&app, "/api/users").await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Maya");
}

#[actix_web::test]
async fn invalid_submissions_are_rejected_before_any_write() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (status, body) = post_json(
        &app,
        "/api/appointments",
        json!({ "name": "G", "phone": "123", "type": "MANICURE", "time": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("at least 2 characters"));
    assert!(message.contains("+972"));
    assert!(message.contains("time is required"));

    let (_, users) = get(&app, "/api/users").await;
    assert!(users.as_array().unwrap().is_empty());

    let (status, body) = get(&app, "/api/appointments").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "date query parameter is required");
}

#[actix_web::test]
async fn updating_a_missing_appointment_is_not_found() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (status, body) = put_json(&app, "/api/appointments/123", json!({ "notes": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));
}

#[actix_web::test]
async fn service_changes_rederive_duration_unless_explicit() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (_, user) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    let user_id = user["id"].as_str().unwrap().to_string();
    let (_, appointment) = post_json(
        &app,
        "/api/appointments",
        json!({ "userId": user_id, "type": "MANICURE", "date": "2025-06-25", "time": "09:00" }),
    )
    .await;
    let id = appointment["id"].as_str().unwrap().to_string();
    assert_eq!(appointment["duration"], 45);

    let (status, updated) =
        put_json(&app, &format!("/api/appointments/{id}"), json!({ "type": "BOTH_FULL" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "BOTH_FULL");
    assert_eq!(updated["duration"], 90);
    assert_eq!(updated["time"], "2025-06-25T09:00:00");

    let (_, updated) =
        put_json(&app, &format!("/api/appointments/{id}"), json!({ "duration": 120 })).await;
    assert_eq!(updated["duration"], 120);
    assert_eq!(updated["type"], "BOTH_FULL");

    let (_, updated) = put_json(
        &app,
        &format!("/api/appointments/{id}"),
        json!({ "time": "16:30", "date": "2025-06-26" }),
    )
    .await;
    assert_eq!(updated["time"], "2025-06-26T16:30:00");
}

#[actix_web::test]
async fn user_search_by_phone_fragment_and_id() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (_, first) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    post_json(
        &app,
        "/api/users",
        json!({ "name": "Maya", "phone": "+972521111111" }),
    )
    .await;

    let (status, matches) = get(&app, "/api/users/search?phone=5912").await;
    assert_eq!(status, StatusCode::OK);
    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "Ghazal");

    let id = first["id"].as_str().unwrap();
    let (_, matches) = get(&app, &format!("/api/users/search?id={id}")).await;
    assert_eq!(matches.as_array().unwrap().len(), 1);

    let (status, body) = get(&app, "/api/users/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("phone or id"));
}

#[actix_web::test]
async fn user_update_validates_and_delete_cascades() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (_, user) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    let user_id = user["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/appointments",
        json!({ "userId": user_id, "type": "LASHES", "date": "2025-06-25", "time": "12:00" }),
    )
    .await;

    let (status, _) = put_json(
        &app,
        &format!("/api/users/{user_id}"),
        json!({ "name": "G", "phone": "+972591234567" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = put_json(
        &app,
        &format!("/api/users/{user_id}"),
        json!({ "name": "Ghazal S", "phone": "+972591234568" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ghazal S");

    let (status, deleted) = delete(&app, &format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (_, listed) = get(&app, "/api/appointments?date=2025-06-25").await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn schedule_view_groups_slots_and_flags_nothing_in_the_future() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (_, user) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    let user_id = user["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/appointments",
        json!({ "userId": user_id, "type": "PEDICURE", "date": "2099-06-25", "time": "14:00" }),
    )
    .await;

    let (status, slots) = get(&app, "/api/schedule?date=2099-06-25").await;
    assert_eq!(status, StatusCode::OK);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 24);
    assert_eq!(slots[0]["label"], "08:00");
    assert_eq!(slots[23]["label"], "19:30");
    assert!(slots.iter().all(|slot| slot["isPast"] == false));

    let at_1400 = slots.iter().find(|slot| slot["label"] == "14:00").unwrap();
    assert_eq!(at_1400["appointments"].as_array().unwrap().len(), 1);
    let at_1330 = slots.iter().find(|slot| slot["label"] == "13:30").unwrap();
    assert!(at_1330["appointments"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn reminders_fail_fast_without_phone_or_credentials() {
    let state = test_state().await;
    let app = test_app(&state).await;

    // A row with no phone can only come from legacy data; bypass the form.
    db::insert_user(&state.db, "u-nophone", "Ghost", "").await.unwrap();
    db::insert_appointment(
        &state.db,
        "a-nophone",
        "u-nophone",
        "MANICURE",
        "2025-06-25T14:00:00",
        45,
        None,
    )
    .await
    .unwrap();

    let (status, body) = post_json(
        &app,
        "/api/appointments/a-nophone/send-whatsapp",
        json!({ "lang": "en" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("phone"));

    // With a phone but no provider credentials the precondition check still
    // fires before any network call.
    db::insert_user(&state.db, "u-phone", "Ghazal", "+972591234567")
        .await
        .unwrap();
    db::insert_appointment(
        &state.db,
        "a-phone",
        "u-phone",
        "PEDICURE",
        "2025-06-25T15:00:00",
        45,
        None,
    )
    .await
    .unwrap();

    let (status, body) = post_json(
        &app,
        "/api/appointments/a-phone/send-whatsapp",
        json!({ "lang": "ar" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not configured"));

    let (status, body) =
        post_json(&app, "/api/appointments/missing/send-whatsapp", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));
}

#[actix_web::test]
async fn bulk_reminders_report_counts() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let (status, body) = post_json(&app, "/api/send-tomorrow-reminders", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("Sent 0 of 0"));

    let tomorrow = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap();
    let (_, user) = post_json(
        &app,
        "/api/users",
        json!({ "name": "Ghazal", "phone": "+972591234567" }),
    )
    .await;
    let user_id = user["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/appointments",
        json!({
            "userId": user_id,
            "type": "EYEBROWS",
            "date": tomorrow.to_string(),
            "time": "10:00"
        }),
    )
    .await;

    // Provider credentials are absent, so the send is counted as failed
    // without any network traffic.
    let (status, body) = post_json(&app, "/api/send-tomorrow-reminders", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Sent 0 of 1"));
    assert!(message.contains("1 failed"));
}
