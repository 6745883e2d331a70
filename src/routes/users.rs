use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db,
    error::ApiError,
    form,
    models::User,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(web::resource("/users/search").route(web::get().to(search)))
    .service(
        web::resource("/users/{id}")
            .route(web::put().to(update))
            .route(web::delete().to(delete)),
    );
}

#[derive(Debug, Deserialize)]
struct UserInput {
    name: String,
    phone: String,
}

async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = db::fetch_users(&state.db).await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

async fn create(
    state: web::Data<AppState>,
    payload: web::Json<UserInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let name = input.name.trim().to_string();
    let phone = input.phone.trim().to_string();
    form::validate_user(&name, &phone).map_err(ApiError::Validation)?;

    let id = db::new_id();
    db::insert_user(&state.db, &id, &name, &phone).await?;
    Ok(HttpResponse::Created().json(User { id, name, phone }))
}

async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UserInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let input = payload.into_inner();
    let name = input.name.trim().to_string();
    let phone = input.phone.trim().to_string();
    form::validate_user(&name, &phone).map_err(ApiError::Validation)?;

    if db::update_user(&state.db, &id, &name, &phone).await? == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(User { id, name, phone }))
}

async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if db::delete_user(&state.db, &id).await? == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "User deleted" })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    phone: Option<String>,
    id: Option<String>,
}

/// Looks a client up by exact id or by phone fragment; one of the two
/// parameters is required.
async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    if let Some(id) = query.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        let users: Vec<User> = db::fetch_user(&state.db, id)
            .await?
            .map(User::from)
            .into_iter()
            .collect();
        return Ok(HttpResponse::Ok().json(users));
    }

    if let Some(phone) = query
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
    {
        let rows = db::search_users_by_phone(&state.db, phone).await?;
        let users: Vec<User> = rows.into_iter().map(User::from).collect();
        return Ok(HttpResponse::Ok().json(users));
    }

    Err(ApiError::BadRequest(
        "phone or id query parameter is required".to_string(),
    ))
}
