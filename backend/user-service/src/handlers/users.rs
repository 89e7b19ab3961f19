use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::models::{NotifyResponse, UserRequest};
use crate::AppState;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::delete().to(delete_user))
            .route("/{id}/notify", web::post().to(notify_user)),
    );
}

/// GET /users
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let users = state.users.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// POST /users
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse> {
    let user = state.users.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// GET /users/{id}
pub async fn get_user(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let user = state.users.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PUT /users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse> {
    let user = state
        .users
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.users.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /users/{id}/notify
///
/// Publishes the stored record; 202 means the broker acknowledged it, not that
/// any consumer has processed it.
pub async fn notify_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let result = state.users.notify(id).await?;
    Ok(HttpResponse::Accepted().json(NotifyResponse::new(id, &result)))
}
