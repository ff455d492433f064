//! Registration, login and identity lookup.

use api_types::{
    auth::{Login, LoginResponse},
    user::{UserNew, UserView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{AccessContext, NewUser};

use crate::{ServerError, server::ServerState, views::user_view};

/// Open registration
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .register_user(NewUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user_view(user))))
}

/// Exchange credentials for the identity token (the user id).
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state.engine.login(&payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        token: user.id.clone(),
        user: user_view(user),
    }))
}

/// The caller, as resolved from the identity header
pub async fn me(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.current_user(&ctx).await?;
    Ok(Json(user_view(user)))
}
