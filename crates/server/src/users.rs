//! User API endpoints

use api_types::{
    ApiResponse,
    user::{UserNew, UserUpdate, UserView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccessContext, UserPatch};

use crate::{
    ServerError, auth,
    server::ServerState,
    views::{role_from_api, user_view},
};

/// Handle requests for listing every user (admin only)
pub async fn list(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<UserView>>, ServerError> {
    let users = state.engine.list_users(&ctx).await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

/// Same as registration
pub async fn user_new(
    state: State<ServerState>,
    payload: Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    auth::register(state, payload).await
}

pub async fn get(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(&id, &ctx).await?;
    Ok(Json(user_view(user)))
}

pub async fn update(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let patch = UserPatch {
        name: payload.name,
        email: payload.email,
        password: payload.password,
        role: payload.role.map(role_from_api),
    };
    let user = state.engine.update_user(&id, patch, &ctx).await?;
    Ok(Json(user_view(user)))
}

/// Soft delete
pub async fn delete(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.delete_user(&id, &ctx).await?;
    Ok(Json(ApiResponse::new("User deleted successfully", None)))
}
