//! Goal API endpoints

use api_types::{
    ApiResponse, Deleted,
    goal::{GoalAnalytics, GoalNew, GoalUpdate, GoalView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccessContext, GoalMode, GoalPatch, MoneyCents, NewGoal, Patch};

use crate::{
    ServerError,
    dates::parse_optional_date,
    server::ServerState,
    views::{analytics_view, goal_view, status_from_api},
};

fn parse_mode(mode: Option<&str>) -> Result<Option<GoalMode>, ServerError> {
    mode.map(|m| {
        m.parse::<GoalMode>()
            .map_err(|_| ServerError::Generic("Invalid mode. Use LIMIT or INVESTMENT".to_string()))
    })
    .transpose()
}

fn parse_optional_amount(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<MoneyCents>, ServerError> {
    Ok(value
        .map(|amount| MoneyCents::parse_decimal(&amount, field))
        .transpose()?)
}

/// Build the engine input, defaulting the owner to `default_user_id`.
pub(crate) fn new_goal(
    payload: GoalNew,
    default_user_id: Option<&str>,
) -> Result<NewGoal, ServerError> {
    Ok(NewGoal {
        user_id: payload
            .user_id
            .or_else(|| default_user_id.map(ToString::to_string))
            .unwrap_or_default(),
        title: payload.title,
        description: payload.description,
        target_amount: MoneyCents::parse_decimal(&payload.target_amount, "target_amount")?,
        start_date: parse_optional_date(payload.start_date.as_deref())?,
        end_date: parse_optional_date(payload.end_date.as_deref())?,
        category: payload.category,
        mode: parse_mode(payload.mode.as_deref())?,
    })
}

/// Handle requests for listing every goal (admin only)
pub async fn list(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.list_goals(&ctx).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

/// Handle requests for creating a new goal
pub async fn goal_new(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let caller = ctx.current_user_id().ok().map(ToString::to_string);
    let input = new_goal(payload, caller.as_deref())?;
    let goal = state.engine.create_goal(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(goal_view(goal))))
}

pub async fn get(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.goal(&id, &ctx).await?;
    Ok(Json(goal_view(goal)))
}

pub async fn update(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let patch = GoalPatch {
        title: payload.title,
        description: Patch::from(payload.description),
        target_amount: parse_optional_amount(payload.target_amount, "target_amount")?,
        current_amount: parse_optional_amount(payload.current_amount, "current_amount")?,
        start_date: parse_optional_date(payload.start_date.as_deref())?,
        end_date: parse_optional_date(payload.end_date.as_deref())?,
        category: Patch::from(payload.category),
        mode: parse_mode(payload.mode.as_deref())?,
        status: payload.status.map(status_from_api),
        completed: payload.completed,
    };
    let goal = state.engine.update_goal(&id, patch, &ctx).await?;
    Ok(Json(goal_view(goal)))
}

/// Soft delete
pub async fn delete(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.delete_goal(&id, &ctx).await?;
    Ok(Json(ApiResponse::new("Goal deleted successfully", None)))
}

/// Window recompute
pub async fn progress(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.update_goal_progress(&id, &ctx).await?;
    Ok(Json(goal_view(goal)))
}

/// Recompute from linked expenses
pub async fn sync(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GoalView>>, ServerError> {
    let goal = state.engine.sync_goal(&id, &ctx).await?;
    tracing::debug!(goal_id = %goal.id, status = %goal.status, "goal synced");
    Ok(Json(ApiResponse::new(
        "Goal synced successfully",
        Some(goal_view(goal)),
    )))
}

pub async fn list_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.list_goals_for_user(&user_id, &ctx).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

pub async fn delete_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, ServerError> {
    let count = state.engine.delete_goals_for_user(&user_id, &ctx).await?;
    Ok(Json(ApiResponse::new(
        "Goals deleted successfully",
        Some(Deleted { count }),
    )))
}

pub async fn active(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.find_active_goals(&user_id, &ctx).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

pub async fn analytics(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<GoalAnalytics>, ServerError> {
    let analytics = state.engine.goal_analytics(&user_id, &ctx).await?;
    Ok(Json(analytics_view(analytics)))
}

/// Window recompute of every goal of the user
pub async fn progress_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state
        .engine
        .update_all_goal_progress_for_user(&user_id, &ctx)
        .await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}
