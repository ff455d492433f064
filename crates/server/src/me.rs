//! Shortcuts acting on the caller's own data.

use api_types::{
    expense::{ExpenseNew, ExpenseView},
    goal::{GoalNew, GoalView},
    user::UserView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::AccessContext;

use crate::{
    ServerError,
    expenses::new_expense,
    goals::new_goal,
    server::ServerState,
    views::{expense_view, goal_view, user_view},
};

pub async fn user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.current_user(&ctx).await?;
    Ok(Json(user_view(user)))
}

pub async fn expenses(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let user_id = ctx.current_user_id()?;
    let expenses = state.engine.list_expenses_for_user(user_id, &ctx).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

/// Any `user_id` in the body is replaced by the caller.
pub async fn expense_new(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Json(mut payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let user_id = ctx.current_user_id()?;
    payload.user_id = Some(user_id.to_string());
    let input = new_expense(payload, None)?;
    let expense = state.engine.create_expense(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn goals(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let user_id = ctx.current_user_id()?;
    let goals = state.engine.list_goals_for_user(user_id, &ctx).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

/// Any `user_id` in the body is replaced by the caller.
pub async fn goal_new(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Json(mut payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let user_id = ctx.current_user_id()?;
    payload.user_id = Some(user_id.to_string());
    let input = new_goal(payload, None)?;
    let goal = state.engine.create_goal(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(goal_view(goal))))
}
