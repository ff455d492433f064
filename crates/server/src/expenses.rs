//! Expense API endpoints

use api_types::{
    ApiResponse, Deleted,
    expense::{ExpenseNew, ExpenseUpdate, ExpenseView, RangeQuery, Total},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{AccessContext, ExpensePatch, MoneyCents, NewExpense, Patch};

use crate::{
    ServerError,
    dates::{parse_optional_date, parse_optional_range, parse_range},
    server::ServerState,
    views::expense_view,
};

/// Build the engine input, defaulting the owner to `default_user_id`.
pub(crate) fn new_expense(
    payload: ExpenseNew,
    default_user_id: Option<&str>,
) -> Result<NewExpense, ServerError> {
    Ok(NewExpense {
        user_id: payload
            .user_id
            .or_else(|| default_user_id.map(ToString::to_string))
            .unwrap_or_default(),
        description: payload.description,
        amount: MoneyCents::parse_decimal(&payload.amount, "amount")?,
        category: payload.category,
        date: parse_optional_date(payload.date.as_deref())?,
        goal_id: payload.goal_id,
    })
}

/// Handle requests for listing every expense (admin only)
pub async fn list(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.list_expenses(&ctx).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

/// Handle requests for creating a new expense
pub async fn expense_new(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let caller = ctx.current_user_id().ok().map(ToString::to_string);
    let input = new_expense(payload, caller.as_deref())?;
    let expense = state.engine.create_expense(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn get(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(&id, &ctx).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn update(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let patch = ExpensePatch {
        user_id: payload.user_id,
        description: payload.description,
        amount: payload
            .amount
            .map(|amount| MoneyCents::parse_decimal(&amount, "amount"))
            .transpose()?,
        category: payload.category,
        date: parse_optional_date(payload.date.as_deref())?,
        goal_id: Patch::from(payload.goal_id),
    };
    let expense = state.engine.update_expense(&id, patch, &ctx).await?;
    Ok(Json(expense_view(expense)))
}

/// Soft delete
pub async fn delete(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.delete_expense(&id, &ctx).await?;
    Ok(Json(ApiResponse::new("Expense deleted successfully", None)))
}

pub async fn list_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.list_expenses_for_user(&user_id, &ctx).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn delete_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, ServerError> {
    let count = state
        .engine
        .delete_expenses_for_user(&user_id, &ctx)
        .await?;
    Ok(Json(ApiResponse::new(
        "Expenses deleted successfully",
        Some(Deleted { count }),
    )))
}

/// `?start=MM/dd/yyyy&end=MM/dd/yyyy`, both required
pub async fn total_for_user(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Total>, ServerError> {
    let range = parse_range(query.start.as_deref(), query.end.as_deref())?;
    let total = state
        .engine
        .sum_by_user_and_range(&user_id, range, &ctx)
        .await?;
    Ok(Json(Total {
        total_minor: total.cents(),
    }))
}

pub async fn list_for_goal(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.list_expenses_for_goal(&goal_id, &ctx).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

/// Without a range, sums every linked expense.
pub async fn total_for_goal(
    Extension(ctx): Extension<AccessContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Total>, ServerError> {
    let range = parse_optional_range(query.start.as_deref(), query.end.as_deref())?;
    let total = state
        .engine
        .sum_by_goal_and_range(&goal_id, range, &ctx)
        .await?;
    Ok(Json(Total {
        total_minor: total.cents(),
    }))
}
