//! Engine records to API views.

use api_types::{
    expense::ExpenseView,
    goal::{GoalAnalytics, GoalStatus, GoalView},
    user::{Role, UserView},
};

pub(crate) fn role_to_api(role: engine::Role) -> Role {
    match role {
        engine::Role::User => Role::User,
        engine::Role::Admin => Role::Admin,
    }
}

pub(crate) fn role_from_api(role: Role) -> engine::Role {
    match role {
        Role::User => engine::Role::User,
        Role::Admin => engine::Role::Admin,
    }
}

pub(crate) fn status_from_api(status: GoalStatus) -> engine::GoalStatus {
    match status {
        GoalStatus::Active => engine::GoalStatus::Active,
        GoalStatus::UnderLimit => engine::GoalStatus::UnderLimit,
        GoalStatus::Exceeded => engine::GoalStatus::Exceeded,
        GoalStatus::Surpassed => engine::GoalStatus::Surpassed,
    }
}

fn status_to_api(status: engine::GoalStatus) -> GoalStatus {
    match status {
        engine::GoalStatus::Active => GoalStatus::Active,
        engine::GoalStatus::UnderLimit => GoalStatus::UnderLimit,
        engine::GoalStatus::Exceeded => GoalStatus::Exceeded,
        engine::GoalStatus::Surpassed => GoalStatus::Surpassed,
    }
}

pub(crate) fn user_view(user: engine::User) -> UserView {
    UserView {
        role: role_to_api(user.role),
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(crate) fn expense_view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        amount_minor: expense.amount.cents(),
        category: expense.category.to_string(),
        id: expense.id,
        user_id: expense.user_id,
        description: expense.description,
        date: expense.date,
        goal_id: expense.goal_id,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub(crate) fn goal_view(goal: engine::Goal) -> GoalView {
    GoalView {
        remaining_amount_minor: goal.remaining_amount().cents(),
        progress_percent: goal.progress_percent(),
        target_amount_minor: goal.target_amount.cents(),
        current_amount_minor: goal.current_amount.cents(),
        category: goal.category.map(|c| c.to_string()),
        mode: goal.mode.to_string(),
        status: status_to_api(goal.status),
        id: goal.id,
        user_id: goal.user_id,
        title: goal.title,
        description: goal.description,
        start_date: goal.start_date,
        end_date: goal.end_date,
        completed: goal.completed,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

pub(crate) fn analytics_view(analytics: engine::GoalAnalytics) -> GoalAnalytics {
    GoalAnalytics {
        total_goals: analytics.total_goals,
        completed_goals: analytics.completed_goals,
        active_goals: analytics.active_goals,
        total_target_amount_minor: analytics.total_target_amount.cents(),
        total_current_amount_minor: analytics.total_current_amount.cents(),
    }
}
