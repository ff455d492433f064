use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, Statement, TransactionTrait, Value, prelude::*,
};

use crate::{
    AccessContext, EngineError, Expense, ExpenseCategory, ExpensePatch, MoneyCents, NewExpense,
    ResultEngine, error::StoreContext, expenses, goals, util::normalize_required_text,
};

use super::{
    DateRange, Engine,
    access::{check_access, resolve_caller},
    users::find_live_user,
    with_tx,
};

/// Which expenses an aggregation runs over.
#[derive(Clone, Copy, Debug)]
pub(super) enum ExpenseScope<'a> {
    User(&'a str),
    Goal(&'a str),
}

/// Sum of live expense amounts in `scope`, optionally narrowed to a window
/// (both ends included) and a category.
pub(super) async fn sum_amount<C: ConnectionTrait>(
    db: &C,
    scope: ExpenseScope<'_>,
    range: Option<DateRange>,
    category: Option<ExpenseCategory>,
) -> ResultEngine<MoneyCents> {
    let mut sql = String::from(
        "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM expenses WHERE deleted_at IS NULL",
    );
    let mut values: Vec<Value> = Vec::new();
    match scope {
        ExpenseScope::User(user_id) => {
            sql.push_str(" AND user_id = ?");
            values.push(user_id.into());
        }
        ExpenseScope::Goal(goal_id) => {
            sql.push_str(" AND goal_id = ?");
            values.push(goal_id.into());
        }
    }
    if let Some(range) = range {
        sql.push_str(" AND date >= ? AND date <= ?");
        values.push(range.start.into());
        values.push(range.end.into());
    }
    if let Some(category) = category {
        sql.push_str(" AND UPPER(category) = ?");
        values.push(category.as_str().into());
    }

    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    let row = db.query_one(stmt).await.store_ctx("sum expenses")?;
    let sum_minor: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
    Ok(MoneyCents::new(sum_minor))
}

async fn find_live_expense<C: ConnectionTrait>(
    db: &C,
    expense_id: &str,
) -> ResultEngine<expenses::Model> {
    expenses::Entity::find_by_id(expense_id.to_string())
        .filter(expenses::Column::DeletedAt.is_null())
        .one(db)
        .await
        .store_ctx("load expense")?
        .ok_or_else(|| EngineError::NotFound(format!("expense {expense_id}")))
}

/// A linked goal must be live and owned by the expense owner.
async fn ensure_goal_link<C: ConnectionTrait>(
    db: &C,
    goal_id: &str,
    user_id: &str,
) -> ResultEngine<()> {
    let goal = goals::Entity::find_by_id(goal_id.to_string())
        .filter(goals::Column::DeletedAt.is_null())
        .one(db)
        .await
        .store_ctx("load linked goal")?;
    match goal {
        Some(goal) if goal.user_id == user_id => Ok(()),
        Some(_) => Err(EngineError::invalid(
            "goal_id",
            "goal belongs to another user",
        )),
        None => Err(EngineError::invalid(
            "goal_id",
            format!("goal '{goal_id}' does not exist"),
        )),
    }
}

fn into_expenses(models: Vec<expenses::Model>) -> ResultEngine<Vec<Expense>> {
    models.into_iter().map(Expense::try_from).collect()
}

impl Engine {
    pub async fn create_expense(
        &self,
        input: NewExpense,
        ctx: &AccessContext,
    ) -> ResultEngine<Expense> {
        let owner = normalize_required_text(&input.user_id, "user_id")?;
        self.validate_access(ctx, &owner).await?;
        let expense = Expense::new(input, Utc::now())?;

        with_tx!(self, |db_tx| {
            find_live_user(&db_tx, &expense.user_id).await?;
            if let Some(goal_id) = expense.goal_id.as_deref() {
                ensure_goal_link(&db_tx, goal_id, &expense.user_id).await?;
            }
            expenses::ActiveModel::from(&expense)
                .insert(&db_tx)
                .await
                .store_ctx("insert expense")?;
            Ok(expense)
        })
    }

    pub async fn expense(&self, expense_id: &str, ctx: &AccessContext) -> ResultEngine<Expense> {
        let caller = resolve_caller(&self.database, ctx).await?;
        let model = find_live_expense(&self.database, expense_id).await?;
        check_access(&caller, &model.user_id)?;
        Expense::try_from(model)
    }

    /// Live expenses of `user_id`, newest first.
    pub async fn list_expenses_for_user(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Expense>> {
        self.validate_access(ctx, user_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .filter(expenses::Column::DeletedAt.is_null())
            .order_by_desc(expenses::Column::Date)
            .all(&self.database)
            .await
            .store_ctx("list expenses")?;
        into_expenses(models)
    }

    /// Every live expense. Admin only.
    pub async fn list_expenses(&self, ctx: &AccessContext) -> ResultEngine<Vec<Expense>> {
        self.require_admin(ctx).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::DeletedAt.is_null())
            .order_by_desc(expenses::Column::Date)
            .all(&self.database)
            .await
            .store_ctx("list expenses")?;
        into_expenses(models)
    }

    pub async fn list_expenses_in_range(
        &self,
        user_id: &str,
        range: DateRange,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Expense>> {
        self.validate_access(ctx, user_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .filter(expenses::Column::DeletedAt.is_null())
            .filter(expenses::Column::Date.gte(range.start))
            .filter(expenses::Column::Date.lte(range.end))
            .order_by_asc(expenses::Column::Date)
            .all(&self.database)
            .await
            .store_ctx("list expenses in range")?;
        into_expenses(models)
    }

    /// Live expenses linked to `goal_id`.
    pub async fn list_expenses_for_goal(
        &self,
        goal_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Expense>> {
        let caller = resolve_caller(&self.database, ctx).await?;
        let goal = super::goals::find_live_goal(&self.database, goal_id).await?;
        check_access(&caller, &goal.user_id)?;

        let models = expenses::Entity::find()
            .filter(expenses::Column::GoalId.eq(goal_id.to_string()))
            .filter(expenses::Column::DeletedAt.is_null())
            .order_by_asc(expenses::Column::Date)
            .all(&self.database)
            .await
            .store_ctx("list goal expenses")?;
        into_expenses(models)
    }

    /// Merge `patch` into the expense and revalidate it.
    ///
    /// The owner cannot change: a different `user_id` in the patch is
    /// `Forbidden`.
    pub async fn update_expense(
        &self,
        expense_id: &str,
        patch: ExpensePatch,
        ctx: &AccessContext,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_expense(&db_tx, expense_id).await?;
            check_access(&caller, &model.user_id)?;

            let mut expense = Expense::try_from(model)?;
            let previous_goal = expense.goal_id.clone();
            expense.apply_patch(patch, Utc::now())?;
            if let Some(goal_id) = expense.goal_id.as_deref()
                && expense.goal_id != previous_goal
            {
                ensure_goal_link(&db_tx, goal_id, &expense.user_id).await?;
            }

            expenses::ActiveModel::from(&expense)
                .update(&db_tx)
                .await
                .store_ctx("update expense")?;
            Ok(expense)
        })
    }

    /// Soft delete.
    pub async fn delete_expense(&self, expense_id: &str, ctx: &AccessContext) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_expense(&db_tx, expense_id).await?;
            check_access(&caller, &model.user_id)?;
            soft_delete(&db_tx, model).await
        })
    }

    /// Soft delete every live expense of `user_id`, one at a time.
    ///
    /// There is no enclosing transaction: a failure stops the loop and the
    /// expenses already deleted stay deleted. Returns how many were deleted.
    pub async fn delete_expenses_for_user(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<u64> {
        self.validate_access(ctx, user_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .filter(expenses::Column::DeletedAt.is_null())
            .all(&self.database)
            .await
            .store_ctx("list expenses")?;

        let mut deleted = 0;
        for model in models {
            soft_delete(&self.database, model).await?;
            deleted += 1;
        }
        tracing::info!(user_id, deleted, "deleted expenses of user");
        Ok(deleted)
    }

    /// Total spent by `user_id` with `date` inside `range`.
    pub async fn sum_by_user_and_range(
        &self,
        user_id: &str,
        range: DateRange,
        ctx: &AccessContext,
    ) -> ResultEngine<MoneyCents> {
        self.validate_access(ctx, user_id).await?;
        sum_amount(&self.database, ExpenseScope::User(user_id), Some(range), None).await
    }

    /// Total linked to `goal_id`, over `range` when given, otherwise over all
    /// time.
    pub async fn sum_by_goal_and_range(
        &self,
        goal_id: &str,
        range: Option<DateRange>,
        ctx: &AccessContext,
    ) -> ResultEngine<MoneyCents> {
        let caller = resolve_caller(&self.database, ctx).await?;
        let goal = super::goals::find_live_goal(&self.database, goal_id).await?;
        check_access(&caller, &goal.user_id)?;
        sum_amount(&self.database, ExpenseScope::Goal(goal_id), range, None).await
    }
}

async fn soft_delete<C: ConnectionTrait>(db: &C, model: expenses::Model) -> ResultEngine<()> {
    let now = Utc::now();
    let mut active: expenses::ActiveModel = model.into();
    active.deleted_at = ActiveValue::Set(Some(now));
    active.updated_at = ActiveValue::Set(now);
    active.update(db).await.store_ctx("delete expense")?;
    Ok(())
}
