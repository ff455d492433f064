use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AccessContext, EngineError, Goal, GoalPatch, NewGoal, ResultEngine, error::StoreContext,
    goals, util::normalize_required_text,
};

use super::{
    DateRange, Engine,
    access::{check_access, resolve_caller},
    expenses::{ExpenseScope, sum_amount},
    users::find_live_user,
    with_tx,
};

pub(super) async fn find_live_goal<C: ConnectionTrait>(
    db: &C,
    goal_id: &str,
) -> ResultEngine<goals::Model> {
    goals::Entity::find_by_id(goal_id.to_string())
        .filter(goals::Column::DeletedAt.is_null())
        .one(db)
        .await
        .store_ctx("load goal")?
        .ok_or_else(|| EngineError::NotFound(format!("goal {goal_id}")))
}

pub(super) async fn live_goals_of<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<goals::Model>> {
    goals::Entity::find()
        .filter(goals::Column::UserId.eq(user_id.to_string()))
        .filter(goals::Column::DeletedAt.is_null())
        .order_by_asc(goals::Column::CreatedAt)
        .all(db)
        .await
        .store_ctx("list goals")
}

fn window(goal: &Goal) -> DateRange {
    DateRange {
        start: goal.start_date,
        end: goal.end_date,
    }
}

/// Window recompute: every expense of the owner inside the goal window,
/// narrowed to the goal category when it has one. Goal links are ignored.
async fn recompute_window<C: ConnectionTrait>(db: &C, goal: &mut Goal) -> ResultEngine<()> {
    let current = sum_amount(
        db,
        ExpenseScope::User(&goal.user_id),
        Some(window(goal)),
        goal.category,
    )
    .await?;
    goal.apply_progress(current, Utc::now());
    goals::ActiveModel::from(&*goal)
        .update(db)
        .await
        .store_ctx("update goal progress")?;
    tracing::debug!(
        goal_id = %goal.id,
        current = goal.current_amount.cents(),
        status = %goal.status,
        "goal progress recomputed"
    );
    Ok(())
}

async fn soft_delete<C: ConnectionTrait>(db: &C, model: goals::Model) -> ResultEngine<()> {
    let now = Utc::now();
    let mut active: goals::ActiveModel = model.into();
    active.deleted_at = ActiveValue::Set(Some(now));
    active.updated_at = ActiveValue::Set(now);
    active.update(db).await.store_ctx("delete goal")?;
    Ok(())
}

fn into_goals(models: Vec<goals::Model>) -> ResultEngine<Vec<Goal>> {
    models.into_iter().map(Goal::try_from).collect()
}

impl Engine {
    /// Create a goal with `current = 0`, classified from its mode.
    pub async fn create_goal(&self, input: NewGoal, ctx: &AccessContext) -> ResultEngine<Goal> {
        let owner = normalize_required_text(&input.user_id, "user_id")?;
        self.validate_access(ctx, &owner).await?;
        let goal = Goal::new(input, Utc::now())?;

        with_tx!(self, |db_tx| {
            find_live_user(&db_tx, &goal.user_id).await?;
            goals::ActiveModel::from(&goal)
                .insert(&db_tx)
                .await
                .store_ctx("insert goal")?;
            Ok(goal)
        })
    }

    pub async fn goal(&self, goal_id: &str, ctx: &AccessContext) -> ResultEngine<Goal> {
        let caller = resolve_caller(&self.database, ctx).await?;
        let model = find_live_goal(&self.database, goal_id).await?;
        check_access(&caller, &model.user_id)?;
        Goal::try_from(model)
    }

    pub async fn list_goals_for_user(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Goal>> {
        self.validate_access(ctx, user_id).await?;
        into_goals(live_goals_of(&self.database, user_id).await?)
    }

    /// Every live goal. Admin only.
    pub async fn list_goals(&self, ctx: &AccessContext) -> ResultEngine<Vec<Goal>> {
        self.require_admin(ctx).await?;
        let models = goals::Entity::find()
            .filter(goals::Column::DeletedAt.is_null())
            .order_by_asc(goals::Column::CreatedAt)
            .all(&self.database)
            .await
            .store_ctx("list goals")?;
        into_goals(models)
    }

    /// Goals not completed whose window strictly contains now.
    pub async fn find_active_goals(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Goal>> {
        self.validate_access(ctx, user_id).await?;
        let now = Utc::now();
        let goals = into_goals(live_goals_of(&self.database, user_id).await?)?;
        Ok(goals.into_iter().filter(|g| g.is_active_at(now)).collect())
    }

    /// Merge `patch` into the goal and revalidate it. Status is not
    /// recomputed here.
    pub async fn update_goal(
        &self,
        goal_id: &str,
        patch: GoalPatch,
        ctx: &AccessContext,
    ) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_goal(&db_tx, goal_id).await?;
            check_access(&caller, &model.user_id)?;

            let mut goal = Goal::try_from(model)?;
            goal.apply_patch(patch, Utc::now())?;
            goals::ActiveModel::from(&goal)
                .update(&db_tx)
                .await
                .store_ctx("update goal")?;
            Ok(goal)
        })
    }

    /// Soft delete. Linked expenses keep their `goal_id`.
    pub async fn delete_goal(&self, goal_id: &str, ctx: &AccessContext) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_goal(&db_tx, goal_id).await?;
            check_access(&caller, &model.user_id)?;
            soft_delete(&db_tx, model).await
        })
    }

    /// Soft delete every live goal of `user_id`, one at a time and without an
    /// enclosing transaction. Returns how many were deleted.
    pub async fn delete_goals_for_user(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<u64> {
        self.validate_access(ctx, user_id).await?;
        let models = live_goals_of(&self.database, user_id).await?;

        let mut deleted = 0;
        for model in models {
            soft_delete(&self.database, model).await?;
            deleted += 1;
        }
        tracing::info!(user_id, deleted, "deleted goals of user");
        Ok(deleted)
    }

    /// Recompute `current_amount` from the owner's expenses inside the goal
    /// window (and category, if set), then reclassify.
    pub async fn update_goal_progress(
        &self,
        goal_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_goal(&db_tx, goal_id).await?;
            check_access(&caller, &model.user_id)?;

            let mut goal = Goal::try_from(model)?;
            recompute_window(&db_tx, &mut goal).await?;
            Ok(goal)
        })
    }

    /// Window recompute over every live goal of `user_id`.
    pub async fn update_all_goal_progress_for_user(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<Vec<Goal>> {
        self.validate_access(ctx, user_id).await?;

        with_tx!(self, |db_tx| {
            let mut goals = into_goals(live_goals_of(&db_tx, user_id).await?)?;
            for goal in &mut goals {
                recompute_window(&db_tx, goal).await?;
            }
            Ok(goals)
        })
    }

    /// Recompute `current_amount` from the expenses linked to the goal inside
    /// its window, then reclassify. Running it twice yields the same amount and
    /// status.
    pub async fn sync_goal(&self, goal_id: &str, ctx: &AccessContext) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let caller = resolve_caller(&db_tx, ctx).await?;
            let model = find_live_goal(&db_tx, goal_id).await?;
            check_access(&caller, &model.user_id)?;

            let mut goal = Goal::try_from(model)?;
            let current = sum_amount(
                &db_tx,
                ExpenseScope::Goal(&goal.id),
                Some(window(&goal)),
                None,
            )
            .await?;
            goal.apply_progress(current, Utc::now());
            goals::ActiveModel::from(&goal)
                .update(&db_tx)
                .await
                .store_ctx("sync goal")?;
            Ok(goal)
        })
    }
}
