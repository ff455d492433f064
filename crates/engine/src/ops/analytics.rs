use chrono::{DateTime, Utc};

use crate::{AccessContext, EngineError, Goal, MoneyCents, ResultEngine};

use super::{Engine, goals::live_goals_of};

/// Roll-up of a user's live goals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GoalAnalytics {
    pub total_goals: u64,
    pub completed_goals: u64,
    pub active_goals: u64,
    pub total_target_amount: MoneyCents,
    pub total_current_amount: MoneyCents,
}

impl GoalAnalytics {
    fn from_goals(goals: &[Goal], now: DateTime<Utc>) -> ResultEngine<Self> {
        goals.iter().try_fold(Self::default(), |mut acc, goal| {
            acc.total_goals += 1;
            if goal.completed {
                acc.completed_goals += 1;
            }
            if goal.is_active_at(now) {
                acc.active_goals += 1;
            }
            acc.total_target_amount = add_total(
                acc.total_target_amount,
                goal.target_amount,
                "target_amount",
            )?;
            acc.total_current_amount = add_total(
                acc.total_current_amount,
                goal.current_amount,
                "current_amount",
            )?;
            Ok(acc)
        })
    }
}

fn add_total(total: MoneyCents, amount: MoneyCents, field: &'static str) -> ResultEngine<MoneyCents> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::invalid(field, "total of goal amounts is too large"))
}

impl Engine {
    /// Aggregate the persisted state of the user's goals. Read only.
    pub async fn goal_analytics(
        &self,
        user_id: &str,
        ctx: &AccessContext,
    ) -> ResultEngine<GoalAnalytics> {
        self.validate_access(ctx, user_id).await?;
        let goals = live_goals_of(&self.database, user_id)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        GoalAnalytics::from_goals(&goals, Utc::now())
    }
}
