//! Savings and spending goals.
//!
//! A goal tracks an accumulated amount against a target over a date window.
//! The `mode` decides how the accumulated amount is read:
//!
//! - `LIMIT`: the target is a ceiling. Reaching it exactly is still fine,
//!   going past it flags the goal as `EXCEEDED`.
//! - `INVESTMENT`: the target is a floor to reach. Reaching it flags the
//!   goal as `SURPASSED`.
//!
//! `completed` is `current >= target` in both modes and is recomputed on
//! every progress update.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseCategory, MoneyCents, Patch, ResultEngine,
    util::{normalize_enum_key, normalize_optional_text, normalize_required_text},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GoalMode {
    #[default]
    Limit,
    Investment,
}

impl GoalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Investment => "INVESTMENT",
        }
    }
}

impl fmt::Display for GoalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalMode {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_enum_key(value).as_deref() {
            Some("LIMIT") => Ok(Self::Limit),
            Some("INVESTMENT") => Ok(Self::Investment),
            _ => Err(EngineError::invalid(
                "mode",
                "invalid mode. Use LIMIT or INVESTMENT",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GoalStatus {
    Active,
    UnderLimit,
    Exceeded,
    Surpassed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::UnderLimit => "UNDER_LIMIT",
            Self::Exceeded => "EXCEEDED",
            Self::Surpassed => "SURPASSED",
        }
    }

    /// Status of a goal holding `current` against `target`.
    pub fn classify(mode: GoalMode, current: MoneyCents, target: MoneyCents) -> Self {
        match mode {
            GoalMode::Limit if current > target => Self::Exceeded,
            GoalMode::Limit => Self::UnderLimit,
            GoalMode::Investment if current >= target => Self::Surpassed,
            GoalMode::Investment => Self::Active,
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_enum_key(value).as_deref() {
            Some("ACTIVE") => Ok(Self::Active),
            Some("UNDER_LIMIT") => Ok(Self::UnderLimit),
            Some("EXCEEDED") => Ok(Self::Exceeded),
            Some("SURPASSED") => Ok(Self::Surpassed),
            _ => Err(EngineError::invalid(
                "status",
                format!(
                    "invalid status '{}'. Use ACTIVE, UNDER_LIMIT, EXCEEDED or SURPASSED",
                    value.trim()
                ),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_amount: MoneyCents,
    pub current_amount: MoneyCents,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: Option<ExpenseCategory>,
    pub mode: GoalMode,
    pub status: GoalStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input of [`Engine::create_goal`](crate::Engine::create_goal).
#[derive(Clone, Debug, Default)]
pub struct NewGoal {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_amount: MoneyCents,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub mode: Option<GoalMode>,
}

/// Partial update of a goal.
///
/// `description` and `category` can be cleared; the rest are only replaced.
/// `mode` and `status` change only when supplied.
#[derive(Clone, Debug, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Patch<String>,
    pub target_amount: Option<MoneyCents>,
    pub current_amount: Option<MoneyCents>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Patch<String>,
    pub mode: Option<GoalMode>,
    pub status: Option<GoalStatus>,
    pub completed: Option<bool>,
}

fn validate_target(target: MoneyCents) -> ResultEngine<MoneyCents> {
    if !target.is_positive() {
        return Err(EngineError::invalid(
            "target_amount",
            "target amount must be positive",
        ));
    }
    if target > MoneyCents::MAX_AMOUNT {
        return Err(EngineError::invalid(
            "target_amount",
            format!("target amount must not exceed {}", MoneyCents::MAX_AMOUNT),
        ));
    }
    Ok(target)
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ResultEngine<()> {
    if end < start {
        return Err(EngineError::invalid(
            "end_date",
            "End date must be after start date",
        ));
    }
    Ok(())
}

fn parse_category(value: Option<&str>) -> ResultEngine<Option<ExpenseCategory>> {
    normalize_optional_text(value)
        .map(|raw| raw.parse::<ExpenseCategory>())
        .transpose()
}

impl Goal {
    pub(crate) fn new(input: NewGoal, now: DateTime<Utc>) -> ResultEngine<Self> {
        let user_id = normalize_required_text(&input.user_id, "user_id")?;
        let title = normalize_required_text(&input.title, "title")?;
        let target_amount = validate_target(input.target_amount)?;
        let start_date = input
            .start_date
            .ok_or_else(|| EngineError::invalid("start_date", "start date is required"))?;
        let end_date = input
            .end_date
            .ok_or_else(|| EngineError::invalid("end_date", "end date is required"))?;
        validate_window(start_date, end_date)?;
        let category = parse_category(input.category.as_deref())?;
        let mode = input.mode.unwrap_or_default();

        let mut goal = Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            description: normalize_optional_text(input.description.as_deref()),
            target_amount,
            current_amount: MoneyCents::ZERO,
            start_date,
            end_date,
            category,
            mode,
            status: GoalStatus::classify(mode, MoneyCents::ZERO, target_amount),
            completed: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        goal.completed = goal.current_amount >= goal.target_amount;
        Ok(goal)
    }

    /// Store a freshly aggregated amount and reclassify.
    pub(crate) fn apply_progress(&mut self, current: MoneyCents, now: DateTime<Utc>) {
        self.current_amount = current;
        self.status = GoalStatus::classify(self.mode, current, self.target_amount);
        self.completed = current >= self.target_amount;
        self.updated_at = now;
    }

    pub(crate) fn apply_patch(&mut self, patch: GoalPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        if let Some(title) = patch.title {
            self.title = normalize_required_text(&title, "title")?;
        }
        self.description = patch
            .description
            .apply(self.description.take())
            .and_then(|d| normalize_optional_text(Some(&d)));
        if let Some(target) = patch.target_amount {
            self.target_amount = validate_target(target)?;
        }
        if let Some(current) = patch.current_amount {
            if current < MoneyCents::ZERO {
                return Err(EngineError::invalid(
                    "current_amount",
                    "current amount must not be negative",
                ));
            }
            self.current_amount = current;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        validate_window(self.start_date, self.end_date)?;
        match patch.category {
            Patch::Keep => {}
            Patch::Clear => self.category = None,
            Patch::Set(raw) => self.category = parse_category(Some(&raw))?,
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Not completed and `now` strictly inside the window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.start_date < now && now < self.end_date
    }

    pub fn remaining_amount(&self) -> MoneyCents {
        self.target_amount - self.current_amount
    }

    pub fn progress_percent(&self) -> f64 {
        self.current_amount.percent_of(self.target_amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub category: Option<String>,
    pub mode: String,
    pub status: String,
    pub completed: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            category: parse_category(model.category.as_deref())?,
            mode: model.mode.parse()?,
            status: model.status.parse()?,
            target_amount: MoneyCents::new(model.target_amount_minor),
            current_amount: MoneyCents::new(model.current_amount_minor),
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            start_date: model.start_date,
            end_date: model.end_date,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        })
    }
}

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.clone()),
            user_id: ActiveValue::Set(goal.user_id.clone()),
            title: ActiveValue::Set(goal.title.clone()),
            description: ActiveValue::Set(goal.description.clone()),
            target_amount_minor: ActiveValue::Set(goal.target_amount.cents()),
            current_amount_minor: ActiveValue::Set(goal.current_amount.cents()),
            start_date: ActiveValue::Set(goal.start_date),
            end_date: ActiveValue::Set(goal.end_date),
            category: ActiveValue::Set(goal.category.map(|c| c.as_str().to_string())),
            mode: ActiveValue::Set(goal.mode.as_str().to_string()),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            completed: ActiveValue::Set(goal.completed),
            created_at: ActiveValue::Set(goal.created_at),
            updated_at: ActiveValue::Set(goal.updated_at),
            deleted_at: ActiveValue::Set(goal.deleted_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn input(mode: GoalMode) -> NewGoal {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        NewGoal {
            user_id: "alice".to_string(),
            title: "Food budget".to_string(),
            description: None,
            target_amount: MoneyCents::new(10_000),
            start_date: Some(start),
            end_date: Some(start + Duration::days(30)),
            category: Some("food".to_string()),
            mode: Some(mode),
        }
    }

    #[test]
    fn classify_limit_boundary_is_under_limit() {
        let target = MoneyCents::new(10_000);
        assert_eq!(
            GoalStatus::classify(GoalMode::Limit, target, target),
            GoalStatus::UnderLimit
        );
        assert_eq!(
            GoalStatus::classify(GoalMode::Limit, MoneyCents::new(10_001), target),
            GoalStatus::Exceeded
        );
    }

    #[test]
    fn classify_investment_boundary_is_surpassed() {
        let target = MoneyCents::new(10_000);
        assert_eq!(
            GoalStatus::classify(GoalMode::Investment, target, target),
            GoalStatus::Surpassed
        );
        assert_eq!(
            GoalStatus::classify(GoalMode::Investment, MoneyCents::new(9_999), target),
            GoalStatus::Active
        );
    }

    #[test]
    fn new_goal_starts_from_zero() {
        let goal = Goal::new(input(GoalMode::Limit), Utc::now()).unwrap();
        assert_eq!(goal.current_amount, MoneyCents::ZERO);
        assert_eq!(goal.status, GoalStatus::UnderLimit);
        assert!(!goal.completed);
        assert_eq!(goal.category, Some(ExpenseCategory::Food));

        let goal = Goal::new(input(GoalMode::Investment), Utc::now()).unwrap();
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn new_rejects_reversed_window() {
        let mut bad = input(GoalMode::Limit);
        bad.end_date = bad.start_date.map(|s| s - Duration::days(1));
        let err = Goal::new(bad, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { field: "end_date", .. }));
        assert!(err.to_string().contains("End date must be after start date"));
    }

    #[test]
    fn new_rejects_target_above_ceiling() {
        let mut bad = input(GoalMode::Limit);
        bad.target_amount = MoneyCents::new(i64::MAX / 2 + 1);
        assert!(matches!(
            Goal::new(bad, Utc::now()),
            Err(EngineError::InvalidArgument { field: "target_amount", .. })
        ));
    }

    #[test]
    fn new_rejects_zero_target_and_blank_title() {
        let mut bad = input(GoalMode::Limit);
        bad.target_amount = MoneyCents::ZERO;
        assert!(Goal::new(bad, Utc::now()).is_err());

        let mut bad = input(GoalMode::Limit);
        bad.title = " ".to_string();
        assert!(matches!(
            Goal::new(bad, Utc::now()),
            Err(EngineError::InvalidArgument { field: "title", .. })
        ));
    }

    #[test]
    fn progress_recomputes_completed_both_ways() {
        let mut goal = Goal::new(input(GoalMode::Limit), Utc::now()).unwrap();
        goal.apply_progress(MoneyCents::new(11_000), Utc::now());
        assert_eq!(goal.status, GoalStatus::Exceeded);
        assert!(goal.completed);

        goal.apply_progress(MoneyCents::new(5_000), Utc::now());
        assert_eq!(goal.status, GoalStatus::UnderLimit);
        assert!(!goal.completed);
        assert_eq!(goal.remaining_amount(), MoneyCents::new(5_000));
        assert_eq!(goal.progress_percent(), 50.0);
    }

    #[test]
    fn patch_keeps_mode_and_clears_category() {
        let mut goal = Goal::new(input(GoalMode::Investment), Utc::now()).unwrap();
        let patch = GoalPatch {
            title: Some("Savings".to_string()),
            category: Patch::Clear,
            ..GoalPatch::default()
        };
        goal.apply_patch(patch, Utc::now()).unwrap();
        assert_eq!(goal.title, "Savings");
        assert_eq!(goal.mode, GoalMode::Investment);
        assert_eq!(goal.category, None);
    }

    #[test]
    fn active_window_is_exclusive() {
        let goal = Goal::new(input(GoalMode::Limit), Utc::now()).unwrap();
        assert!(!goal.is_active_at(goal.start_date));
        assert!(goal.is_active_at(goal.start_date + Duration::days(1)));
        assert!(!goal.is_active_at(goal.end_date));
    }

    #[test]
    fn mode_rejects_unknown() {
        assert_eq!("investment".parse::<GoalMode>().unwrap(), GoalMode::Investment);
        let err = "savings".parse::<GoalMode>().unwrap_err();
        assert!(err.to_string().contains("LIMIT or INVESTMENT"));
    }
}
