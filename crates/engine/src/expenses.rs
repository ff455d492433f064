//! Expense records.
//!
//! An `Expense` is a single spend by a user, optionally linked to one of
//! that user's goals.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseCategory, MoneyCents, Patch, ResultEngine,
    util::{normalize_optional_text, normalize_required_text},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub category: ExpenseCategory,
    pub date: DateTime<Utc>,
    pub goal_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input of [`Engine::create_expense`](crate::Engine::create_expense).
///
/// `category` is the raw label as typed by the user; `date` is optional here
/// only so a missing value surfaces as a field error.
#[derive(Clone, Debug, Default)]
pub struct NewExpense {
    pub user_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub category: String,
    pub date: Option<DateTime<Utc>>,
    pub goal_id: Option<String>,
}

/// Partial update of an expense.
///
/// `user_id` is accepted only to reject ownership changes.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub user_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<MoneyCents>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub goal_id: Patch<String>,
}

pub(crate) fn validate_amount(amount: MoneyCents) -> ResultEngine<MoneyCents> {
    if !amount.is_positive() {
        return Err(EngineError::invalid("amount", "amount must be positive"));
    }
    if amount > MoneyCents::MAX_AMOUNT {
        return Err(EngineError::invalid(
            "amount",
            format!("amount must not exceed {}", MoneyCents::MAX_AMOUNT),
        ));
    }
    Ok(amount)
}

impl Expense {
    /// Validate a creation request and build the record.
    pub(crate) fn new(input: NewExpense, now: DateTime<Utc>) -> ResultEngine<Self> {
        let user_id = normalize_required_text(&input.user_id, "user_id")?;
        let description = normalize_required_text(&input.description, "description")?;
        let amount = validate_amount(input.amount)?;
        let category = input.category.parse::<ExpenseCategory>()?;
        let date = input
            .date
            .ok_or_else(|| EngineError::invalid("date", "date is required"))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            description,
            amount,
            category,
            date,
            goal_id: normalize_optional_text(input.goal_id.as_deref()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Merge a patch into the record, revalidating every touched field.
    ///
    /// Ownership is immutable: a different `user_id` is refused.
    pub(crate) fn apply_patch(&mut self, patch: ExpensePatch, now: DateTime<Utc>) -> ResultEngine<()> {
        if let Some(user_id) = patch.user_id.as_deref()
            && user_id.trim() != self.user_id
        {
            return Err(EngineError::Forbidden(
                "Cannot change expense ownership".to_string(),
            ));
        }
        if let Some(description) = patch.description {
            self.description = normalize_required_text(&description, "description")?;
        }
        if let Some(amount) = patch.amount {
            self.amount = validate_amount(amount)?;
        }
        if let Some(category) = patch.category {
            self.category = category.parse()?;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        self.goal_id = patch
            .goal_id
            .apply(self.goal_id.take())
            .and_then(|id| normalize_optional_text(Some(&id)));
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub date: DateTimeUtc,
    pub goal_id: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Goal,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            category: model.category.parse()?,
            amount: MoneyCents::new(model.amount_minor),
            id: model.id,
            user_id: model.user_id,
            description: model.description,
            date: model.date,
            goal_id: model.goal_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        })
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.clone()),
            user_id: ActiveValue::Set(expense.user_id.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            date: ActiveValue::Set(expense.date),
            goal_id: ActiveValue::Set(expense.goal_id.clone()),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
            deleted_at: ActiveValue::Set(expense.deleted_at),
        }
    }
}
