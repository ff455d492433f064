use chrono::{DateTime, Utc};
use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};

/// Deserialize a nullable field keeping "absent" and "null" apart.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: a missing
/// key stays `None`, `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a number or a string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
        if !value.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        Ok(value.to_string())
    }
}

/// Read a decimal amount (`50`, `10.5` or `"10,50"`) as its text.
///
/// The engine parses the text, so the two-decimals rule and the error
/// message live in one place.
pub fn decimal<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DecimalVisitor)
}

/// Optional form of [`decimal`], for use with `#[serde(default)]`.
pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    decimal(deserializer).map(Some)
}

/// Envelope for responses that carry a human message next to the payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Role {
        #[default]
        User,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    /// Only the keys present in the body are changed.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub password: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub role: Option<Role>,
    }

    /// Public view of a user. The password never leaves the server.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: String,
        pub name: String,
        pub email: String,
        pub role: Role,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    /// `token` is the value to send back in the `X-User-Id` header.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        pub user: user::UserView,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Defaults to the caller when omitted.
        pub user_id: Option<String>,
        pub description: String,
        /// Decimal, must be > 0 with at most two decimals.
        #[serde(deserialize_with = "decimal")]
        pub amount: String,
        /// One of `FOOD`, `TRAVEL`, `UTILITIES`, `HOUSING`, `TRANSPORTATION`,
        /// `ENTERTAINMENT`, `GENERAL`, `OTHER` (case-insensitive).
        pub category: String,
        /// `MM/dd/yyyy`, read as start of day UTC.
        pub date: Option<String>,
        pub goal_id: Option<String>,
    }

    /// Partial update. `goal_id: null` unlinks the expense.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        /// Accepted only when equal to the current owner.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(
            default,
            deserialize_with = "optional_decimal",
            skip_serializing_if = "Option::is_none"
        )]
        pub amount: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        /// `MM/dd/yyyy`.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub date: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub goal_id: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: String,
        pub user_id: String,
        pub description: String,
        pub amount_minor: i64,
        pub category: String,
        pub date: DateTime<Utc>,
        pub goal_id: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string of the `total` routes, both `MM/dd/yyyy`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RangeQuery {
        pub start: Option<String>,
        pub end: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Total {
        pub total_minor: i64,
    }
}

pub mod goal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum GoalStatus {
        Active,
        UnderLimit,
        Exceeded,
        Surpassed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        /// Defaults to the caller when omitted.
        pub user_id: Option<String>,
        pub title: String,
        pub description: Option<String>,
        /// Decimal, must be > 0.
        #[serde(deserialize_with = "decimal")]
        pub target_amount: String,
        /// `MM/dd/yyyy`.
        pub start_date: Option<String>,
        /// `MM/dd/yyyy`, not before `start_date`.
        pub end_date: Option<String>,
        pub category: Option<String>,
        /// `LIMIT` (default) or `INVESTMENT`.
        pub mode: Option<String>,
    }

    /// Partial update. `description: null` and `category: null` clear the
    /// field.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub description: Option<Option<String>>,
        #[serde(
            default,
            deserialize_with = "optional_decimal",
            skip_serializing_if = "Option::is_none"
        )]
        pub target_amount: Option<String>,
        #[serde(
            default,
            deserialize_with = "optional_decimal",
            skip_serializing_if = "Option::is_none"
        )]
        pub current_amount: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub category: Option<Option<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<GoalStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub completed: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: String,
        pub user_id: String,
        pub title: String,
        pub description: Option<String>,
        pub target_amount_minor: i64,
        pub current_amount_minor: i64,
        pub remaining_amount_minor: i64,
        /// `current / target * 100`, two decimals.
        pub progress_percent: f64,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub category: Option<String>,
        pub mode: String,
        pub status: GoalStatus,
        pub completed: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct GoalAnalytics {
        pub total_goals: u64,
        pub completed_goals: u64,
        pub active_goals: u64,
        pub total_target_amount_minor: i64,
        pub total_current_amount_minor: i64,
    }
}

/// Result of the "delete everything of a user" routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub count: u64,
}
