//! Fixed set of expense categories.

use std::{fmt, str::FromStr};

use crate::{EngineError, util::normalize_enum_key};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    Food,
    Travel,
    Utilities,
    Housing,
    Transportation,
    Entertainment,
    General,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 8] = [
        Self::Food,
        Self::Travel,
        Self::Utilities,
        Self::Housing,
        Self::Transportation,
        Self::Entertainment,
        Self::General,
        Self::Other,
    ];

    /// Canonical stored form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Travel => "TRAVEL",
            Self::Utilities => "UTILITIES",
            Self::Housing => "HOUSING",
            Self::Transportation => "TRANSPORTATION",
            Self::Entertainment => "ENTERTAINMENT",
            Self::General => "GENERAL",
            Self::Other => "OTHER",
        }
    }

    /// Human list used in error messages: `food, travel, ...`.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str().to_lowercase().replace('_', " "))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = EngineError;

    /// Case and space insensitive: `" food"`, `"Food"` and `"FOOD"` all match.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_enum_key(value)
            .ok_or_else(|| EngineError::invalid("category", "category is required"))?;
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| {
                EngineError::invalid(
                    "category",
                    format!(
                        "invalid category '{}'. Allowed: {}",
                        value.trim(),
                        Self::allowed_list()
                    ),
                )
            })
    }
}
