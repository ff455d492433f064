pub use access::AccessContext;
pub use category::ExpenseCategory;
pub use error::EngineError;
pub use expenses::{Expense, ExpensePatch, NewExpense};
pub use goals::{Goal, GoalMode, GoalPatch, GoalStatus, NewGoal};
pub use money::MoneyCents;
pub use ops::{DateRange, Engine, EngineBuilder, GoalAnalytics};
pub use patch::Patch;
pub use users::{NewUser, Role, User, UserPatch};

mod access;
mod category;
mod error;
mod expenses;
mod goals;
mod money;
mod ops;
mod patch;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
