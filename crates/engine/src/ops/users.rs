use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AccessContext, EngineError, NewUser, ResultEngine, Role, User, UserPatch,
    error::StoreContext, users, util::normalize_required_text,
};

use super::{Engine, with_tx};

/// Emails are stored lowercased; the unique index on `users.email` backs
/// the case-insensitive uniqueness.
fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required_text(value, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(EngineError::invalid("email", "email must contain '@'"));
    }
    Ok(email)
}

/// A concurrent writer can still claim the email between the check and the
/// write; the unique index turns that into a conflict.
fn write_error(err: DbErr, email: Option<&str>, context: &str) -> EngineError {
    match (err.sql_err(), email) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(email)) => {
            EngineError::Conflict(email.to_string())
        }
        _ => EngineError::StoreUnavailable {
            context: context.to_string(),
            source: err,
        },
    }
}

fn normalize_password(value: &str) -> ResultEngine<String> {
    if value.trim().is_empty() {
        return Err(EngineError::invalid("password", "password is required"));
    }
    Ok(value.to_string())
}

pub(super) async fn find_live_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<users::Model> {
    users::Entity::find_by_id(user_id.to_string())
        .filter(users::Column::DeletedAt.is_null())
        .one(db)
        .await
        .store_ctx("load user")?
        .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
}

/// Deleted users keep their email reserved.
async fn email_taken<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except_id: Option<&str>,
) -> ResultEngine<bool> {
    let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
    if let Some(id) = except_id {
        query = query.filter(users::Column::Id.ne(id.to_string()));
    }
    let found = query.one(db).await.store_ctx("check email")?;
    Ok(found.is_some())
}

impl Engine {
    /// Open registration. New users always get the `USER` role.
    pub async fn register_user(&self, input: NewUser) -> ResultEngine<User> {
        let name = normalize_required_text(&input.name, "name")?;
        let email = normalize_email(&input.email)?;
        let password = normalize_password(&input.password)?;

        with_tx!(self, |db_tx| {
            if email_taken(&db_tx, &email, None).await? {
                return Err(EngineError::Conflict(email));
            }

            let now = Utc::now();
            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email.clone()),
                password: ActiveValue::Set(password),
                role: ActiveValue::Set(Role::User.as_str().to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                deleted_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| write_error(err, Some(&email), "insert user"))?;
            User::try_from(model)
        })
    }

    /// Match email (case-insensitive) and password among live users.
    ///
    /// The returned user's id is the identity callers present afterwards.
    pub async fn login(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.database)
            .await
            .store_ctx("load user by email")?;
        match model {
            Some(model) if model.password == password => User::try_from(model),
            _ => Err(EngineError::Unauthenticated(
                "invalid email or password".to_string(),
            )),
        }
    }

    pub async fn user(&self, user_id: &str, ctx: &AccessContext) -> ResultEngine<User> {
        self.validate_access(ctx, user_id).await?;
        let model = find_live_user(&self.database, user_id).await?;
        User::try_from(model)
    }

    /// Every live user. Admin only.
    pub async fn list_users(&self, ctx: &AccessContext) -> ResultEngine<Vec<User>> {
        self.require_admin(ctx).await?;
        let models = users::Entity::find()
            .filter(users::Column::DeletedAt.is_null())
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.database)
            .await
            .store_ctx("list users")?;
        models.into_iter().map(User::try_from).collect()
    }

    /// Merge `patch` into the user. Changing the role needs an admin caller.
    pub async fn update_user(
        &self,
        user_id: &str,
        patch: UserPatch,
        ctx: &AccessContext,
    ) -> ResultEngine<User> {
        let caller = self.validate_access(ctx, user_id).await?;

        with_tx!(self, |db_tx| {
            let model = find_live_user(&db_tx, user_id).await?;
            let current_role: Role = model.role.parse()?;
            let mut active: users::ActiveModel = model.into();
            let mut new_email = None;

            if let Some(name) = patch.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_text(name, "name")?);
            }
            if let Some(email) = patch.email.as_deref() {
                let email = normalize_email(email)?;
                if email_taken(&db_tx, &email, Some(user_id)).await? {
                    return Err(EngineError::Conflict(email));
                }
                active.email = ActiveValue::Set(email.clone());
                new_email = Some(email);
            }
            if let Some(password) = patch.password.as_deref() {
                active.password = ActiveValue::Set(normalize_password(password)?);
            }
            if let Some(role) = patch.role
                && role != current_role
            {
                if !caller.role.is_admin() {
                    return Err(EngineError::Forbidden(
                        "only admins can change roles".to_string(),
                    ));
                }
                active.role = ActiveValue::Set(role.as_str().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| write_error(err, new_email.as_deref(), "update user"))?;
            User::try_from(model)
        })
    }

    /// Soft delete. Expenses and goals of the user are left alone.
    pub async fn delete_user(&self, user_id: &str, ctx: &AccessContext) -> ResultEngine<()> {
        self.validate_access(ctx, user_id).await?;

        with_tx!(self, |db_tx| {
            let model = find_live_user(&db_tx, user_id).await?;
            let now = Utc::now();
            let mut active: users::ActiveModel = model.into();
            active.deleted_at = ActiveValue::Set(Some(now));
            active.updated_at = ActiveValue::Set(now);
            active.update(&db_tx).await.store_ctx("delete user")?;
            Ok(())
        })
    }

    /// Set the role of the live user owning `email`.
    ///
    /// Operator tooling only: there is no caller check.
    pub async fn assign_role(&self, email: &str, role: Role) -> ResultEngine<User> {
        let email = normalize_email(email)?;

        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await
                .store_ctx("load user by email")?
                .ok_or_else(|| EngineError::NotFound(format!("user {email}")))?;

            let mut active: users::ActiveModel = model.into();
            active.role = ActiveValue::Set(role.as_str().to_string());
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await.store_ctx("update user role")?;
            User::try_from(model)
        })
    }
}
