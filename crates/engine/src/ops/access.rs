use sea_orm::{QueryFilter, prelude::*};

use crate::{AccessContext, EngineError, ResultEngine, User, error::StoreContext, users};

use super::Engine;

/// Resolve the caller on `db`, so checks can run inside an open transaction.
pub(super) async fn resolve_caller<C: ConnectionTrait>(
    db: &C,
    ctx: &AccessContext,
) -> ResultEngine<User> {
    let user_id = ctx.current_user_id()?;
    let model = users::Entity::find_by_id(user_id.to_string())
        .filter(users::Column::DeletedAt.is_null())
        .one(db)
        .await
        .store_ctx("load current user")?
        .ok_or_else(|| EngineError::Unauthenticated(format!("unknown user '{user_id}'")))?;
    User::try_from(model)
}

pub(super) fn check_admin(caller: &User) -> ResultEngine<()> {
    if !caller.role.is_admin() {
        return Err(EngineError::Forbidden("admin role required".to_string()));
    }
    Ok(())
}

pub(super) fn check_access(caller: &User, target_user_id: &str) -> ResultEngine<()> {
    if caller.role.is_admin() || caller.id == target_user_id {
        return Ok(());
    }
    Err(EngineError::Forbidden(format!(
        "access to data of user '{target_user_id}' denied"
    )))
}

impl Engine {
    /// Resolve the caller to a live user.
    ///
    /// Unknown and soft-deleted ids are both `Unauthenticated`.
    pub async fn current_user(&self, ctx: &AccessContext) -> ResultEngine<User> {
        resolve_caller(&self.database, ctx).await
    }

    /// Fail with `Forbidden` unless the caller is an admin.
    pub async fn require_admin(&self, ctx: &AccessContext) -> ResultEngine<User> {
        let caller = self.current_user(ctx).await?;
        check_admin(&caller)?;
        Ok(caller)
    }

    /// Allow the caller to act on `target_user_id` data: admins always,
    /// everyone else only on their own.
    pub async fn validate_access(
        &self,
        ctx: &AccessContext,
        target_user_id: &str,
    ) -> ResultEngine<User> {
        let caller = self.current_user(ctx).await?;
        check_access(&caller, target_user_id)?;
        Ok(caller)
    }
}
