//! Caller identity carried through every engine call.

use crate::{EngineError, ResultEngine};

/// Who is calling.
///
/// One value is built per request and handed to each operation. It holds the
/// raw id only; [`Engine::current_user`](crate::Engine::current_user) resolves
/// it against the user directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessContext {
    user_id: Option<String>,
}

impl AccessContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.set_current_user(user_id);
        ctx
    }

    /// Bind an identity. Blank ids leave the context anonymous.
    pub fn set_current_user(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        let trimmed = user_id.trim();
        self.user_id = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn clear(&mut self) {
        self.user_id = None;
    }

    pub fn current_user_id(&self) -> ResultEngine<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| EngineError::Unauthenticated("no authenticated user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_identity() {
        let ctx = AccessContext::anonymous();
        assert!(matches!(
            ctx.current_user_id(),
            Err(EngineError::Unauthenticated(_))
        ));
    }

    #[test]
    fn set_and_clear() {
        let mut ctx = AccessContext::anonymous();
        ctx.set_current_user(" alice ");
        assert_eq!(ctx.current_user_id().unwrap(), "alice");
        ctx.clear();
        assert!(ctx.current_user_id().is_err());

        ctx.set_current_user("   ");
        assert_eq!(ctx, AccessContext::anonymous());
    }
}
