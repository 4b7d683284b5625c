use std::sync::{Arc, RwLock};

/// Authentication context handed explicitly to API clients.
///
/// Cloning shares the same underlying token, so a login elsewhere in the
/// shell is visible to every client built from this context.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.set_token(token);
        ctx
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_token() {
        let ctx = SessionContext::new();
        let shared = ctx.clone();
        assert!(!shared.is_authenticated());

        ctx.set_token("abc.def");
        assert_eq!(shared.token().as_deref(), Some("abc.def"));

        shared.clear();
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let ctx = SessionContext::with_token("  ");
        assert!(ctx.token().is_none());
    }
}
