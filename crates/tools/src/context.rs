//! Per-turn tool context and the role resolution that produces it.

use crate::error::ContextError;
use crate::role::Role;
use crate::store::Store;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Read-only capsule of identity, role and persistence access for one turn.
#[derive(Clone)]
pub struct ToolContext {
    store: Arc<dyn Store>,
    user_id: String,
    role: Role,
    turn_id: Uuid,
}

impl ToolContext {
    fn new(store: Arc<dyn Store>, user_id: String, role: Role) -> Self {
        Self {
            store,
            user_id,
            role,
            turn_id: Uuid::new_v4(),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Correlation id for log events of this turn.
    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("turn_id", &self.turn_id)
            .finish_non_exhaustive()
    }
}

/// Resolve the caller's role from durable storage and build the turn context.
///
/// This is the only place a role is derived for user-facing requests; call it
/// once per turn. A failed tier lookup resolves to [`Role::Free`].
///
/// # Errors
/// Returns [`ContextError::EmptyUserId`] if `user_id` is empty.
pub async fn create_context(
    store: Arc<dyn Store>,
    user_id: &str,
) -> Result<ToolContext, ContextError> {
    if user_id.trim().is_empty() {
        return Err(ContextError::EmptyUserId);
    }

    let role = match store.subscription_tier(user_id).await {
        Ok(tier) => Role::from_tier(tier.as_deref()),
        Err(e) => {
            warn!(user_id, error = %e, "Subscription lookup failed, resolving to free");
            Role::Free
        }
    };

    let ctx = ToolContext::new(store, user_id.to_string(), role);
    info!(user_id, %role, turn_id = %ctx.turn_id, "Created tool context");
    Ok(ctx)
}

/// Context construction that bypasses role resolution.
///
/// Only compiled for tests and for builds that enable the `privileged`
/// feature (admin tooling, local harnesses).
#[cfg(any(test, feature = "privileged"))]
pub mod privileged {
    use super::*;

    pub fn create_context_with_role(
        store: Arc<dyn Store>,
        user_id: &str,
        role: Role,
    ) -> ToolContext {
        let ctx = ToolContext::new(store, user_id.to_string(), role);
        warn!(user_id, %role, turn_id = %ctx.turn_id, "Created tool context with explicit role");
        ctx
    }
}
