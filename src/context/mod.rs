//! Invocation id generation and propagation.
//!
//! # Responsibilities
//! - Generate time-ordered invocation ids (UUIDv7, random v4 fallback)
//! - Carry the id and session through a request's execution path
//! - Accessors that never fail: an absent id reads as an empty string
//!
//! # Design Decisions
//! - The context is an explicit, cheaply clonable value rather than ambient
//!   task-local state; only ingress code creates ids, everything downstream
//!   reads them.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::{NoContext, Timestamp, Uuid};

/// Generate a new invocation id.
///
/// Prefers a UUIDv7 derived from the wall clock so that ids sort in
/// creation order. If the clock reads before the Unix epoch the id falls
/// back to a random UUIDv4; the caller never sees an error either way.
pub fn new_invocation_id() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let ts = Timestamp::from_unix(NoContext, d.as_secs(), d.subsec_nanos());
            Uuid::new_v7(ts).to_string()
        }
        Err(_) => Uuid::new_v4().to_string(),
    }
}

/// Execution-scoped correlation context for one request.
///
/// Holds the current invocation id and the session id of the inbound
/// request. Clones share the underlying strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    invoke: Option<Arc<str>>,
    session: Option<Arc<str>>,
}

impl InvocationContext {
    /// Create an empty context with no invocation id and no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the context for an inbound request: a fresh invocation id
    /// that doubles as the session id.
    pub fn for_ingress() -> Self {
        let id: Arc<str> = new_invocation_id().into();
        Self {
            invoke: Some(id.clone()),
            session: Some(id),
        }
    }

    /// Return a copy of this context carrying the given invocation id.
    pub fn with_invoke(&self, invoke: impl Into<String>) -> Self {
        Self {
            invoke: Some(invoke.into().into()),
            session: self.session.clone(),
        }
    }

    /// Return a copy of this context carrying the given session id.
    pub fn with_session(&self, session: impl Into<String>) -> Self {
        Self {
            invoke: self.invoke.clone(),
            session: Some(session.into().into()),
        }
    }

    /// The invocation id, or `""` when absent. Never errors.
    pub fn invoke(&self) -> &str {
        self.invoke.as_deref().unwrap_or("")
    }

    /// The session id, or `""` when absent. Never errors.
    pub fn session(&self) -> &str {
        self.session.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_reads_as_empty_strings() {
        let ctx = InvocationContext::new();
        assert_eq!(ctx.invoke(), "");
        assert_eq!(ctx.session(), "");
    }

    #[test]
    fn test_with_invoke_does_not_mutate_original() {
        let base = InvocationContext::new().with_session("s-1");
        let derived = base.with_invoke("op-1");

        assert_eq!(base.invoke(), "");
        assert_eq!(derived.invoke(), "op-1");
        assert_eq!(derived.session(), "s-1");
    }

    #[test]
    fn test_ingress_context_uses_id_as_session() {
        let ctx = InvocationContext::for_ingress();
        assert!(!ctx.invoke().is_empty());
        assert_eq!(ctx.invoke(), ctx.session());
    }

    #[test]
    fn test_ids_are_unique_and_time_ordered() {
        let a = new_invocation_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_invocation_id();

        assert_ne!(a, b);
        // UUIDv7 string form sorts by creation time.
        assert!(a < b);
    }
}
