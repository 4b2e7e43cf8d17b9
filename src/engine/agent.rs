//! Agent contract.

use std::sync::Arc;

use anyhow::Result;

use super::session::Session;

/// A reactive pipeline stage.
///
/// Agents never call each other. They subscribe to bus topics in
/// [`Agent::register`] and communicate only by publishing events. Handlers
/// hand any I/O to the session's task group instead of doing it on the
/// dispatch path.
pub trait Agent: Send + Sync {
    /// Stable identifier used as the log prefix, e.g. `agent:url_requester`.
    fn id(&self) -> &'static str;

    /// Subscribes to topics and performs one-time setup.
    ///
    /// Called once before any event is published. An error aborts the run.
    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()>;
}
