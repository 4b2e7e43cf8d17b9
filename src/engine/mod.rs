//! Event-driven orchestration engine.
//!
//! - [`EventBus`]: typed publish/subscribe between agents
//! - [`Session`]: page registry, counters and configuration for one run
//! - [`TaskGroup`]: worker pool and completion barrier
//! - [`Agent`]: the contract every pipeline stage implements

mod agent;
mod barrier;
mod bus;
mod page;
mod session;

pub use agent::Agent;
pub use barrier::{TaskGroup, WorkToken};
pub use bus::{Event, EventBus, Topic};
pub use page::{Header, Page, PageSnapshot, Severity, Tag};
pub use session::Session;
