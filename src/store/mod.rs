//! Typed store APIs over the entities.
//!
//! Each store wraps a [`sea_orm::DatabaseConnection`] (cheap to clone) and
//! exposes the operations one slice of the domain needs. Domain invariants
//! that the schema cannot express on every backend (assistant-only
//! enrichment, one feedback verdict per message, feedback attribution
//! clearing) are enforced here.

mod chunks;
mod conversations;
mod messages;
mod sessions;
mod users;

pub use chunks::ChunkStore;
pub use conversations::ConversationStore;
pub use messages::{MessageEnrichment, MessageStore};
pub use sessions::{NewSession, SessionStore};
pub use users::UserStore;

pub(crate) fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
    chrono::Utc::now().into()
}
