//! Database entity models for assistant-chat-store.
//!
//! This module contains the Sea-ORM entity definitions for the five live
//! tables the store manages: `users`, `user_sessions`, `chat_conversations`,
//! `chat_messages`, and `message_chunks`. The entities are the authoritative
//! column-level contract; the migration chain in [`crate::migration`] brings a
//! database up to the shape these entities expect.

/// Chat conversation entity: a titled, soft-deletable thread owned by a user.
pub mod conversation;
/// Chat message entity, including the `MessageType` and `MessageStatus` enums
/// and the assistant-only enrichment columns.
pub mod message;
/// Message chunk entity: the durable representation of a streamed assistant
/// reply, one row per stored fragment.
pub mod message_chunk;
/// User identity entity.
pub mod user;
/// Authentication session entity.
pub mod user_session;
