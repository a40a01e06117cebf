//! Bounded conversational memory.
//!
//! Every session key owns an ordered turn history capped at `memory_len`
//! exchanges (two message slots each); the oldest turns are evicted first.

mod manager;
mod models;

pub use manager::{SessionHandle, SessionMemoryManager};
pub use models::{
    MemoryConfig, Message, Role, TrimPolicy, Turn, MEMORY_LEN_DEFAULT, SLOTS_PER_TURN,
};
