//! # herald-state
//!
//! State plumbing for the Herald agent: the typed state store over an
//! abstract key-value backend, the conversation registry, and the shared
//! utterance transcript.

pub mod registry;
pub mod store;
pub mod transcript;
