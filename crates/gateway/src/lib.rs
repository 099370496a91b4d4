//! REST client for the AI edit route.
//!
//! Sends markup plus a natural-language instruction to the LLM-backed
//! proxy and returns the edited markup together with the conversation to
//! replay on the next call. The client keeps no state of its own.

pub mod api;
pub mod messages;
pub mod service;
