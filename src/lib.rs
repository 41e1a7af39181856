//! Chat backend for document question answering.
//!
//! Requests flow transport -> pipeline -> oracles: the `server` module owns
//! the HTTP surface (a JSON endpoint and an SSE stream over the same
//! pipeline), `chat` owns the conversational QA stages, and `llm` / `rag` /
//! `tools` are the external oracles behind trait seams.

pub mod agent;
pub mod chat;
pub mod config;
pub mod core;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;
