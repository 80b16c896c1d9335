//! LLM client adapter.
//!
//! [`ChatCompletion`] is the seam between the itinerary pipeline and a
//! chat-completion backend. [`HttpChatClient`] is the production
//! implementation; tests substitute scripted fakes.

mod client;
mod error;
pub mod http;

pub use client::{ChatCompletion, DEFAULT_MODEL, LlmCredentials};
pub use error::LlmError;
pub use http::{EndpointKind, HttpChatClient, ResolvedEndpoint, resolve_endpoint};
