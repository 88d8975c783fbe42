//! Prompt construction and chat-completion client.
//!
//! [`prompt`] turns a domain + query into a fixed instruction template for
//! one of the three output shapes; [`GenerationClient`] sends it to the
//! completion endpoint and returns the generated text.

mod client;
pub mod prompt;

pub use client::{ChatMessage, GenerationClient, GenerationOptions};
pub use prompt::{OutputShape, build_document_question, build_prompt, system_role};
