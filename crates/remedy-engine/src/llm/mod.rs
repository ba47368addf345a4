//! LLM plumbing: chat-completions client, response parsing, prompts.

pub mod client;
pub mod parse;
pub mod prompts;

pub use client::LlmClient;
