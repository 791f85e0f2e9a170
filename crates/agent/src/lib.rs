//! Agent boundary - LLM-backed proposers and network tools
//!
//! This crate is the reasoning edge of the greenlight system:
//! - Talks to the reasoning backend through the `LlmClient` trait
//! - Implements the core's `ActionProposer` (tool-call proposals) and
//!   `PlanProposer` (plan drafting/revision) seams
//! - Builds the prompts both proposers send
//! - Hosts the one network-backed tool (`WebSearchTool`)
//!
//! # Key Types
//!
//! - `LlmClient` - Pluggable trait over the chat-completions backend
//! - `HttpLlmClient` - reqwest adapter for OpenAI-compatible endpoints
//! - `LlmProposer` / `LlmPlanner` - proposer implementations
//!
//! # Safety Principle
//!
//! The LLM only proposes. Nothing it emits executes until the approval
//! gate in `greenlight-core` has collected an explicit operator decision.

pub mod llm;
pub mod planner;
pub mod prompts;
pub mod proposer;
pub mod search;

pub use llm::{HttpLlmClient, LlmClient};
pub use planner::LlmPlanner;
pub use proposer::LlmProposer;
pub use search::WebSearchTool;
