// SPDX-License-Identifier: Apache-2.0

//! Persistent conversational agents, deduplicated by table set

pub mod cache;
pub mod context;
pub mod dedup;

pub use cache::{AgentCacheStore, InMemoryAgentCache};
pub use context::{build_system_instruction, describe_tables, ConversationContext};
pub use dedup::AgentDedupCache;
