//! Data models for conversational memory.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LunaError, Result};

/// Default conversational memory length, in exchanges.
pub const MEMORY_LEN_DEFAULT: usize = 5;

/// Message slots consumed by one exchange (human + agent).
pub const SLOTS_PER_TURN: usize = 2;

/// One human-utterance / agent-reply pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub human: String,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        human: impl Into<String>,
        agent: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            human: human.into(),
            agent: agent.into(),
            timestamp,
        }
    }

    /// Split the turn into its two prompt-visible messages.
    pub fn messages(&self) -> [Message; 2] {
        [
            Message::new(Role::Human, self.human.clone()),
            Message::new(Role::Agent, self.agent.clone()),
        ]
    }
}

/// Speaker of a flattened history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => write!(f, "human"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

/// A single history message, in the order a model should see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// When a capacity change takes effect on already-stored sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimPolicy {
    /// Longer sessions are trimmed on their next append.
    #[default]
    Lazy,
    /// Every stored session is trimmed as soon as the capacity shrinks.
    Eager,
}

impl fmt::Display for TrimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimPolicy::Lazy => write!(f, "lazy"),
            TrimPolicy::Eager => write!(f, "eager"),
        }
    }
}

impl FromStr for TrimPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lazy" => Ok(TrimPolicy::Lazy),
            "eager" => Ok(TrimPolicy::Eager),
            _ => Err(format!(
                "Unknown trim policy: {s}. Valid options: lazy, eager"
            )),
        }
    }
}

/// Configuration for the session memory manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of exchanges retained per session.
    pub memory_len: usize,
    #[serde(default)]
    pub trim_policy: TrimPolicy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_len: MEMORY_LEN_DEFAULT,
            trim_policy: TrimPolicy::default(),
        }
    }
}

impl MemoryConfig {
    pub fn new(memory_len: usize) -> Self {
        Self {
            memory_len,
            ..Default::default()
        }
    }

    pub fn with_trim_policy(mut self, trim_policy: TrimPolicy) -> Self {
        self.trim_policy = trim_policy;
        self
    }

    /// Message slots available per session.
    pub fn slots(&self) -> usize {
        slots_for(self.memory_len)
    }

    pub fn validate(&self) -> Result<()> {
        validate_memory_len(self.memory_len)
    }
}

/// Slot count for `memory_len` exchanges, saturating for huge caps.
pub(crate) fn slots_for(memory_len: usize) -> usize {
    memory_len.saturating_mul(SLOTS_PER_TURN)
}

pub(crate) fn validate_memory_len(memory_len: usize) -> Result<()> {
    if memory_len == 0 {
        return Err(LunaError::invalid_config(
            "memory_len must be at least 1 exchange",
        ));
    }
    Ok(())
}
