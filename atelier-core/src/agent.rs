//! Agent state types for the scout/architect/judge system.
//!
//! These types define the vocabulary an orchestrator uses to track agents.
//! This crate supplies only the shapes; no control loop lives here.

use crate::{Metadata, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ROLE AND STATUS ENUMS
// ============================================================================

/// Agent roles in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Gathers source material
    Scout,
    /// Drafts content
    Architect,
    /// Evaluates drafts
    Judge,
}

impl AgentRole {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentRole::Scout => "scout",
            AgentRole::Architect => "architect",
            AgentRole::Judge => "judge",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentRoleParseError> {
        match s.to_lowercase().as_str() {
            "scout" => Ok(AgentRole::Scout),
            "architect" => Ok(AgentRole::Architect),
            "judge" => Ok(AgentRole::Judge),
            _ => Err(AgentRoleParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRoleParseError(pub String);

impl fmt::Display for AgentRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent role: {}", self.0)
    }
}

impl std::error::Error for AgentRoleParseError {}

/// Status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Awaiting work
    #[default]
    Idle,
    /// Currently executing a task
    Working,
    /// Task finished
    Completed,
    /// Task failed
    Error,
}

impl AgentStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Working => "working",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentStatusParseError> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(AgentStatus::Idle),
            "working" => Ok(AgentStatus::Working),
            "completed" => Ok(AgentStatus::Completed),
            "error" => Ok(AgentStatus::Error),
            _ => Err(AgentStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentStatus {
    type Err = AgentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatusParseError(pub String);

impl fmt::Display for AgentStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent status: {}", self.0)
    }
}

impl std::error::Error for AgentStatusParseError {}

/// Verdict of a draft evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// Draft accepted as-is
    Approved,
    /// Draft must be revised
    RevisionRequired,
}

impl RevisionStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RevisionStatus::Approved => "approved",
            RevisionStatus::RevisionRequired => "revision_required",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, RevisionStatusParseError> {
        match s.to_lowercase().as_str() {
            "approved" => Ok(RevisionStatus::Approved),
            "revision_required" => Ok(RevisionStatus::RevisionRequired),
            _ => Err(RevisionStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for RevisionStatus {
    type Err = RevisionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid revision status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStatusParseError(pub String);

impl fmt::Display for RevisionStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid revision status: {}", self.0)
    }
}

impl std::error::Error for RevisionStatusParseError {}

// ============================================================================
// AGENT STATE
// ============================================================================

/// Snapshot of a single agent's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Role this agent plays
    pub role: AgentRole,
    /// Current status
    pub status: AgentStatus,
    /// Description of the task in flight (if any)
    pub current_task: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// When this snapshot was last updated
    pub last_updated: Timestamp,
}

impl AgentState {
    /// Create a new idle agent state.
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            status: AgentStatus::Idle,
            current_task: None,
            metadata: Metadata::new(),
            last_updated: chrono::Utc::now(),
        }
    }

    /// Set the current task.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.current_task = Some(task.into());
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Update the status and bump `last_updated`.
    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
        self.last_updated = chrono::Utc::now();
    }
}

// ============================================================================
// DRAFT EVALUATION
// ============================================================================

/// A judge's verdict on a draft.
/// Produced once per evaluation, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEvaluation {
    /// Verdict
    pub status: RevisionStatus,
    /// Free-text feedback
    pub feedback: String,
    /// Numeric quality score
    pub score: f32,
    /// Ordered revision notes (empty when approved)
    #[serde(default)]
    pub revision_notes: Vec<String>,
    /// When the evaluation was produced
    pub timestamp: Timestamp,
}

impl DraftEvaluation {
    /// Create an approving evaluation.
    pub fn approved(feedback: impl Into<String>, score: f32) -> Self {
        Self {
            status: RevisionStatus::Approved,
            feedback: feedback.into(),
            score,
            revision_notes: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an evaluation requiring revision.
    pub fn revision_required(
        feedback: impl Into<String>,
        score: f32,
        revision_notes: Vec<String>,
    ) -> Self {
        Self {
            status: RevisionStatus::RevisionRequired,
            feedback: feedback.into(),
            score,
            revision_notes,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Whether the draft was accepted.
    pub fn is_approved(&self) -> bool {
        self.status == RevisionStatus::Approved
    }
}

// ============================================================================
// SYSTEM STATE
// ============================================================================

/// Aggregate snapshot across all agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSystemState {
    /// Per-role agent states
    pub agents: HashMap<AgentRole, AgentState>,
    /// Current iteration of the draft/evaluate loop
    pub current_iteration: i32,
    /// Maximum iterations before giving up
    pub max_iterations: i32,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// When this snapshot was created
    pub created_at: Timestamp,
}

impl AgentSystemState {
    /// Create an empty system state with the default iteration cap.
    pub fn new() -> Self {
        Self::with_max_iterations(5)
    }

    /// Create an empty system state with an explicit iteration cap.
    pub fn with_max_iterations(max_iterations: i32) -> Self {
        Self {
            agents: HashMap::new(),
            current_iteration: 0,
            max_iterations,
            metadata: Metadata::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Record an agent state, replacing any previous state for its role.
    pub fn set_agent(&mut self, state: AgentState) {
        self.agents.insert(state.role, state);
    }

    /// Get the state for a role.
    pub fn agent(&self, role: AgentRole) -> Option<&AgentState> {
        self.agents.get(&role)
    }

    /// Advance to the next iteration.
    pub fn next_iteration(&mut self) {
        self.current_iteration += 1;
    }

    /// Whether the iteration budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.current_iteration >= self.max_iterations
    }
}

impl Default for AgentSystemState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
