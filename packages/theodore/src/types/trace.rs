//! Phase traces and the research state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ErrorKind;

/// The five pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LinkDiscovery,
    PageSelection,
    Fetching,
    Aggregation,
    Extraction,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::LinkDiscovery,
        Phase::PageSelection,
        Phase::Fetching,
        Phase::Aggregation,
        Phase::Extraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::LinkDiscovery => "link_discovery",
            Phase::PageSelection => "page_selection",
            Phase::Fetching => "fetching",
            Phase::Aggregation => "aggregation",
            Phase::Extraction => "extraction",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Research run state.
///
/// `Queued -> LinkDiscovery -> PageSelection -> Fetching -> Aggregation ->
/// Extraction -> Completed`, with `Failed` reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchState {
    Queued,
    LinkDiscovery,
    PageSelection,
    Fetching,
    Aggregation,
    Extraction,
    Completed,
    Failed,
}

impl ResearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResearchState::Completed | ResearchState::Failed)
    }

    /// State for running a phase.
    pub fn running(phase: Phase) -> Self {
        match phase {
            Phase::LinkDiscovery => ResearchState::LinkDiscovery,
            Phase::PageSelection => ResearchState::PageSelection,
            Phase::Fetching => ResearchState::Fetching,
            Phase::Aggregation => ResearchState::Aggregation,
            Phase::Extraction => ResearchState::Extraction,
        }
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: ResearchState) -> bool {
        use ResearchState::*;
        match (self, next) {
            (Completed | Failed, _) => false,
            (_, Failed) => true,
            (Queued, LinkDiscovery)
            | (LinkDiscovery, PageSelection)
            | (PageSelection, Fetching)
            | (Fetching, Aggregation)
            | (Aggregation, Extraction)
            | (Extraction, Completed) => true,
            _ => false,
        }
    }
}

/// Record of one phase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTrace {
    pub phase: Phase,
    pub success: bool,
    pub duration_ms: u64,
    pub error_kind: Option<ErrorKind>,

    /// Human-readable note (fallback used, counts, error message)
    pub detail: Option<String>,
}

impl PhaseTrace {
    pub fn success(phase: Phase, duration: Duration) -> Self {
        Self {
            phase,
            success: true,
            duration_ms: duration.as_millis() as u64,
            error_kind: None,
            detail: None,
        }
    }

    pub fn failure(phase: Phase, duration: Duration, kind: ErrorKind) -> Self {
        Self {
            phase,
            success: false,
            duration_ms: duration.as_millis() as u64,
            error_kind: Some(kind),
            detail: None,
        }
    }

    /// Attach a degradation kind to a successful trace (e.g. fallback used).
    pub fn with_error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            ResearchState::Queued,
            ResearchState::LinkDiscovery,
            ResearchState::PageSelection,
            ResearchState::Fetching,
            ResearchState::Aggregation,
            ResearchState::Extraction,
            ResearchState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_reachable_and_terminal() {
        assert!(ResearchState::Fetching.can_transition_to(ResearchState::Failed));
        assert!(!ResearchState::Failed.can_transition_to(ResearchState::LinkDiscovery));
        assert!(!ResearchState::Completed.can_transition_to(ResearchState::Failed));
        assert!(!ResearchState::Queued.can_transition_to(ResearchState::Fetching));
    }

    #[test]
    fn test_trace_serializes() {
        let trace = PhaseTrace::failure(Phase::Fetching, Duration::from_millis(1500), ErrorKind::Timeout)
            .with_detail("0 of 3 pages fetched");
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["phase"], "fetching");
        assert_eq!(json["error_kind"], "timeout");
        assert_eq!(json["duration_ms"], 1500);
    }
}
