use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The stage a run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extracting,
    Scanning,
    Converting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extracting => "extracting",
            Stage::Scanning => "scanning",
            Stage::Converting => "converting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Extracting,
    Scanning,
    ConvertingDocument { index: usize, source: PathBuf },
    Done { converted: usize },
    Failed { stage: Stage },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done { .. } | PipelineState::Failed { .. })
    }

    /// The stage a failure from this state is attributed to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Extracting => Some(Stage::Extracting),
            PipelineState::Scanning => Some(Stage::Scanning),
            PipelineState::ConvertingDocument { .. } => Some(Stage::Converting),
            PipelineState::Failed { stage } => Some(*stage),
            PipelineState::Idle | PipelineState::Done { .. } => None,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, next) {
            (Idle, Extracting) => true,
            (Extracting, Scanning) => true,
            (Scanning, ConvertingDocument { index: 0, .. }) => true,
            (ConvertingDocument { index, .. }, ConvertingDocument { index: next_index, .. }) => {
                *next_index == index + 1
            }
            (Scanning, Done { .. }) | (ConvertingDocument { .. }, Done { .. }) => true,
            (Extracting | Scanning | ConvertingDocument { .. }, Failed { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Extracting => f.write_str("extracting archive"),
            PipelineState::Scanning => f.write_str("searching for documents"),
            PipelineState::ConvertingDocument { source, .. } => {
                write!(f, "converting {}", source.display())
            }
            PipelineState::Done { converted } => write!(f, "done ({} converted)", converted),
            PipelineState::Failed { stage } => write!(f, "failed while {}", stage),
        }
    }
}
