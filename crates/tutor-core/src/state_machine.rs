//! Per-section enrichment state machine
//!
//! A run walks `Unstarted -> Core -> Logic -> Recall -> Resources -> Done`.
//! Any stage may drop to `Failed`. `Done` and `Failed` are terminal for the
//! run; a new run starts again from `Unstarted`.

use serde::{Deserialize, Serialize};
use tutor_model::StageLoading;

/// One enrichment stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Core,
    Logic,
    Recall,
    Resources,
}

impl Stage {
    /// Fixed execution order
    pub const ALL: [Stage; 4] = [Stage::Core, Stage::Logic, Stage::Recall, Stage::Resources];

    /// Phase entered while this stage runs
    #[inline]
    #[must_use]
    pub fn phase(self) -> EnrichmentPhase {
        match self {
            Stage::Core => EnrichmentPhase::Core,
            Stage::Logic => EnrichmentPhase::Logic,
            Stage::Recall => EnrichmentPhase::Recall,
            Stage::Resources => EnrichmentPhase::Resources,
        }
    }

    /// This stage's loading flag
    #[inline]
    pub fn flag(self, loading: &mut StageLoading) -> &mut bool {
        match self {
            Stage::Core => &mut loading.core,
            Stage::Logic => &mut loading.logic,
            Stage::Recall => &mut loading.recall,
            Stage::Resources => &mut loading.resources,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Core => "core",
            Stage::Logic => "logic",
            Stage::Recall => "recall",
            Stage::Resources => "resources",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a section's enrichment run stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentPhase {
    #[default]
    Unstarted,
    Core,
    Logic,
    Recall,
    Resources,
    Done,
    Failed,
}

impl EnrichmentPhase {
    /// Whether the run has ended
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, EnrichmentPhase::Done | EnrichmentPhase::Failed)
    }
}

/// Illegal phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal enrichment transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: EnrichmentPhase,
    pub to: EnrichmentPhase,
}

/// Validate one phase change
pub fn validate_transition(
    from: EnrichmentPhase,
    to: EnrichmentPhase,
) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

pub fn allowed_transitions(from: EnrichmentPhase) -> Vec<EnrichmentPhase> {
    use EnrichmentPhase::*;
    match from {
        Unstarted => vec![Core],
        Core => vec![Logic, Failed],
        Logic => vec![Recall, Failed],
        Recall => vec![Resources, Failed],
        Resources => vec![Done, Failed],
        Done => vec![],
        Failed => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_valid() {
        let mut phase = EnrichmentPhase::Unstarted;
        for stage in Stage::ALL {
            validate_transition(phase, stage.phase()).unwrap();
            phase = stage.phase();
        }
        validate_transition(phase, EnrichmentPhase::Done).unwrap();
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert!(validate_transition(EnrichmentPhase::Unstarted, EnrichmentPhase::Logic).is_err());
        assert!(validate_transition(EnrichmentPhase::Core, EnrichmentPhase::Done).is_err());
        assert!(validate_transition(EnrichmentPhase::Unstarted, EnrichmentPhase::Failed).is_err());
    }

    #[test]
    fn stage_flags_are_distinct() {
        let mut loading = StageLoading::default();
        *Stage::Recall.flag(&mut loading) = true;
        assert!(loading.recall);
        assert!(!loading.core && !loading.logic && !loading.resources);
    }
}
