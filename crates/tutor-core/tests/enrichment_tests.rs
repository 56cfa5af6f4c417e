//! Enrichment orchestration tests.
//!
//! These exercise the Orchestrator against a scripted capability:
//! - stages run in order and merge into the stored section
//! - a failed stage keeps earlier fields and clears every loading flag
//! - at most one run per section is in flight
//! - the store's enriching flag tracks running work

use std::sync::Arc;
use std::time::Duration;
use tutor_ai::AiError;
use tutor_core::{EnrichmentPhase, EnsureOutcome, Orchestrator, Stage, TutorError};
use tutor_model::{MasteryStatus, WorkspaceId};
use tutor_store::WorkspaceStore;
use tutor_test_utils::{sample_workspace, Op, ScriptedCapability};

fn setup(capability: ScriptedCapability) -> (Arc<WorkspaceStore>, Arc<ScriptedCapability>, Arc<Orchestrator>, WorkspaceId) {
    let store = Arc::new(WorkspaceStore::in_memory());
    let ws = sample_workspace(3);
    let id = ws.id();
    store.add_workspace(ws);
    let capability = Arc::new(capability);
    let orchestrator = Arc::new(Orchestrator::new(store.clone(), capability.clone()));
    (store, capability, orchestrator, id)
}

/// Wait until `cond` holds, yielding to spawned tasks between checks.
async fn wait_for(cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

/// Tenet: a full run fills every stage's fields and leaves no flag raised.
#[tokio::test]
async fn full_run_populates_all_fields() {
    let (store, capability, orchestrator, id) = setup(ScriptedCapability::new());

    let report = orchestrator.enrich_section(id, 0).await.unwrap();

    assert_eq!(report.phase, EnrichmentPhase::Done);
    assert_eq!(report.completed_stages, Stage::ALL.to_vec());
    assert!(report.error.is_none());

    let section = store.section(id, 0).unwrap();
    assert!(section.has_content());
    assert_eq!(section.detailed_summary, section.summary);
    assert_eq!(section.key_terms.len(), 1);
    assert_eq!(section.formulas.len(), 1);
    assert!(!section.mindmap.is_empty());
    assert_eq!(section.flashcards.len(), 2);
    assert!(section
        .flashcards
        .iter()
        .all(|c| c.mastery_status == MasteryStatus::Learning));
    assert_eq!(section.practice_questions.len(), 2);
    assert_eq!(section.practice_questions[1].options, vec!["A", "B", "C", "D"]);
    assert_eq!(section.resources[0].score, 0.9);
    assert!(!section.loading.any());

    for op in [Op::Core, Op::Logic, Op::Recall, Op::Resources] {
        assert_eq!(capability.calls(op), 1);
    }
    assert_eq!(store.workspace(id).unwrap().coverage_stats.ingested, 33);
}

/// Tenet: partial enrichment is preserved when a later stage fails.
///
/// Core succeeds and logic fails: core fields stay, later fields stay empty,
/// all loading flags are false.
#[tokio::test]
async fn logic_failure_preserves_core_fields() {
    let (store, capability, orchestrator, id) = setup(
        ScriptedCapability::new().failing(Op::Logic, AiError::EmptyResponse),
    );

    let report = orchestrator.enrich_section(id, 0).await.unwrap();

    assert_eq!(report.phase, EnrichmentPhase::Failed);
    assert_eq!(report.completed_stages, vec![Stage::Core]);
    let error = report.error.unwrap();
    assert_eq!(error.stage, Stage::Logic);
    assert_eq!(error.source, AiError::EmptyResponse);

    let section = store.section(id, 0).unwrap();
    assert!(!section.content.is_empty());
    assert!(!section.summary.is_empty());
    assert!(!section.key_terms.is_empty());
    assert!(!section.formulas.is_empty());
    assert!(section.mindmap.is_empty());
    assert!(section.flashcards.is_empty());
    assert!(section.practice_questions.is_empty());
    assert!(section.resources.is_empty());
    assert!(!section.loading.any());

    assert_eq!(capability.calls(Op::Recall), 0);
    assert_eq!(capability.calls(Op::Resources), 0);
}

/// Tenet: re-running an enriched section overwrites it and never leaves a
/// loading flag raised, whether the rerun succeeds or fails.
#[tokio::test]
async fn rerun_overwrites_and_clears_flags() {
    let (store, capability, orchestrator, id) = setup(ScriptedCapability::new());
    orchestrator.enrich_section(id, 1).await.unwrap();
    let first = store.section(id, 1).unwrap();

    let report = orchestrator.enrich_section(id, 1).await.unwrap();
    assert!(report.is_complete());
    let second = store.section(id, 1).unwrap();
    assert_eq!(second.content, first.content);
    assert_ne!(second.flashcards[0].id, first.flashcards[0].id);
    assert!(!second.loading.any());

    capability.fail(Op::Resources, AiError::Timeout);
    let report = orchestrator.enrich_section(id, 1).await.unwrap();
    assert_eq!(report.phase, EnrichmentPhase::Failed);
    assert_eq!(report.completed_stages.len(), 3);
    let third = store.section(id, 1).unwrap();
    assert!(!third.loading.any());
    assert_eq!(third.resources, second.resources);
}

/// Tenet: a failure in the first stage leaves the section untouched apart
/// from the cleared flags, so it can be selected again later.
#[tokio::test]
async fn core_failure_allows_later_retry() {
    let (store, capability, orchestrator, id) = setup(
        ScriptedCapability::new().failing(Op::Core, AiError::Transport("refused".into())),
    );

    let outcome = orchestrator.ensure_enriched(id, 0).await.unwrap();
    let EnsureOutcome::Started(report) = outcome else {
        panic!("expected a run");
    };
    assert_eq!(report.phase, EnrichmentPhase::Failed);
    assert!(report.completed_stages.is_empty());
    assert!(!store.section(id, 0).unwrap().has_content());

    capability.clear_failure(Op::Core);
    let outcome = orchestrator.ensure_enriched(id, 0).await.unwrap();
    assert!(matches!(outcome, EnsureOutcome::Started(ref r) if r.is_complete()));
}

/// Tenet: at most one run per section is in flight.
#[tokio::test]
async fn concurrent_ensure_is_refused() {
    let (store, capability, orchestrator, id) = setup(ScriptedCapability::new().gated(Op::Core));

    let running = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.ensure_enriched(id, 0).await })
    };
    wait_for(|| store.section(id, 0).is_some_and(|s| s.loading.core)).await;

    assert!(store.is_enriching());
    assert!(orchestrator.is_enriching(id, 0));
    assert_eq!(
        orchestrator.ensure_enriched(id, 0).await.unwrap(),
        EnsureOutcome::AlreadyLoading
    );
    let err = orchestrator.enrich_section(id, 0).await.unwrap_err();
    assert!(matches!(err, TutorError::EnrichmentInProgress { index: 0, .. }));

    capability.open(Op::Core);
    let outcome = running.await.unwrap().unwrap();
    assert!(matches!(outcome, EnsureOutcome::Started(ref r) if r.is_complete()));
    assert_eq!(capability.calls(Op::Core), 1);
    assert!(!store.is_enriching());
    assert!(!orchestrator.is_enriching(id, 0));
}

/// Tenet: different sections may be enriched at the same time without
/// losing each other's writes.
#[tokio::test]
async fn sections_enrich_independently() {
    let (store, _capability, orchestrator, id) = setup(ScriptedCapability::new());

    let (a, b) = tokio::join!(
        orchestrator.enrich_section(id, 0),
        orchestrator.enrich_section(id, 2)
    );
    assert!(a.unwrap().is_complete());
    assert!(b.unwrap().is_complete());

    let ws = store.workspace(id).unwrap();
    assert!(ws.sections[0].has_content());
    assert!(!ws.sections[1].has_content());
    assert!(ws.sections[2].has_content());
    assert_eq!(ws.coverage_stats.ingested, 67);
    assert!(!store.is_enriching());
}

/// Tenet: a run abandoned mid-stage leaves no loading flag behind, so the
/// section can be enriched again.
#[tokio::test]
async fn dropped_run_clears_loading_flags() {
    let (store, capability, orchestrator, id) = setup(ScriptedCapability::new().gated(Op::Core));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), orchestrator.enrich_section(id, 0)).await;
    assert!(abandoned.is_err());

    let section = store.section(id, 0).unwrap();
    assert!(!section.loading.any());
    assert!(!orchestrator.is_enriching(id, 0));
    assert!(!store.is_enriching());

    capability.open(Op::Core);
    let outcome = orchestrator.ensure_enriched(id, 0).await.unwrap();
    assert!(matches!(outcome, EnsureOutcome::Started(ref r) if r.is_complete()));
    assert_eq!(capability.calls(Op::Core), 2);
}

/// Tenet: a stage result for a workspace removed mid-run is not reported
/// as merged.
#[tokio::test]
async fn purge_during_stage_fails_the_run() {
    let (store, capability, orchestrator, id) = setup(ScriptedCapability::new().gated(Op::Core));

    let running = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.enrich_section(id, 0).await })
    };
    wait_for(|| store.section(id, 0).is_some_and(|s| s.loading.core)).await;

    store.purge();
    capability.open(Op::Core);

    let err = running.await.unwrap().unwrap_err();
    assert!(matches!(err, TutorError::WorkspaceNotFound(w) if w == id));
    assert_eq!(capability.calls(Op::Logic), 0);
    assert!(store.is_empty());
    assert!(!store.is_enriching());
}
