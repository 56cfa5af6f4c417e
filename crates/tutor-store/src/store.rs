//! Workspace store
//!
//! Process-wide state container: every workspace plus the active selection.
//! Each mutation computes the next state from the previous one under a
//! single write lock, then writes the persisted subset to storage before the
//! lock is released, so snapshots reach storage in commit order.

use crate::coverage::compute_coverage;
use crate::storage::{MemoryStorage, PersistedState, StateStorage};
use parking_lot::RwLock;
use std::sync::Arc;
use tutor_model::{CourseSection, Workspace, WorkspaceId};

/// Shallow partial update of a workspace
///
/// File identity, attachment and coverage are not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceUpdate {
    /// New display subject
    pub subject: Option<String>,
    /// New section list; triggers coverage recomputation
    pub sections: Option<Vec<CourseSection>>,
    /// New active section index
    pub active_section_index: Option<usize>,
}

impl WorkspaceUpdate {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the display subject
    #[inline]
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Replace the section list
    #[inline]
    #[must_use]
    pub fn sections(mut self, sections: Vec<CourseSection>) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Select a section
    #[inline]
    #[must_use]
    pub fn active_section_index(mut self, index: usize) -> Self {
        self.active_section_index = Some(index);
        self
    }

    /// Whether the update replaces the section list
    #[inline]
    #[must_use]
    pub fn touches_sections(&self) -> bool {
        self.sections.is_some()
    }
}

/// Merge `update` over `current`
///
/// Coverage is recomputed from the merged section list only when the update
/// touches sections. An active index outside the merged list is ignored.
#[must_use]
pub fn merge_workspace(current: &Workspace, update: WorkspaceUpdate) -> Workspace {
    let recompute = update.touches_sections();
    let mut merged = current.clone();

    if let Some(subject) = update.subject {
        merged.subject = subject;
    }
    if let Some(sections) = update.sections {
        merged.sections = sections;
    }
    if let Some(index) = update.active_section_index {
        if index < merged.sections.len() {
            merged.active_section_index = index;
        } else {
            tracing::warn!(
                workspace = %merged.id(),
                index,
                len = merged.sections.len(),
                "ignoring out-of-range active section index"
            );
        }
    }
    if recompute {
        merged.coverage_stats = compute_coverage(&merged.sections);
    }
    merged
}

/// Restore the section index invariant on a stored workspace
///
/// A workspace without sections is dropped. An index past the end is
/// clamped to the last section.
fn sanitize_workspace(mut workspace: Workspace) -> Option<Workspace> {
    let len = workspace.sections.len();
    if len == 0 {
        tracing::warn!(workspace = %workspace.id(), "dropping stored workspace without sections");
        return None;
    }
    if workspace.active_section_index >= len {
        tracing::warn!(
            workspace = %workspace.id(),
            index = workspace.active_section_index,
            len,
            "clamping stored active section index"
        );
        workspace.active_section_index = len - 1;
    }
    Some(workspace)
}

#[derive(Debug, Default)]
struct StoreState {
    workspaces: Vec<Workspace>,
    active_workspace_id: Option<WorkspaceId>,
    /// Transient: an enrichment run is in progress
    is_enriching: bool,
}

impl StoreState {
    fn persisted(&self) -> PersistedState {
        PersistedState {
            workspaces: self.workspaces.clone(),
            active_workspace_id: self.active_workspace_id,
            ..PersistedState::default()
        }
    }

    fn position(&self, id: WorkspaceId) -> Option<usize> {
        self.workspaces.iter().position(|w| w.id() == id)
    }
}

/// Persisted workspace store
pub struct WorkspaceStore {
    state: RwLock<StoreState>,
    storage: Arc<dyn StateStorage>,
}

impl std::fmt::Debug for WorkspaceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("WorkspaceStore")
            .field("workspaces", &state.workspaces.len())
            .field("active_workspace_id", &state.active_workspace_id)
            .field("is_enriching", &state.is_enriching)
            .finish()
    }
}

impl WorkspaceStore {
    /// Hydrate from storage
    ///
    /// Falls back to the empty state if nothing is stored or the stored
    /// snapshot cannot be read.
    pub fn hydrate(storage: Arc<dyn StateStorage>) -> Self {
        let state = match storage.load() {
            Ok(Some(persisted)) => {
                tracing::info!(
                    workspaces = persisted.workspaces.len(),
                    "hydrated workspace store"
                );
                StoreState {
                    workspaces: persisted
                        .workspaces
                        .into_iter()
                        .filter_map(sanitize_workspace)
                        .collect(),
                    active_workspace_id: persisted.active_workspace_id,
                    is_enriching: false,
                }
            }
            Ok(None) => {
                tracing::debug!("no stored state, starting empty");
                StoreState::default()
            }
            Err(err) => {
                tracing::warn!("discarding unreadable stored state: {}", err);
                StoreState::default()
            }
        };
        Self {
            state: RwLock::new(state),
            storage,
        }
    }

    /// Store with no durable backing
    #[must_use]
    pub fn in_memory() -> Self {
        Self::hydrate(Arc::new(MemoryStorage::new()))
    }

    /// All workspaces, newest first
    #[must_use]
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.state.read().workspaces.clone()
    }

    /// Number of workspaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().workspaces.len()
    }

    /// Whether the store holds no workspace
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Workspace by id
    #[must_use]
    pub fn workspace(&self, id: WorkspaceId) -> Option<Workspace> {
        let state = self.state.read();
        state.position(id).map(|idx| state.workspaces[idx].clone())
    }

    /// Clone of one section
    #[must_use]
    pub fn section(&self, id: WorkspaceId, index: usize) -> Option<CourseSection> {
        let state = self.state.read();
        state
            .position(id)
            .and_then(|idx| state.workspaces[idx].sections.get(index).cloned())
    }

    /// Active workspace id, not validated against the list
    #[must_use]
    pub fn active_workspace_id(&self) -> Option<WorkspaceId> {
        self.state.read().active_workspace_id
    }

    /// The workspace whose id equals the active id
    #[must_use]
    pub fn get_active_workspace(&self) -> Option<Workspace> {
        let state = self.state.read();
        let id = state.active_workspace_id?;
        state.position(id).map(|idx| state.workspaces[idx].clone())
    }

    /// Whether an enrichment run is in progress. Never persisted.
    #[must_use]
    pub fn is_enriching(&self) -> bool {
        self.state.read().is_enriching
    }

    /// Set the transient enrichment flag
    pub fn set_is_enriching(&self, status: bool) {
        self.state.write().is_enriching = status;
    }

    /// The persisted subset of current state
    #[must_use]
    pub fn snapshot(&self) -> PersistedState {
        self.state.read().persisted()
    }

    /// Prepend `workspace` and make it active
    pub fn add_workspace(&self, workspace: Workspace) {
        let id = workspace.id();
        self.commit(|state| {
            if let Some(existing) = state.position(id) {
                tracing::warn!(workspace = %id, "replacing workspace with duplicate id");
                state.workspaces.remove(existing);
            }
            state.workspaces.insert(0, workspace);
            state.active_workspace_id = Some(id);
            true
        });
        tracing::info!(workspace = %id, "workspace added");
    }

    /// Merge a partial update into the workspace with `id`
    ///
    /// Returns `false` and leaves state untouched if no such workspace.
    pub fn update_workspace(&self, id: WorkspaceId, update: WorkspaceUpdate) -> bool {
        self.commit(|state| match state.position(id) {
            Some(idx) => {
                let merged = merge_workspace(&state.workspaces[idx], update);
                state.workspaces[idx] = merged;
                true
            }
            None => {
                tracing::debug!(workspace = %id, "update for unknown workspace ignored");
                false
            }
        })
    }

    /// Read-modify-write one section against its current value
    ///
    /// Runs `patch` on the stored section under the write lock and recomputes
    /// coverage. Returns the updated section, or `None` if the workspace or
    /// index does not exist.
    pub fn update_section<F>(&self, id: WorkspaceId, index: usize, patch: F) -> Option<CourseSection>
    where
        F: FnOnce(&mut CourseSection),
    {
        let mut updated = None;
        self.commit(|state| {
            let Some(idx) = state.position(id) else {
                return false;
            };
            let current = &state.workspaces[idx];
            let Some(section) = current.sections.get(index) else {
                return false;
            };
            let mut section = section.clone();
            patch(&mut section);

            let mut sections = current.sections.clone();
            sections[index] = section.clone();
            state.workspaces[idx] = merge_workspace(current, WorkspaceUpdate::new().sections(sections));
            updated = Some(section);
            true
        });
        updated
    }

    /// Replace the whole workspace list
    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        self.commit(|state| {
            state.workspaces = workspaces;
            true
        });
    }

    /// Set the active workspace id without validating it
    pub fn set_active_workspace_id(&self, id: Option<WorkspaceId>) {
        self.commit(|state| {
            state.active_workspace_id = id;
            true
        });
    }

    /// Drop every workspace and clear the selection
    pub fn purge(&self) {
        self.commit(|state| {
            state.workspaces.clear();
            state.active_workspace_id = None;
            true
        });
        tracing::info!("workspace store purged");
    }

    /// Apply `mutate` atomically; persist if it reports a change
    fn commit<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut StoreState) -> bool,
    {
        let mut state = self.state.write();
        let changed = mutate(&mut state);
        if changed {
            if let Err(err) = self.storage.save(&state.persisted()) {
                tracing::error!("failed to persist workspace store: {}", err);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_model::{Attachment, SectionStatus};

    fn workspace(n: usize) -> Workspace {
        let sections = (0..n)
            .map(|i| CourseSection::skeleton(format!("Unit {i}"), SectionStatus::Locked))
            .collect();
        Workspace::new(Attachment::new("doc.txt", "text/plain", b"doc".to_vec()), sections)
    }

    #[test]
    fn merge_without_sections_keeps_stats() {
        let mut ws = workspace(2);
        ws.coverage_stats.ingested = 42;
        let merged = merge_workspace(&ws, WorkspaceUpdate::new().subject("Renamed"));
        assert_eq!(merged.subject, "Renamed");
        assert_eq!(merged.coverage_stats.ingested, 42);
    }

    #[test]
    fn merge_with_sections_recomputes() {
        let mut ws = workspace(2);
        ws.coverage_stats.ingested = 42;
        let mut sections = ws.sections.clone();
        sections[0].content = "text".into();
        let merged = merge_workspace(&ws, WorkspaceUpdate::new().sections(sections));
        assert_eq!(merged.coverage_stats.ingested, 50);
    }

    #[test]
    fn merge_ignores_out_of_range_index() {
        let ws = workspace(2);
        let merged = merge_workspace(&ws, WorkspaceUpdate::new().active_section_index(5));
        assert_eq!(merged.active_section_index, 0);
        let merged = merge_workspace(&ws, WorkspaceUpdate::new().active_section_index(1));
        assert_eq!(merged.active_section_index, 1);
    }

    #[test]
    fn enriching_flag_is_not_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = WorkspaceStore::hydrate(storage.clone());
        store.set_is_enriching(true);
        assert!(store.is_enriching());
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn unknown_update_does_not_save() {
        let storage = Arc::new(MemoryStorage::new());
        let store = WorkspaceStore::hydrate(storage.clone());
        assert!(!store.update_workspace(WorkspaceId::new(), WorkspaceUpdate::new().subject("x")));
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn update_section_patches_current_value() {
        let store = WorkspaceStore::in_memory();
        let ws = workspace(2);
        let id = ws.id();
        store.add_workspace(ws);

        store.update_section(id, 1, |s| s.content = "first".into());
        store.update_section(id, 1, |s| s.mindmap = "graph".into());

        let section = store.section(id, 1).unwrap();
        assert_eq!(section.content, "first");
        assert_eq!(section.mindmap, "graph");
        assert_eq!(store.workspace(id).unwrap().coverage_stats.ingested, 50);

        assert!(store.update_section(id, 9, |s| s.content = "x".into()).is_none());
    }
}
