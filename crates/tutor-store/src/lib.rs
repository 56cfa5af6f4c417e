//! Tutor Store - persisted workspace state
//!
//! Holds every workspace and the active selection:
//! - **WorkspaceStore**: atomic mutations, coverage recomputation
//! - **StateStorage**: durable storage port (JSON file or memory)
//! - **compute_coverage**: the pure coverage formula
//!
//! # Example
//!
//! ```rust
//! use tutor_model::{Attachment, CourseSection, SectionStatus, Workspace};
//! use tutor_store::{WorkspaceStore, WorkspaceUpdate};
//!
//! let store = WorkspaceStore::in_memory();
//! let ws = Workspace::new(
//!     Attachment::new("notes.txt", "text/plain", b"cells".to_vec()),
//!     vec![CourseSection::skeleton("Cells", SectionStatus::InProgress)],
//! );
//! let id = ws.id();
//! store.add_workspace(ws);
//!
//! let mut sections = store.workspace(id).unwrap().sections;
//! sections[0].content = "Cells are the unit of life.".into();
//! store.update_workspace(id, WorkspaceUpdate::new().sections(sections));
//!
//! assert_eq!(store.get_active_workspace().unwrap().coverage_stats.ingested, 100);
//! ```

#![warn(missing_docs)]

pub mod coverage;
pub mod error;
pub mod storage;
pub mod store;

pub use coverage::compute_coverage;
pub use error::StoreError;
pub use storage::{
    JsonFileStorage, MemoryStorage, PersistedState, StateStorage, DEFAULT_STATE_FILE,
    STATE_VERSION,
};
pub use store::{merge_workspace, WorkspaceStore, WorkspaceUpdate};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
