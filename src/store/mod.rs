//! Flat-file persistence
//!
//! One JSON file per document, replaced atomically (temp file + rename) and
//! written under a per-key async lock:
//! - `transcripts/<conversation id>.json` - conversation transcripts
//! - `articles/<uuid>.json` - blog articles

mod articles;
mod atomic;
mod documents;
mod error;
mod locks;
mod transcripts;

pub use articles::{Article, ArticleStore};
pub use atomic::{write_atomic, StagedWrite};
pub use documents::DocumentDir;
pub use error::{StoreError, StoreResult};
pub use locks::{KeyGuard, KeyedLocks};
pub use transcripts::{
    finished_patch, Mode, Phase, Role, Transcript, TranscriptStore, TranscriptSummary, Turn,
};
