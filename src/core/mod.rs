//! # Core Reading Engine
//!
//! This module contains Lectio's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • CorpusIndex          │
//!                    │  • fetch / seek         │
//!                    │  • WindowBuffer         │
//!                    │  • citation::resolve    │
//!                    │                         │
//!                    │  No rendering. No UI.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │   reader   │      │    CLI     │      │  Web / UI  │
//!     │  (tokio)   │      │  (clap)    │      │  (future)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`corpus`]: the data model, `CorpusIndex`, `FlatChapterRef`
//! - [`fetch`]: forward/backward chapter runs
//! - [`seek`]: start address for a jump window
//! - [`window`]: `WindowBuffer`, the loaded window and its cursors
//! - [`citation`]: selection → "Genesis 1:1-3, 5"
//! - [`config`]: `~/.lectio/config.toml` and its resolution

pub mod citation;
pub mod config;
pub mod corpus;
pub mod fetch;
pub mod seek;
pub mod window;

// Re-export commonly used types for convenience
pub use citation::{SelectedVerse, resolve};
pub use corpus::{Book, Chapter, Corpus, CorpusError, CorpusIndex, FlatChapterRef, Verse};
pub use fetch::LoadedChapter;
pub use window::{Direction, JumpOutcome, WindowBuffer, WindowState};
