//! # Window Buffer
//!
//! Owns the contiguous run of chapters a reader currently has loaded and
//! grows it in either direction.
//!
//! ```text
//! WindowState
//! ├── loaded_chapters: Vec<LoadedChapter>  // contiguous, no duplicates
//! ├── backward_cursor: FlatChapterRef      // first loaded chapter (scan below it)
//! ├── forward_cursor: FlatChapterRef       // chapter after the last loaded one
//! ├── has_prev / has_more: bool            // anything left in that direction
//! ├── backward_busy / forward_busy: bool   // one fetch in flight per direction
//! └── generation: u64                      // bumped by initialize / jump_to
//! ```
//!
//! Every extension is split in two steps so the fetch itself runs without
//! holding the lock:
//!
//! ```text
//! begin(dir)  ── test-and-set busy, capture cursor + generation
//!    │
//! fetch       ── pure read of the CorpusIndex
//!    │
//! apply       ── generation still current? splice chapters in : drop result
//! ```
//!
//! `PendingFetch` clears its busy flag when dropped, so a fetch that never
//! reaches `apply` cannot wedge its direction.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::Serialize;

use crate::core::config::ResolvedConfig;
use crate::core::corpus::{CorpusError, CorpusIndex, FlatChapterRef};
use crate::core::fetch::{BackwardPage, ForwardPage, LoadedChapter, fetch_backward, fetch_forward};
use crate::core::seek::plan_seek;

/// Chapters loaded per `load_more` / `load_previous` call unless configured.
pub const DEFAULT_BATCH_SIZE: usize = 3;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowState {
    pub loaded_chapters: Vec<LoadedChapter>,
    pub forward_cursor: FlatChapterRef,
    pub backward_cursor: FlatChapterRef,
    pub has_more: bool,
    pub has_prev: bool,
    pub forward_busy: bool,
    pub backward_busy: bool,
    pub generation: u64,
}

impl WindowState {
    /// Position of a chapter inside `loaded_chapters`.
    pub fn position_of(&self, address: FlatChapterRef) -> Option<usize> {
        self.loaded_chapters
            .iter()
            .position(|c| c.address() == address)
    }

    /// True when the loaded chapters form one gap-free, duplicate-free run in
    /// reading order and both cursors sit right at its edges.
    pub fn is_consistent(&self, index: &CorpusIndex) -> bool {
        let contiguous = self
            .loaded_chapters
            .windows(2)
            .all(|pair| index.chapter_after(pair[0].address()) == pair[1].address());
        let edges = match (self.loaded_chapters.first(), self.loaded_chapters.last()) {
            (Some(first), Some(last)) => {
                first.address() == self.backward_cursor
                    && index.chapter_after(last.address()) == self.forward_cursor
            }
            _ => true,
        };
        let earlier = index.chapter_before(self.backward_cursor).is_some();
        let prev_exact = if self.loaded_chapters.is_empty() {
            !self.has_prev || earlier
        } else {
            self.has_prev == earlier
        };
        let flags = self.has_more == !index.is_end(self.forward_cursor) && prev_exact;
        contiguous && edges && flags
    }
}

/// Result of `jump_to`: the new window plus where the target landed in it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct JumpOutcome {
    pub window: WindowState,
    pub target: FlatChapterRef,
    /// `None` means the caller should fall back to the top of the window.
    pub target_position: Option<usize>,
}

enum Page {
    Forward(ForwardPage),
    Backward(BackwardPage),
}

/// An extension that has claimed its direction's busy flag.
pub struct PendingFetch<'a> {
    buffer: &'a WindowBuffer,
    direction: Direction,
    cursor: FlatChapterRef,
    generation: u64,
    armed: bool,
}

impl PendingFetch<'_> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cursor(&self) -> FlatChapterRef {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.buffer.state();
        if state.generation == self.generation {
            warn!("{:?} fetch abandoned before completion", self.direction);
            set_busy(&mut state, self.direction, false);
        }
    }
}

fn set_busy(state: &mut WindowState, direction: Direction, busy: bool) {
    match direction {
        Direction::Forward => state.forward_busy = busy,
        Direction::Backward => state.backward_busy = busy,
    }
}

/// Session-scoped owner of the loaded window. Shareable across threads.
pub struct WindowBuffer {
    index: Arc<CorpusIndex>,
    batch_size: usize,
    state: Mutex<WindowState>,
}

impl WindowBuffer {
    pub fn new(index: Arc<CorpusIndex>, batch_size: usize) -> Self {
        Self {
            index,
            batch_size: batch_size.max(1),
            state: Mutex::new(WindowState::default()),
        }
    }

    pub fn from_config(index: Arc<CorpusIndex>, config: &ResolvedConfig) -> Self {
        Self::new(index, config.batch_size)
    }

    pub fn index(&self) -> &Arc<CorpusIndex> {
        &self.index
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn snapshot(&self) -> WindowState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the session with a window over the first `start_count` chapters.
    pub fn initialize(&self, start_count: usize) -> Result<WindowState, CorpusError> {
        let page = fetch_forward(&self.index, FlatChapterRef::START, start_count)?;
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = WindowState {
            backward_cursor: page
                .chapters
                .first()
                .map(LoadedChapter::address)
                .unwrap_or(FlatChapterRef::START),
            forward_cursor: page.next_cursor,
            has_more: page.has_more,
            has_prev: false,
            loaded_chapters: page.chapters,
            forward_busy: false,
            backward_busy: false,
            generation,
        };
        info!(
            "Window initialized with {} chapters (generation {})",
            state.loaded_chapters.len(),
            generation
        );
        Ok(state.clone())
    }

    /// Appends the next batch. No-op while a forward fetch is in flight or
    /// when the corpus is exhausted.
    pub fn load_more(&self) -> Result<WindowState, CorpusError> {
        match self.begin(Direction::Forward) {
            Some(pending) => self.run(pending),
            None => Ok(self.snapshot()),
        }
    }

    /// Prepends the previous batch. No-op while a backward fetch is in
    /// flight or when the window already starts at the first chapter.
    pub fn load_previous(&self) -> Result<WindowState, CorpusError> {
        match self.begin(Direction::Backward) {
            Some(pending) => self.run(pending),
            None => Ok(self.snapshot()),
        }
    }

    /// Claims `direction` for one fetch. Returns `None` when that direction is
    /// already busy or has nothing left to load.
    pub fn begin(&self, direction: Direction) -> Option<PendingFetch<'_>> {
        let mut state = self.state();
        let (busy, available, cursor) = match direction {
            Direction::Forward => (state.forward_busy, state.has_more, state.forward_cursor),
            Direction::Backward => (state.backward_busy, state.has_prev, state.backward_cursor),
        };
        if busy {
            debug!("{direction:?} load ignored: fetch already in flight");
            return None;
        }
        if !available {
            debug!("{direction:?} load ignored: nothing left in that direction");
            return None;
        }
        set_busy(&mut state, direction, true);
        Some(PendingFetch {
            buffer: self,
            direction,
            cursor,
            generation: state.generation,
            armed: true,
        })
    }

    /// Performs the fetch claimed by `pending` and applies it.
    pub fn run(&self, pending: PendingFetch<'_>) -> Result<WindowState, CorpusError> {
        let page = match pending.direction {
            Direction::Forward => {
                fetch_forward(&self.index, pending.cursor, self.batch_size).map(Page::Forward)
            }
            Direction::Backward => {
                fetch_backward(&self.index, pending.cursor, self.batch_size).map(Page::Backward)
            }
        };
        self.apply(pending, page)
    }

    fn apply(
        &self,
        mut pending: PendingFetch<'_>,
        page: Result<Page, CorpusError>,
    ) -> Result<WindowState, CorpusError> {
        pending.armed = false;
        let mut state = self.state();

        if state.generation != pending.generation {
            debug!(
                "Discarding stale {:?} fetch (generation {} != {})",
                pending.direction, pending.generation, state.generation
            );
            return Ok(state.clone());
        }
        set_busy(&mut state, pending.direction, false);

        match page? {
            Page::Forward(page) => {
                debug!(
                    "Appending {} chapters, forward cursor {} -> {}",
                    page.chapters.len(),
                    state.forward_cursor,
                    page.next_cursor
                );
                if state.loaded_chapters.is_empty()
                    && let Some(first) = page.chapters.first()
                {
                    state.backward_cursor = first.address();
                }
                state.loaded_chapters.extend(page.chapters);
                state.forward_cursor = page.next_cursor;
                state.has_more = page.has_more;
            }
            Page::Backward(page) => {
                if page.chapters.is_empty() {
                    debug!("Backward fetch returned nothing, clamping has_prev");
                    state.has_prev = false;
                } else {
                    debug!(
                        "Prepending {} chapters, backward cursor {} -> {}",
                        page.chapters.len(),
                        state.backward_cursor,
                        page.prev_cursor
                    );
                    let mut chapters = page.chapters;
                    chapters.append(&mut state.loaded_chapters);
                    state.loaded_chapters = chapters;
                    state.backward_cursor = page.prev_cursor;
                    state.has_prev = page.has_prev;
                }
            }
        }
        Ok(state.clone())
    }

    /// Replaces the session with a window anchored `lookback` chapters above
    /// `target`, `window_count` chapters long.
    pub fn jump_to(
        &self,
        target: FlatChapterRef,
        lookback: usize,
        window_count: usize,
    ) -> Result<JumpOutcome, CorpusError> {
        let seek_start = plan_seek(&self.index, target, lookback);
        let page = fetch_forward(&self.index, seek_start, window_count)?;
        let backward_cursor = page
            .chapters
            .first()
            .map(LoadedChapter::address)
            .unwrap_or(page.next_cursor);
        let has_prev = self.index.chapter_before(backward_cursor).is_some();

        let mut state = self.state();
        let generation = state.generation + 1;
        *state = WindowState {
            loaded_chapters: page.chapters,
            forward_cursor: page.next_cursor,
            backward_cursor,
            has_more: page.has_more,
            has_prev,
            forward_busy: false,
            backward_busy: false,
            generation,
        };

        let target_position = state.position_of(target);
        if target_position.is_none() {
            warn!("Jump target {target} not inside loaded window, showing window top");
        }
        info!(
            "Jumped to {} (seek start {}, {} chapters, generation {})",
            target,
            seek_start,
            state.loaded_chapters.len(),
            generation
        );

        Ok(JumpOutcome {
            window: state.clone(),
            target,
            target_position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_index, small_index};

    fn addresses(state: &WindowState) -> Vec<(usize, usize)> {
        state
            .loaded_chapters
            .iter()
            .map(|c| (c.book_index, c.chapter_index))
            .collect()
    }

    #[test]
    fn test_initialize_loads_whole_small_corpus() {
        let buffer = WindowBuffer::new(small_index(), 3);
        let state = buffer.initialize(3).unwrap();
        assert_eq!(addresses(&state), vec![(0, 0), (0, 1), (1, 0)]);
        assert!(!state.has_more);
        assert!(!state.has_prev);

        let after = buffer.load_more().unwrap();
        assert_eq!(after, state);
    }

    #[test]
    fn test_load_more_appends_contiguously() {
        let index = sample_index();
        let buffer = WindowBuffer::new(index.clone(), 3);
        buffer.initialize(2).unwrap();
        let state = buffer.load_more().unwrap();
        assert_eq!(
            addresses(&state),
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1)]
        );
        assert!(state.has_more);
        assert!(state.is_consistent(&index));

        let state = buffer.load_more().unwrap();
        assert_eq!(state.loaded_chapters.len(), 8);
        assert!(!state.has_more);
        assert_eq!(state.forward_cursor, index.end());
        assert!(state.is_consistent(&index));
    }

    #[test]
    fn test_load_previous_after_jump() {
        let index = sample_index();
        let buffer = WindowBuffer::new(index.clone(), 2);
        let outcome = buffer.jump_to(FlatChapterRef::new(3, 0), 0, 1).unwrap();
        assert_eq!(outcome.target_position, Some(0));
        assert!(outcome.window.has_prev);
        assert!(!outcome.window.has_more);

        let state = buffer.load_previous().unwrap();
        assert_eq!(addresses(&state), vec![(2, 0), (2, 1), (3, 0)]);
        assert!(state.has_prev);

        let state = buffer.load_previous().unwrap();
        assert_eq!(addresses(&state).first(), Some(&(1, 0)));
        assert!(state.is_consistent(&index));
    }

    #[test]
    fn test_load_previous_until_start() {
        let index = sample_index();
        let buffer = WindowBuffer::new(index.clone(), 3);
        buffer.jump_to(FlatChapterRef::new(1, 1), 0, 1).unwrap();
        let state = buffer.load_previous().unwrap();
        assert_eq!(addresses(&state), vec![(0, 1), (0, 2), (1, 0), (1, 1)]);
        assert!(state.has_prev);
        let state = buffer.load_previous().unwrap();
        assert_eq!(addresses(&state).first(), Some(&(0, 0)));
        assert!(!state.has_prev);
        assert_eq!(buffer.load_previous().unwrap(), state);
    }

    #[test]
    fn test_load_previous_noop_after_initialize() {
        let buffer = WindowBuffer::new(sample_index(), 3);
        let state = buffer.initialize(3).unwrap();
        assert_eq!(buffer.load_previous().unwrap(), state);
    }

    #[test]
    fn test_jump_clamps_and_loads_everything() {
        let buffer = WindowBuffer::new(small_index(), 3);
        buffer.initialize(1).unwrap();
        let outcome = buffer.jump_to(FlatChapterRef::new(1, 0), 2, 5).unwrap();
        assert_eq!(addresses(&outcome.window), vec![(0, 0), (0, 1), (1, 0)]);
        assert!(!outcome.window.has_prev);
        assert!(!outcome.window.has_more);
        assert_eq!(outcome.target_position, Some(2));
    }

    #[test]
    fn test_jump_target_outside_window() {
        let buffer = WindowBuffer::new(sample_index(), 3);
        let outcome = buffer.jump_to(FlatChapterRef::new(2, 0), 3, 2).unwrap();
        assert_eq!(outcome.target_position, None);
        assert_eq!(addresses(&outcome.window), vec![(0, 2), (1, 0)]);
    }

    #[test]
    fn test_busy_direction_ignores_second_request() {
        let buffer = WindowBuffer::new(sample_index(), 2);
        let initial = buffer.initialize(2).unwrap();

        let pending = buffer.begin(Direction::Forward).unwrap();
        assert!(buffer.snapshot().forward_busy);
        assert!(buffer.begin(Direction::Forward).is_none());
        assert_eq!(buffer.load_more().unwrap().loaded_chapters, initial.loaded_chapters);

        let state = buffer.run(pending).unwrap();
        assert!(!state.forward_busy);
        assert_eq!(state.loaded_chapters.len(), 4);
    }

    #[test]
    fn test_directions_are_independent() {
        let buffer = WindowBuffer::new(sample_index(), 1);
        buffer.jump_to(FlatChapterRef::new(1, 0), 0, 1).unwrap();
        let forward = buffer.begin(Direction::Forward).unwrap();
        let backward = buffer.begin(Direction::Backward).unwrap();
        assert_eq!(backward.cursor(), FlatChapterRef::new(1, 0));
        buffer.run(backward).unwrap();
        let state = buffer.run(forward).unwrap();
        assert_eq!(addresses(&state), vec![(0, 2), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_stale_fetch_is_discarded_after_jump() {
        let buffer = WindowBuffer::new(sample_index(), 2);
        buffer.initialize(2).unwrap();
        let pending = buffer.begin(Direction::Forward).unwrap();
        assert_eq!(pending.generation(), 1);

        let jumped = buffer.jump_to(FlatChapterRef::new(2, 0), 0, 2).unwrap();
        let state = buffer.run(pending).unwrap();
        assert_eq!(state, jumped.window);
        assert!(!state.forward_busy);
    }

    #[test]
    fn test_dropped_fetch_releases_busy_flag() {
        let buffer = WindowBuffer::new(sample_index(), 2);
        buffer.initialize(2).unwrap();
        {
            let _pending = buffer.begin(Direction::Forward).unwrap();
            assert!(buffer.snapshot().forward_busy);
        }
        assert!(!buffer.snapshot().forward_busy);
        assert!(buffer.begin(Direction::Forward).is_some());
    }

    #[test]
    fn test_concurrent_directions_keep_window_consistent() {
        let index = sample_index();
        let buffer = WindowBuffer::new(index.clone(), 1);
        buffer.jump_to(FlatChapterRef::new(1, 1), 0, 1).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..5 {
                    buffer.load_more().unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..5 {
                    buffer.load_previous().unwrap();
                }
            });
        });

        let state = buffer.snapshot();
        assert_eq!(state.loaded_chapters.len(), 8);
        assert!(state.is_consistent(&index));
    }

    #[test]
    fn test_failed_fetch_leaves_window_unchanged() {
        let buffer = WindowBuffer::new(sample_index(), 2);
        let before = buffer.initialize(2).unwrap();

        let pending = buffer.begin(Direction::Forward).unwrap();
        let err = CorpusError::OutOfRange {
            book_index: 9,
            chapter_index: Some(0),
        };
        let result = buffer.apply(pending, Err(err.clone()));
        assert_eq!(result, Err(err));
        assert_eq!(buffer.snapshot(), before);
        assert!(buffer.begin(Direction::Forward).is_some());
    }

    #[test]
    fn test_empty_backward_page_clamps_has_prev() {
        let buffer = WindowBuffer::new(sample_index(), 2);
        buffer.initialize(2).unwrap();
        buffer.state().has_prev = true;

        let state = buffer.load_previous().unwrap();
        assert!(!state.has_prev);
        assert!(!state.backward_busy);
        assert_eq!(addresses(&state), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_consistency_requires_exact_has_prev() {
        let index = sample_index();
        let buffer = WindowBuffer::new(index.clone(), 2);
        let mut state = buffer.jump_to(FlatChapterRef::new(1, 0), 0, 2).unwrap().window;
        assert!(state.is_consistent(&index));

        state.has_prev = false;
        assert!(!state.is_consistent(&index));

        let mut state = buffer.initialize(2).unwrap();
        state.has_prev = true;
        assert!(!state.is_consistent(&index));
    }

    #[test]
    fn test_empty_corpus() {
        let index = Arc::new(CorpusIndex::new(Default::default()));
        let buffer = WindowBuffer::new(index, 3);
        let state = buffer.initialize(3).unwrap();
        assert!(state.loaded_chapters.is_empty());
        assert!(!state.has_more);
        assert!(!state.has_prev);
        let outcome = buffer.jump_to(FlatChapterRef::new(3, 0), 2, 5).unwrap();
        assert!(outcome.window.loaded_chapters.is_empty());
        assert_eq!(outcome.target_position, None);
    }
}
