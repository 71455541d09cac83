//! # Chapter Window Fetcher
//!
//! Pulls a contiguous run of chapters out of the corpus, starting from a
//! cursor, in either direction.
//!
//! ```text
//!            backward                      forward
//!      ◄── prev_cursor │ chapters │ start │ chapters │ next_cursor ──►
//! ```
//!
//! Both directions treat their cursor as a boundary: forward reads *from*
//! `start` inclusive, backward reads the chapters strictly *before* `start`.
//! Feeding a returned cursor into the next call of the same direction never
//! skips or repeats a chapter.

use log::debug;
use serde::Serialize;

use crate::core::corpus::{CorpusError, CorpusIndex, FlatChapterRef, Verse};

/// A chapter plus its address, ready for a display layer.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoadedChapter {
    pub book_name: String,
    pub book_index: usize,
    pub chapter_number: u32,
    pub chapter_index: usize,
    pub verses: Vec<Verse>,
}

impl LoadedChapter {
    pub fn address(&self) -> FlatChapterRef {
        FlatChapterRef::new(self.book_index, self.chapter_index)
    }

    /// Heading as shown to a reader, e.g. "Genesis 1".
    pub fn title(&self) -> String {
        format!("{} {}", self.book_name, self.chapter_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardPage {
    pub chapters: Vec<LoadedChapter>,
    /// The chapter right after the last one returned, or past-the-end.
    pub next_cursor: FlatChapterRef,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackwardPage {
    /// Ascending reading order.
    pub chapters: Vec<LoadedChapter>,
    /// Boundary for the next backward fetch: the earliest chapter returned
    /// (or `start` itself when nothing was returned).
    pub prev_cursor: FlatChapterRef,
    pub has_prev: bool,
}

fn project(index: &CorpusIndex, at: FlatChapterRef) -> Result<LoadedChapter, CorpusError> {
    let book = index.book_at(at.book_index)?;
    let chapter = index.chapter_at(at.book_index, at.chapter_index)?;
    Ok(LoadedChapter {
        book_name: book.name.clone(),
        book_index: at.book_index,
        chapter_number: chapter.number,
        chapter_index: at.chapter_index,
        verses: chapter.verses.clone(),
    })
}

/// Collects up to `count` chapters starting at `start`.
///
/// A `start` past the last chapter yields an empty page with `has_more = false`.
pub fn fetch_forward(
    index: &CorpusIndex,
    start: FlatChapterRef,
    count: usize,
) -> Result<ForwardPage, CorpusError> {
    let mut cursor = index.normalize(start);
    let mut chapters = Vec::with_capacity(count);

    while chapters.len() < count && !index.is_end(cursor) {
        chapters.push(project(index, cursor)?);
        cursor = index.chapter_after(cursor);
    }

    debug!(
        "fetch_forward from {} took {} chapters, next cursor {}",
        start,
        chapters.len(),
        cursor
    );

    Ok(ForwardPage {
        chapters,
        next_cursor: cursor,
        has_more: !index.is_end(cursor),
    })
}

/// Collects up to `count` chapters immediately before `start`, returned in
/// ascending order.
pub fn fetch_backward(
    index: &CorpusIndex,
    start: FlatChapterRef,
    count: usize,
) -> Result<BackwardPage, CorpusError> {
    let mut cursor = if index.is_end(start) { index.end() } else { start };
    let mut chapters = Vec::with_capacity(count);

    while chapters.len() < count {
        let Some(prev) = index.chapter_before(cursor) else {
            break;
        };
        chapters.push(project(index, prev)?);
        cursor = prev;
    }
    chapters.reverse();

    let has_prev = index.chapter_before(cursor).is_some();
    debug!(
        "fetch_backward from {} took {} chapters, prev cursor {} (has_prev={})",
        start,
        chapters.len(),
        cursor,
        has_prev
    );

    Ok(BackwardPage {
        chapters,
        prev_cursor: cursor,
        has_prev,
    })
}
