//! # Seek Planner
//!
//! Picks where a jump window should start so the target has some
//! context loaded above it.

use log::debug;

use crate::core::corpus::{CorpusIndex, FlatChapterRef};

/// Returns the address `lookback` chapters before `target`, clamped to the
/// first chapter of the corpus. Never fails.
///
/// A `target` beyond the corpus is treated as the past-the-end cursor.
pub fn plan_seek(index: &CorpusIndex, target: FlatChapterRef, lookback: usize) -> FlatChapterRef {
    if lookback == 0 {
        return target;
    }

    let target = if index.is_end(target) { index.end() } else { target };
    let mut book = target.book_index;
    // Negative while the lookback still reaches into earlier books.
    let mut remaining = target.chapter_index as isize - lookback as isize;

    while remaining < 0 {
        if book == 0 {
            debug!("Seek from {target} by {lookback} clamped to corpus start");
            return FlatChapterRef::START;
        }
        book -= 1;
        remaining += index.chapters_in(book) as isize;
    }

    let start = index.normalize(FlatChapterRef::new(book, remaining as usize));
    debug!("Seek from {target} by {lookback} starts at {start}");
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{book, sample_index, small_index};
    use crate::core::corpus::Corpus;

    #[test]
    fn test_zero_lookback_returns_target() {
        let index = sample_index();
        let target = FlatChapterRef::new(2, 1);
        assert_eq!(plan_seek(&index, target, 0), target);
    }

    #[test]
    fn test_lookback_within_book() {
        let index = sample_index();
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(0, 2), 2),
            FlatChapterRef::START
        );
    }

    #[test]
    fn test_lookback_across_books() {
        let index = sample_index();
        // (2,0) ← (1,1) ← (1,0) ← (0,2)
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(2, 0), 3),
            FlatChapterRef::new(0, 2)
        );
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(3, 0), 1),
            FlatChapterRef::new(2, 1)
        );
    }

    #[test]
    fn test_lookback_clamps_at_start() {
        let index = small_index();
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(1, 0), 2),
            FlatChapterRef::START
        );
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(1, 0), 50),
            FlatChapterRef::START
        );
    }

    #[test]
    fn test_lookback_skips_empty_books() {
        let corpus = Corpus::new(
            vec![book("A", &[1, 1]), book("Empty", &[])],
            vec![book("B", &[1])],
        );
        let index = CorpusIndex::new(corpus);
        assert_eq!(
            plan_seek(&index, FlatChapterRef::new(2, 0), 1),
            FlatChapterRef::new(0, 1)
        );
    }

    #[test]
    fn test_never_before_start() {
        let index = sample_index();
        for book in 0..index.total_books() {
            for chapter in 0..index.chapter_count_of(book).unwrap() {
                for lookback in 0..12 {
                    let start = plan_seek(&index, FlatChapterRef::new(book, chapter), lookback);
                    assert!(start <= FlatChapterRef::new(book, chapter));
                    assert!(index.chapter_at(start.book_index, start.chapter_index).is_ok());
                }
            }
        }
    }
}
