//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use crate::core::corpus::{Book, Chapter, Corpus, CorpusIndex, Verse};

/// Builds a book whose chapters have the given verse counts.
/// Chapters are numbered from 1, verses from 1.
pub fn book(name: &str, verse_counts: &[usize]) -> Book {
    Book {
        name: name.to_string(),
        chapters: verse_counts
            .iter()
            .enumerate()
            .map(|(i, &verses)| Chapter {
                number: i as u32 + 1,
                verses: (1..=verses as u32)
                    .map(|number| Verse {
                        number,
                        text: format!("{name} {}:{number}", i + 1),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Two books, one per part: 2 chapters (1 and 2 verses), then 1 chapter (1 verse).
pub fn small_corpus() -> Corpus {
    Corpus::new(vec![book("Genesis", &[1, 2])], vec![book("Exodus", &[1])])
}

/// Four books across both parts, eight chapters in total.
pub fn sample_corpus() -> Corpus {
    Corpus::new(
        vec![book("Genesis", &[3, 2, 4]), book("Exodus", &[2, 2])],
        vec![book("Matthew", &[5, 1]), book("Jude", &[3])],
    )
}

pub fn sample_index() -> Arc<CorpusIndex> {
    Arc::new(CorpusIndex::new(sample_corpus()))
}

pub fn small_index() -> Arc<CorpusIndex> {
    Arc::new(CorpusIndex::new(small_corpus()))
}
