//! # Corpus
//!
//! The in-memory text collection and the flattened view used to address it.
//!
//! ```text
//! Corpus
//! ├── first_part: Vec<Book>     // "ot" in the source file
//! └── second_part: Vec<Book>    // "nt" in the source file
//!
//! flat index:  0 .. |first_part| .. |first_part| + |second_part|
//!              └── first_part ──┘└────── second_part ──────────┘
//! ```
//!
//! A chapter is only ever addressed by `FlatChapterRef` (flat book index,
//! chapter position inside that book). The `number` fields are for display.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// Data Model
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub number: u32,
    pub verses: Vec<Verse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub name: String,
    pub chapters: Vec<Chapter>,
}

/// The whole collection, split in two parts that concatenate for flat addressing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    #[serde(rename = "ot_contents", default, skip_serializing_if = "Option::is_none")]
    pub first_contents: Option<Vec<String>>,
    #[serde(rename = "ot", default)]
    pub first_part: Vec<Book>,
    #[serde(rename = "nt_contents", default, skip_serializing_if = "Option::is_none")]
    pub second_contents: Option<Vec<String>>,
    #[serde(rename = "nt", default)]
    pub second_part: Vec<Book>,
}

impl Corpus {
    pub fn new(first_part: Vec<Book>, second_part: Vec<Book>) -> Self {
        Self {
            first_contents: None,
            first_part,
            second_contents: None,
            second_part,
        }
    }

    /// Parses the JSON source format (`{ ot, nt, ot_contents?, nt_contents? }`).
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(LoadError::Parse)
    }

    /// Tables of contents for both parts. Falls back to the book names when
    /// the source did not ship its own.
    pub fn contents(&self) -> (Vec<String>, Vec<String>) {
        let names = |books: &[Book]| books.iter().map(|b| b.name.clone()).collect();
        (
            self.first_contents
                .clone()
                .unwrap_or_else(|| names(&self.first_part)),
            self.second_contents
                .clone()
                .unwrap_or_else(|| names(&self.second_part)),
        )
    }
}

/// Load a corpus from a JSON file on disk.
pub fn load_corpus(path: &Path) -> Result<Corpus, LoadError> {
    let json = fs::read_to_string(path).map_err(LoadError::Io)?;
    let corpus = Corpus::from_json_str(&json)?;
    info!(
        "Loaded corpus from {} ({} + {} books)",
        path.display(),
        corpus.first_part.len(),
        corpus.second_part.len()
    );
    Ok(corpus)
}

// ============================================================================
// Addressing
// ============================================================================

/// Address of one chapter: flat book index plus chapter position in the book.
///
/// Ordering is reading order. `(total_books, 0)` is the past-the-end cursor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlatChapterRef {
    pub book_index: usize,
    pub chapter_index: usize,
}

impl FlatChapterRef {
    /// First chapter of the corpus.
    pub const START: FlatChapterRef = FlatChapterRef::new(0, 0);

    pub const fn new(book_index: usize, chapter_index: usize) -> Self {
        Self {
            book_index,
            chapter_index,
        }
    }
}

impl fmt::Display for FlatChapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.book_index, self.chapter_index)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Indexing past the corpus bounds. Cursor arithmetic should never produce
/// this, so it is surfaced to the caller as a defect rather than clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    OutOfRange {
        book_index: usize,
        chapter_index: Option<usize>,
    },
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusError::OutOfRange {
                book_index,
                chapter_index: Some(chapter),
            } => write!(f, "chapter {chapter} of book {book_index} is out of range"),
            CorpusError::OutOfRange {
                book_index,
                chapter_index: None,
            } => write!(f, "book {book_index} is out of range"),
        }
    }
}

impl std::error::Error for CorpusError {}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "corpus I/O error: {e}"),
            LoadError::Parse(e) => write!(f, "corpus parse error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

// ============================================================================
// CorpusIndex
// ============================================================================

/// Read-only flattened view over a loaded `Corpus`.
///
/// Immutable after construction, so it can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    corpus: Corpus,
}

impl CorpusIndex {
    pub fn new(corpus: Corpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn total_books(&self) -> usize {
        self.corpus.first_part.len() + self.corpus.second_part.len()
    }

    pub fn book_at(&self, flat_index: usize) -> Result<&Book, CorpusError> {
        let first = self.corpus.first_part.len();
        let book = if flat_index < first {
            self.corpus.first_part.get(flat_index)
        } else {
            self.corpus.second_part.get(flat_index - first)
        };
        book.ok_or(CorpusError::OutOfRange {
            book_index: flat_index,
            chapter_index: None,
        })
    }

    pub fn chapter_count_of(&self, flat_index: usize) -> Result<usize, CorpusError> {
        Ok(self.book_at(flat_index)?.chapters.len())
    }

    pub fn chapter_at(
        &self,
        flat_index: usize,
        chapter_index: usize,
    ) -> Result<&Chapter, CorpusError> {
        self.book_at(flat_index)?
            .chapters
            .get(chapter_index)
            .ok_or(CorpusError::OutOfRange {
                book_index: flat_index,
                chapter_index: Some(chapter_index),
            })
    }

    /// Past-the-end cursor.
    pub fn end(&self) -> FlatChapterRef {
        FlatChapterRef::new(self.total_books(), 0)
    }

    pub fn is_end(&self, at: FlatChapterRef) -> bool {
        at.book_index >= self.total_books()
    }

    /// Moves `at` forward onto the first real chapter at or after it,
    /// skipping exhausted and empty books. Returns `end()` when none is left.
    pub fn normalize(&self, at: FlatChapterRef) -> FlatChapterRef {
        let mut book = at.book_index;
        let mut chapter = at.chapter_index;
        while book < self.total_books() {
            if chapter < self.chapters_in(book) {
                return FlatChapterRef::new(book, chapter);
            }
            book += 1;
            chapter = 0;
        }
        self.end()
    }

    /// The chapter immediately after `at` in reading order (may be `end()`).
    pub fn chapter_after(&self, at: FlatChapterRef) -> FlatChapterRef {
        if self.is_end(at) {
            return self.end();
        }
        self.normalize(FlatChapterRef::new(at.book_index, at.chapter_index + 1))
    }

    /// The chapter immediately before `at` in reading order, or `None` when
    /// `at` is at or before the first chapter of the corpus.
    pub fn chapter_before(&self, at: FlatChapterRef) -> Option<FlatChapterRef> {
        let at = if self.is_end(at) { self.end() } else { at };
        let count = self.chapters_in(at.book_index);
        if at.chapter_index > 0 && count > 0 {
            return Some(FlatChapterRef::new(
                at.book_index,
                (at.chapter_index - 1).min(count - 1),
            ));
        }
        let mut book = at.book_index;
        while book > 0 {
            book -= 1;
            let count = self.chapters_in(book);
            if count > 0 {
                debug!("Stepped back across book boundary into book {book}");
                return Some(FlatChapterRef::new(book, count - 1));
            }
        }
        None
    }

    /// Flat index of a book by name. Exact match first, then ASCII case-insensitive.
    pub fn find_book(&self, name: &str) -> Option<usize> {
        let books = || {
            self.corpus
                .first_part
                .iter()
                .chain(self.corpus.second_part.iter())
        };
        books()
            .position(|b| b.name == name)
            .or_else(|| books().position(|b| b.name.eq_ignore_ascii_case(name)))
    }

    /// Chapter count that treats out-of-range books as empty.
    pub(crate) fn chapters_in(&self, flat_index: usize) -> usize {
        self.chapter_count_of(flat_index).unwrap_or(0)
    }
}
