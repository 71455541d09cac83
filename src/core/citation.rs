//! # Citations
//!
//! Turns a set of selected verses into a compact reference string.
//!
//! ```text
//! Genesis 1:1, Genesis 1:2, Genesis 1:3, Genesis 1:5, Exodus 2:4
//!        │ group by (book, chapter), first-seen order
//!        ▼
//! Genesis 1 → [1, 2, 3, 5]     Exodus 2 → [4]
//!        │ sort, dedup, collapse consecutive runs
//!        ▼
//! "Genesis 1:1-3, 5; Exodus 2:4"
//! ```
//!
//! Input is assumed validated (verse numbers ≥ 1). Stateless.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One selected verse as tagged by the display layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectedVerse {
    pub book: String,
    pub chapter: String,
    pub verse: u32,
}

impl SelectedVerse {
    pub fn new(book: impl Into<String>, chapter: impl Into<String>, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter: chapter.into(),
            verse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationParseError(pub String);

impl fmt::Display for CitationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid verse reference '{}' (expected '<book> <chapter>:<verse>')",
            self.0
        )
    }
}

impl std::error::Error for CitationParseError {}

/// Parses a single `"<book> <chapter>:<verse>"` reference. Book names may
/// contain spaces ("1 Kings 2:3"); the last space separates the chapter.
impl FromStr for SelectedVerse {
    type Err = CitationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CitationParseError(s.to_string());
        let (book, location) = s.trim().rsplit_once(' ').ok_or_else(err)?;
        let (chapter, verse) = location.split_once(':').ok_or_else(err)?;
        let verse: u32 = verse.parse().map_err(|_| err())?;
        let book = book.trim();
        if book.is_empty() || chapter.is_empty() || verse == 0 {
            return Err(err());
        }
        Ok(SelectedVerse::new(book, chapter, verse))
    }
}

/// Collapses sorted, deduplicated numbers into "a-b" / "a" runs.
fn compress(verses: &[u32]) -> String {
    let mut ranges: Vec<String> = Vec::new();
    let mut iter = verses.iter().copied();
    let Some(mut start) = iter.next() else {
        return String::new();
    };
    let mut end = start;

    for verse in iter {
        if verse == end + 1 {
            end = verse;
            continue;
        }
        ranges.push(render_range(start, end));
        start = verse;
        end = verse;
    }
    ranges.push(render_range(start, end));
    ranges.join(", ")
}

fn render_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Resolves a selection to its canonical citation. Empty selection → "".
pub fn resolve(selection: &[SelectedVerse]) -> String {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut groups: HashMap<(&str, &str), Vec<u32>> = HashMap::new();

    for entry in selection {
        let key = (entry.book.as_str(), entry.chapter.as_str());
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(entry.verse);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let mut verses = groups.remove(&key)?;
            verses.sort_unstable();
            verses.dedup();
            Some(format!("{} {}:{}", key.0, key.1, compress(&verses)))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(book: &str, chapter: &str, verse: u32) -> SelectedVerse {
        SelectedVerse::new(book, chapter, verse)
    }

    #[test]
    fn test_single_group_with_range_and_gap() {
        let selection = vec![
            sel("Genesis", "1", 1),
            sel("Genesis", "1", 2),
            sel("Genesis", "1", 3),
            sel("Genesis", "1", 5),
        ];
        assert_eq!(resolve(&selection), "Genesis 1:1-3, 5");
    }

    #[test]
    fn test_multiple_groups_join_with_semicolon() {
        let selection = vec![sel("Genesis", "1", 1), sel("Exodus", "2", 4)];
        assert_eq!(resolve(&selection), "Genesis 1:1; Exodus 2:4");
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(resolve(&[]), "");
    }

    #[test]
    fn test_unsorted_and_duplicate_verses() {
        let selection = vec![
            sel("John", "3", 17),
            sel("John", "3", 16),
            sel("John", "3", 16),
            sel("John", "3", 18),
            sel("John", "3", 20),
        ];
        assert_eq!(resolve(&selection), "John 3:16-18, 20");
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let selection = vec![
            sel("Exodus", "2", 4),
            sel("Genesis", "1", 1),
            sel("Exodus", "2", 5),
            sel("Genesis", "2", 1),
        ];
        assert_eq!(resolve(&selection), "Exodus 2:4-5; Genesis 1:1; Genesis 2:1");
    }

    #[test]
    fn test_compress_runs() {
        assert_eq!(compress(&[1]), "1");
        assert_eq!(compress(&[1, 2]), "1-2");
        assert_eq!(compress(&[1, 3, 5]), "1, 3, 5");
        assert_eq!(compress(&[1, 2, 4, 5, 6, 9]), "1-2, 4-6, 9");
        assert_eq!(compress(&[]), "");
    }

    #[test]
    fn test_parse_reference() {
        let verse: SelectedVerse = "Genesis 1:3".parse().unwrap();
        assert_eq!(verse, sel("Genesis", "1", 3));

        let verse: SelectedVerse = "1 Kings 2:10".parse().unwrap();
        assert_eq!(verse, sel("1 Kings", "2", 10));
    }

    #[test]
    fn test_parse_rejects_malformed_reference() {
        assert!("Genesis".parse::<SelectedVerse>().is_err());
        assert!("Genesis 1".parse::<SelectedVerse>().is_err());
        assert!("Genesis 1:x".parse::<SelectedVerse>().is_err());
        assert!("Genesis 1:0".parse::<SelectedVerse>().is_err());
        let err = " 1:2".parse::<SelectedVerse>().unwrap_err();
        assert!(err.to_string().contains("expected"));
    }
}
