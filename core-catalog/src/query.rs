//! In-memory query pipeline over a catalog snapshot.
//!
//! Listing surfaces fetch the full song list once and run text filtering,
//! category filtering, ranking, and pagination locally. The pipeline is
//! pure: it never touches the backend.

use crate::models::{Category, Song};
use crate::pagination::{Page, PageRequest};

/// Where a text query is being evaluated. The two surfaces treat an empty
/// query differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchContext {
    /// Live-search dropdown: an empty query matches nothing.
    Suggestions,
    /// Browse listing: an empty query matches everything.
    Browse,
}

/// Category restriction for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No restriction.
    #[default]
    All,
    /// Only songs tagged with this category.
    Only(Category),
}

impl CategoryFilter {
    fn matches(&self, song: &Song) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => song.categories.contains(category),
        }
    }
}

/// A composed catalog query.
#[derive(Debug, Clone)]
pub struct SongQuery {
    /// Free-text name filter. Matching is case-insensitive substring.
    pub text: String,
    /// Category restriction.
    pub category: CategoryFilter,
    /// Empty-query semantics.
    pub context: SearchContext,
    /// Rank by descending search popularity instead of input order.
    pub rank_by_popularity: bool,
}

impl Default for SongQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            category: CategoryFilter::All,
            context: SearchContext::Browse,
            rank_by_popularity: false,
        }
    }
}

impl SongQuery {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_category(mut self, filter: CategoryFilter) -> Self {
        self.category = filter;
        self
    }

    pub fn with_context(mut self, context: SearchContext) -> Self {
        self.context = context;
        self
    }

    pub fn ranked(mut self) -> Self {
        self.rank_by_popularity = true;
        self
    }
}

/// Applies text and category filters, then the optional popularity ranking.
///
/// The popularity sort is stable: songs with equal `search_count` keep
/// their input order, so a caller that pre-sorts by recency gets
/// recency-within-rank for free.
pub fn filter_songs(songs: &[Song], query: &SongQuery) -> Vec<Song> {
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() && query.context == SearchContext::Suggestions {
        return Vec::new();
    }

    let mut matched: Vec<Song> = songs
        .iter()
        .filter(|song| needle.is_empty() || song.name.to_lowercase().contains(&needle))
        .filter(|song| query.category.matches(song))
        .cloned()
        .collect();

    if query.rank_by_popularity {
        matched.sort_by(|a, b| b.search_count.cmp(&a.search_count));
    }

    matched
}

/// Slices one page out of an already-filtered, already-ordered list.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let start = request.offset().min(items.len());
    let end = (start + request.page_size.max(1) as usize).min(items.len());
    Page::new(items[start..end].to_vec(), total, request)
}

/// Runs the full pipeline: filter, rank, paginate.
pub fn run(songs: &[Song], query: &SongQuery, request: PageRequest) -> Page<Song> {
    let matched = filter_songs(songs, query);
    paginate(&matched, request)
}

/// Computes live-search suggestions: the first `limit` name matches.
///
/// An empty or whitespace-only query yields no suggestions.
pub fn suggest(songs: &[Song], text: &str, limit: usize) -> Vec<Song> {
    let query = SongQuery::default()
        .with_text(text)
        .with_context(SearchContext::Suggestions);
    let mut matched = filter_songs(songs, &query);
    matched.truncate(limit);
    matched
}
