//! Search filter model and patch semantics.
//!
//! [`SearchFilter`] is an immutable value object: every update goes
//! through [`SearchFilter::apply_patch`], which produces a new filter
//! and enforces the two structural invariants:
//!
//! - multi-valued selections (`content_type`, `visibility`) always keep
//!   at least one entry selected;
//! - changing anything other than the page number resets pagination to
//!   page 1.
//!
//! The URL codec for this model lives in [`crate::query`].

use serde::{Deserialize, Serialize};

use crate::dates::DateFilter;

// ── Pagination defaults ──────────────────────────────────────────────

/// First page of results.
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of results per page.
pub const DEFAULT_PER_PAGE: u32 = 24;

// ── Sort order ───────────────────────────────────────────────────────

/// Sort order for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    TitleAsc,
    TitleDesc,
    DateAsc,
    DateDesc,
    ScoreAsc,
    #[default]
    ScoreDesc,
}

impl SortBy {
    /// Wire value used in the `sort` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleAsc => "name:asc",
            Self::TitleDesc => "name:desc",
            Self::DateAsc => "date:asc",
            Self::DateDesc => "date:desc",
            Self::ScoreAsc => "score:asc",
            Self::ScoreDesc => "score:desc",
        }
    }

    /// Parse a `sort` wire value. Unrecognized strings yield `None`;
    /// the caller substitutes the default rather than erroring.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name:asc" => Some(Self::TitleAsc),
            "name:desc" => Some(Self::TitleDesc),
            "date:asc" => Some(Self::DateAsc),
            "date:desc" => Some(Self::DateDesc),
            "score:asc" => Some(Self::ScoreAsc),
            "score:desc" => Some(Self::ScoreDesc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Author filter ────────────────────────────────────────────────────

/// Whether results are restricted to the current user's entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorFilter {
    #[default]
    All,
    User,
}

impl AuthorFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

// ── Multi-valued selections ──────────────────────────────────────────

/// Which entity types to include in results.
///
/// Invariant: at least one field is `true`. The all-true value is the
/// fail-open default substituted when a query string carries no (or no
/// recognized) `type` parameters, so a malformed filter can never hide
/// every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypes {
    pub project: bool,
    pub dataset: bool,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self {
            project: true,
            dataset: true,
        }
    }
}

impl ContentTypes {
    /// `true` if no entity type is selected (invariant violation).
    pub fn is_empty(&self) -> bool {
        !self.project && !self.dataset
    }
}

/// Which visibility levels to include in results.
///
/// Invariant: at least one field is `true` (same fail-open policy as
/// [`ContentTypes`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibilities {
    pub public: bool,
    pub internal: bool,
    pub private: bool,
}

impl Default for Visibilities {
    fn default() -> Self {
        Self {
            public: true,
            internal: true,
            private: true,
        }
    }
}

impl Visibilities {
    /// `true` if no visibility is selected (invariant violation).
    pub fn is_empty(&self) -> bool {
        !self.public && !self.internal && !self.private
    }
}

/// Which membership roles to include when filtering by the current
/// user. All-true means no role restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub owner: bool,
    pub maintainer: bool,
    pub reader: bool,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            owner: true,
            maintainer: true,
            reader: true,
        }
    }
}

// ── Filter state ─────────────────────────────────────────────────────

/// The complete search filter state.
///
/// The URL is the sole source of truth for this value: it is
/// reconstructed by [`crate::query::parse`] on every navigation and
/// written back by [`crate::query::serialize`] after every patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Free-text query fragment.
    pub phrase: String,
    pub sort: SortBy,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub content_type: ContentTypes,
    pub visibility: Visibilities,
    pub author: AuthorFilter,
    pub role: Roles,
    pub date_filter: DateFilter,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchFilter {
    /// The canonical default filter: empty phrase, best-match ordering,
    /// first page, everything visible.
    pub fn new() -> Self {
        Self {
            phrase: String::new(),
            sort: SortBy::default(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            content_type: ContentTypes::default(),
            visibility: Visibilities::default(),
            author: AuthorFilter::default(),
            role: Roles::default(),
            date_filter: DateFilter::default(),
        }
    }

    /// Merge a partial update into this filter, returning the new
    /// filter.
    ///
    /// - Any change to a field other than `page` resets `page` to 1.
    /// - A patch that would leave `content_type` or `visibility` with
    ///   nothing selected is rejected wholesale: the previous filter is
    ///   returned unchanged.
    pub fn apply_patch(&self, patch: SearchPatch) -> Self {
        if patch.content_type.is_some_and(|c| c.is_empty())
            || patch.visibility.is_some_and(|v| v.is_empty())
        {
            return self.clone();
        }

        let mut next = self.clone();
        let mut non_page_change = false;

        macro_rules! merge {
            ($field:ident) => {
                if let Some(value) = patch.$field {
                    if next.$field != value {
                        non_page_change = true;
                    }
                    next.$field = value;
                }
            };
        }

        merge!(phrase);
        merge!(sort);
        merge!(content_type);
        merge!(visibility);
        merge!(author);
        merge!(role);
        merge!(date_filter);

        // Both counters are clamped to 1 so a patch can never produce
        // a filter outside the model's bounds.
        if let Some(per_page) = patch.per_page {
            let per_page = per_page.max(1);
            if next.per_page != per_page {
                non_page_change = true;
            }
            next.per_page = per_page;
        }
        if let Some(page) = patch.page {
            next.page = page.max(DEFAULT_PAGE);
        }
        if non_page_change {
            next.page = DEFAULT_PAGE;
        }

        next
    }
}

/// A partial update to a [`SearchFilter`]. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct SearchPatch {
    pub phrase: Option<String>,
    pub sort: Option<SortBy>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub content_type: Option<ContentTypes>,
    pub visibility: Option<Visibilities>,
    pub author: Option<AuthorFilter>,
    pub role: Option<Roles>,
    pub date_filter: Option<DateFilter>,
}

// ── Tests ────────────────────────────────────────────────────────────
