//! URL query-string codec for [`SearchFilter`].
//!
//! [`parse`] never fails: every malformed, unknown, or missing value
//! resolves to a documented default, so an arbitrary URL always yields
//! a usable filter. [`serialize`] emits only the fields that differ
//! from the default, keeping shared URLs short.
//!
//! Recognized parameters: `q` (alias `phrase` on input), `sort`,
//! `page`, `perPage`, `type` (repeatable), `visibility` (repeatable),
//! `author`, `role` (repeatable), `typeDate`, `since`, `until`.

use chrono::NaiveDate;
use url::form_urlencoded;

use crate::dates::DateFilterKind;
use crate::search::{
    AuthorFilter, ContentTypes, Roles, SearchFilter, SortBy, Visibilities, DEFAULT_PAGE,
    DEFAULT_PER_PAGE,
};

// ── Parameter names ──────────────────────────────────────────────────

const PARAM_PHRASE: &str = "q";
const PARAM_PHRASE_ALIAS: &str = "phrase";
const PARAM_SORT: &str = "sort";
const PARAM_PAGE: &str = "page";
const PARAM_PER_PAGE: &str = "perPage";
const PARAM_TYPE: &str = "type";
const PARAM_VISIBILITY: &str = "visibility";
const PARAM_AUTHOR: &str = "author";
const PARAM_ROLE: &str = "role";
const PARAM_TYPE_DATE: &str = "typeDate";
const PARAM_SINCE: &str = "since";
const PARAM_UNTIL: &str = "until";

/// Date format for the `since`/`until` parameters.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Parse ────────────────────────────────────────────────────────────

/// Parse a URL query string into a [`SearchFilter`].
///
/// Accepts an optional leading `?`. Unknown keys are ignored; values
/// that fail validation fall back to the default for their field.
/// Multi-valued fields with zero recognized values substitute the
/// all-true default (fail-open), so an empty or malformed selection can
/// never exclude every result.
pub fn parse(query: &str) -> SearchFilter {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut filter = SearchFilter::new();

    // Accumulators for repeatable parameters: `None` until the first
    // recognized value arrives, then individual flags are switched on.
    let mut content_type: Option<ContentTypes> = None;
    let mut visibility: Option<Visibilities> = None;
    let mut role: Option<Roles> = None;
    let mut since_raw: Option<String> = None;
    let mut until_raw: Option<String> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            PARAM_PHRASE | PARAM_PHRASE_ALIAS => filter.phrase = value.into_owned(),
            PARAM_SORT => {
                if let Some(sort) = SortBy::parse(&value) {
                    filter.sort = sort;
                }
            }
            PARAM_PAGE => filter.page = parse_positive(&value, DEFAULT_PAGE),
            PARAM_PER_PAGE => filter.per_page = parse_positive(&value, DEFAULT_PER_PAGE),
            PARAM_TYPE => {
                let types = content_type.get_or_insert(ContentTypes {
                    project: false,
                    dataset: false,
                });
                match value.as_ref() {
                    "project" => types.project = true,
                    "dataset" => types.dataset = true,
                    _ => {}
                }
            }
            PARAM_VISIBILITY => {
                let vis = visibility.get_or_insert(Visibilities {
                    public: false,
                    internal: false,
                    private: false,
                });
                match value.as_ref() {
                    "public" => vis.public = true,
                    "internal" => vis.internal = true,
                    "private" => vis.private = true,
                    _ => {}
                }
            }
            PARAM_AUTHOR => {
                if let Some(author) = AuthorFilter::parse(&value) {
                    filter.author = author;
                }
            }
            PARAM_ROLE => {
                let roles = role.get_or_insert(Roles {
                    owner: false,
                    maintainer: false,
                    reader: false,
                });
                match value.as_ref() {
                    "owner" => roles.owner = true,
                    "maintainer" => roles.maintainer = true,
                    "reader" => roles.reader = true,
                    _ => {}
                }
            }
            PARAM_TYPE_DATE => {
                if let Some(kind) = DateFilterKind::parse(&value) {
                    filter.date_filter.kind = kind;
                }
            }
            PARAM_SINCE => since_raw = Some(value.into_owned()),
            PARAM_UNTIL => until_raw = Some(value.into_owned()),
            _ => {}
        }
    }

    // Fail-open: a selection with nothing recognized becomes all-true.
    filter.content_type = match content_type {
        Some(types) if !types.is_empty() => types,
        _ => ContentTypes::default(),
    };
    filter.visibility = match visibility {
        Some(vis) if !vis.is_empty() => vis,
        _ => Visibilities::default(),
    };
    filter.role = match role {
        Some(roles) if roles.owner || roles.maintainer || roles.reader => roles,
        _ => Roles::default(),
    };

    // Literal bounds are only meaningful for the custom kind; canned
    // kinds recompute theirs from the current date at evaluation time.
    if filter.date_filter.kind == DateFilterKind::Custom {
        filter.date_filter.since = since_raw.as_deref().and_then(parse_date);
        filter.date_filter.until = until_raw.as_deref().and_then(parse_date);
    }

    filter
}

/// Parse a `u32` that must be at least 1, falling back to `default`.
fn parse_positive(value: &str, default: u32) -> u32 {
    match value.parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => default,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Apply a patch to the filter encoded in `query` and re-serialize it.
///
/// This is the full URL update cycle: the query string is the sole
/// source of truth, so a UI change parses it, patches the result, and
/// writes the new query string back into the browser location.
pub fn update(query: &str, patch: crate::search::SearchPatch) -> String {
    serialize(&parse(query).apply_patch(patch))
}

// ── Serialize ────────────────────────────────────────────────────────

/// Serialize a [`SearchFilter`] into a URL query string (no leading
/// `?`).
///
/// Fields equal to their default are elided. Multi-valued fields emit
/// one parameter instance per selected entry. `since`/`until` are
/// emitted only for the custom date kind; canned kinds persist the
/// kind name alone and recompute bounds on the next parse.
pub fn serialize(filter: &SearchFilter) -> String {
    let default = SearchFilter::new();
    let mut out = form_urlencoded::Serializer::new(String::new());

    if !filter.phrase.is_empty() {
        out.append_pair(PARAM_PHRASE, &filter.phrase);
    }
    if filter.sort != default.sort {
        out.append_pair(PARAM_SORT, filter.sort.as_str());
    }
    if filter.page != DEFAULT_PAGE {
        out.append_pair(PARAM_PAGE, &filter.page.to_string());
    }
    if filter.per_page != DEFAULT_PER_PAGE {
        out.append_pair(PARAM_PER_PAGE, &filter.per_page.to_string());
    }

    if filter.content_type != default.content_type {
        if filter.content_type.project {
            out.append_pair(PARAM_TYPE, "project");
        }
        if filter.content_type.dataset {
            out.append_pair(PARAM_TYPE, "dataset");
        }
    }
    if filter.visibility != default.visibility {
        if filter.visibility.public {
            out.append_pair(PARAM_VISIBILITY, "public");
        }
        if filter.visibility.internal {
            out.append_pair(PARAM_VISIBILITY, "internal");
        }
        if filter.visibility.private {
            out.append_pair(PARAM_VISIBILITY, "private");
        }
    }
    if filter.author != default.author {
        out.append_pair(PARAM_AUTHOR, filter.author.as_str());
    }
    if filter.role != default.role {
        if filter.role.owner {
            out.append_pair(PARAM_ROLE, "owner");
        }
        if filter.role.maintainer {
            out.append_pair(PARAM_ROLE, "maintainer");
        }
        if filter.role.reader {
            out.append_pair(PARAM_ROLE, "reader");
        }
    }

    if filter.date_filter.kind != DateFilterKind::All {
        out.append_pair(PARAM_TYPE_DATE, filter.date_filter.kind.as_str());
    }
    if filter.date_filter.kind == DateFilterKind::Custom {
        if let Some(since) = filter.date_filter.since {
            out.append_pair(PARAM_SINCE, &since.format(DATE_FORMAT).to_string());
        }
        if let Some(until) = filter.date_filter.until {
            out.append_pair(PARAM_UNTIL, &until.format(DATE_FORMAT).to_string());
        }
    }

    out.finish()
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateFilter;
    use crate::search::SearchPatch;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -- parse: defaults and fail-open --

    #[test]
    fn empty_query_yields_default_filter() {
        assert_eq!(parse(""), SearchFilter::new());
        assert_eq!(parse("?"), SearchFilter::new());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(parse("utm_source=mail&foo=bar"), SearchFilter::new());
    }

    #[test]
    fn unrecognized_type_values_fail_open_to_all_true() {
        let filter = parse("type=workflow&type=pipeline");
        assert_eq!(filter.content_type, ContentTypes::default());
    }

    #[test]
    fn unrecognized_visibility_values_fail_open_to_all_true() {
        let filter = parse("visibility=secret");
        assert_eq!(filter.visibility, Visibilities::default());
    }

    #[test]
    fn partial_visibility_selection_is_kept() {
        let filter = parse("visibility=public&visibility=internal");
        assert!(filter.visibility.public);
        assert!(filter.visibility.internal);
        assert!(!filter.visibility.private);
    }

    #[test]
    fn empty_values_fail_open_to_all_true() {
        let filter = parse("type=&visibility=");
        assert_eq!(filter.content_type, ContentTypes::default());
        assert_eq!(filter.visibility, Visibilities::default());
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let filter = parse("page=abc&perPage=-3");
        assert_eq!(filter.page, 1);
        assert_eq!(filter.per_page, 24);
    }

    #[test]
    fn zero_page_falls_back_to_one() {
        assert_eq!(parse("page=0").page, 1);
    }

    #[test]
    fn unrecognized_sort_falls_back_to_default() {
        assert_eq!(parse("sort=stars:desc").sort, SortBy::ScoreDesc);
    }

    #[test]
    fn phrase_alias_is_accepted_on_input() {
        assert_eq!(parse("phrase=deep%20learning").phrase, "deep learning");
    }

    // -- parse: documented scenario --

    #[test]
    fn dataset_only_query_scenario() {
        let filter = parse("?type=dataset&sort=name:asc&page=2");
        assert!(!filter.content_type.project);
        assert!(filter.content_type.dataset);
        assert_eq!(filter.sort, SortBy::TitleAsc);
        assert_eq!(filter.page, 2);
        assert_eq!(filter.per_page, 24);
        assert_eq!(filter.visibility, Visibilities::default());
        assert_eq!(filter.author, AuthorFilter::All);
    }

    // -- parse: date handling --

    #[test]
    fn custom_dates_are_honoured() {
        let filter = parse("typeDate=custom&since=2023-01-01&until=2023-06-30");
        assert_eq!(filter.date_filter.kind, DateFilterKind::Custom);
        assert_eq!(filter.date_filter.since, Some(day(2023, 1, 1)));
        assert_eq!(filter.date_filter.until, Some(day(2023, 6, 30)));
    }

    #[test]
    fn literal_dates_are_dropped_for_canned_kinds() {
        let filter = parse("typeDate=last-week&since=2023-01-01&until=2023-06-30");
        assert_eq!(filter.date_filter.kind, DateFilterKind::LastWeek);
        assert_eq!(filter.date_filter.since, None);
        assert_eq!(filter.date_filter.until, None);
    }

    #[test]
    fn malformed_custom_dates_are_dropped() {
        let filter = parse("typeDate=custom&since=january&until=2023-13-45");
        assert_eq!(filter.date_filter.kind, DateFilterKind::Custom);
        assert_eq!(filter.date_filter.since, None);
        assert_eq!(filter.date_filter.until, None);
    }

    // -- serialize --

    #[test]
    fn default_filter_serializes_to_empty_string() {
        assert_eq!(serialize(&SearchFilter::new()), "");
    }

    #[test]
    fn phrase_is_percent_encoded() {
        let filter = SearchFilter {
            phrase: "weather data".into(),
            ..SearchFilter::new()
        };
        assert_eq!(serialize(&filter), "q=weather+data");
    }

    #[test]
    fn multi_valued_fields_emit_one_pair_per_selection() {
        let filter = SearchFilter {
            visibility: Visibilities {
                public: true,
                internal: true,
                private: false,
            },
            ..SearchFilter::new()
        };
        assert_eq!(serialize(&filter), "visibility=public&visibility=internal");
    }

    #[test]
    fn canned_date_kind_serializes_without_bounds() {
        let filter = SearchFilter {
            date_filter: DateFilter {
                kind: DateFilterKind::Last90Days,
                since: None,
                until: None,
            },
            ..SearchFilter::new()
        };
        assert_eq!(serialize(&filter), "typeDate=last-90-days");
    }

    // -- round-trip law --

    #[test]
    fn round_trip_preserves_non_default_fields() {
        let filter = SearchFilter {
            phrase: "fly brain".into(),
            sort: SortBy::DateDesc,
            page: 3,
            per_page: 50,
            content_type: ContentTypes {
                project: false,
                dataset: true,
            },
            visibility: Visibilities {
                public: true,
                internal: false,
                private: false,
            },
            author: AuthorFilter::User,
            role: Roles {
                owner: true,
                maintainer: false,
                reader: false,
            },
            date_filter: DateFilter::custom(Some(day(2023, 1, 1)), Some(day(2023, 12, 31))),
        };
        assert_eq!(parse(&serialize(&filter)), filter);
    }

    #[test]
    fn round_trip_of_default_filter() {
        let filter = SearchFilter::new();
        assert_eq!(parse(&serialize(&filter)), filter);
    }

    #[test]
    fn round_trip_after_patch() {
        let filter = SearchFilter::new().apply_patch(SearchPatch {
            phrase: Some("zebrafish".into()),
            author: Some(AuthorFilter::User),
            ..SearchPatch::default()
        });
        assert_eq!(parse(&serialize(&filter)), filter);
    }

    // -- update --

    #[test]
    fn update_patches_the_query_in_place() {
        let next = update(
            "q=zebrafish&page=4",
            SearchPatch {
                sort: Some(SortBy::DateDesc),
                ..SearchPatch::default()
            },
        );
        // The sort change resets pagination, so `page` drops back to
        // its elided default.
        assert_eq!(next, "q=zebrafish&sort=date%3Adesc");
    }
}
