//! Keyset pagination and list-query parsing shared by the listing endpoints.
//!
//! Listings over-fetch one row: when `limit + 1` rows come back, the extra
//! row's id becomes `next_cursor` and the next request starts *at* that row
//! (inclusive comparison on the sort key tuple).

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One page of results plus the id of the first row of the next page.
#[derive(Debug)]
pub struct CursorPage<T> {
    pub next_cursor: Option<Uuid>,
    pub items: Vec<T>,
}

impl<T> CursorPage<T> {
    /// Split an over-fetched result (`limit + 1` rows max) into a page.
    pub fn from_overfetch(mut rows: Vec<T>, limit: usize, id_of: impl Fn(&T) -> Uuid) -> Self {
        let next_cursor = if rows.len() > limit {
            let next = rows.get(limit).map(&id_of);
            rows.truncate(limit);
            next
        } else {
            None
        };
        Self {
            next_cursor,
            items: rows,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            next_cursor: self.next_cursor,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Row-value comparison that keeps the cursor row itself in the page.
    pub fn inclusive_op(self) -> &'static str {
        match self {
            SortDirection::Asc => ">=",
            SortDirection::Desc => "<=",
        }
    }
}

/// Resolve `limit` against a default and an inclusive maximum.
pub fn resolve_limit(limit: Option<i64>, default: i64, max: i64) -> AppResult<i64> {
    match limit {
        None => Ok(default),
        Some(n) if (1..=max).contains(&n) => Ok(n),
        Some(n) => Err(AppError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            max, n
        ))),
    }
}

/// Parse a comma-separated list of UUIDs (`a,b,c`). Blank input means no filter.
pub fn parse_uuid_list(raw: Option<&str>) -> AppResult<Option<Vec<Uuid>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| AppError::Validation("Invalid UUID format in query parameters.".into()))
        })
        .collect::<AppResult<Vec<_>>>()
        .map(Some)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
