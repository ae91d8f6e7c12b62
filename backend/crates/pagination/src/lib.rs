//! Opaque cursor and page envelope primitives for back-office list endpoints.
//!
//! Cursors are base64url-encoded JSON documents so clients treat them as
//! opaque tokens. Repositories over-fetch one row beyond the requested limit;
//! [`Page::from_overfetch`] trims the extra row and derives the next cursor
//! from it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while decoding pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The cursor is not valid base64url.
    #[error("cursor is not valid base64url")]
    InvalidEncoding,
    /// The cursor decoded but does not contain a recognised payload.
    #[error("cursor payload is malformed: {message}")]
    InvalidPayload {
        /// Parser diagnostic.
        message: String,
    },
}

/// Opaque position within an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "o")]
    offset: u64,
}

impl Cursor {
    /// Build a cursor pointing at `offset`.
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Number of rows preceding this cursor.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Encode the cursor as an opaque token.
    ///
    /// # Examples
    /// ```
    /// use pagination::Cursor;
    ///
    /// let token = Cursor::new(40).encode();
    /// assert_eq!(Cursor::decode(&token), Ok(Cursor::new(40)));
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        // A struct with one integer field always serialises.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode an opaque token produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`PaginationError`] when the token is not base64url or does not
    /// hold a cursor payload.
    pub fn decode(token: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| PaginationError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(|err| PaginationError::InvalidPayload {
            message: err.to_string(),
        })
    }
}

/// Validated page request: where to start and how many rows to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u64,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a request from raw query parameters.
    ///
    /// The limit is clamped to `1..=MAX_LIMIT`; a missing limit falls back to
    /// [`DEFAULT_LIMIT`].
    ///
    /// # Errors
    /// Returns [`PaginationError`] when the cursor cannot be decoded.
    pub fn from_query(cursor: Option<&str>, limit: Option<u32>) -> Result<Self, PaginationError> {
        let offset = match cursor.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Cursor::decode(raw)?.offset(),
            None => 0,
        };
        Ok(Self {
            offset,
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }

    /// First page with the given limit (clamped).
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self {
            offset: 0,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of rows the client asked for.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows a repository should fetch to detect a following page.
    #[must_use]
    pub const fn fetch_limit(&self) -> u32 {
        self.limit.saturating_add(1)
    }
}

/// A single page of results plus the cursor for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    limit: u32,
    next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let request = PageRequest::first(2);
    /// let page = Page::from_overfetch(vec![1, 2, 3], request);
    /// assert_eq!(page.items(), &[1, 2]);
    /// assert!(page.next_cursor().is_some());
    /// ```
    #[must_use]
    pub fn from_overfetch(mut items: Vec<T>, request: PageRequest) -> Self {
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let next_cursor = if items.len() > limit {
            items.truncate(limit);
            let next = request
                .offset()
                .saturating_add(u64::from(request.limit()));
            Some(Cursor::new(next).encode())
        } else {
            None
        };
        Self {
            items,
            limit: request.limit(),
            next_cursor,
        }
    }

    /// Rows on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Requested page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Token for the following page, if more rows exist.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Transform every row, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            limit: self.limit,
            next_cursor: self.next_cursor,
        }
    }

    /// Split into rows, limit and next cursor.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, u32, Option<String>) {
        (self.items, self.limit, self.next_cursor)
    }
}
