//! Shared helpers for Diesel repository implementations.
//!
//! - Translating page requests into `OFFSET`/`LIMIT` values
//! - Collecting converted rows with a repository-specific error
//! - Carrying domain failures out of a transaction closure

use pagination::PageRequest;

/// `OFFSET` and `LIMIT` for one page, over-fetching a single row so the
/// caller can tell whether another page exists.
pub fn page_window(page: &PageRequest) -> (i64, i64) {
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (offset, i64::from(page.fetch_limit()))
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// `%fragment%` pattern for case-insensitive matching with `ILIKE`.
///
/// `%`, `_` and `\` in the fragment match literally.
pub fn contains_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Error type for transaction closures.
///
/// Diesel transactions roll back on any error convertible from
/// [`diesel::result::Error`]; `Domain` carries an adapter-level outcome such
/// as a failed stock guard out of the closure.
#[derive(Debug)]
pub enum TxError<E> {
    Diesel(diesel::result::Error),
    Domain(E),
}

impl<E> From<diesel::result::Error> for TxError<E> {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl<E> TxError<E> {
    /// Collapse into the repository error type.
    pub fn resolve<R>(self, map_diesel: impl FnOnce(diesel::result::Error) -> R) -> R
    where
        E: Into<R>,
    {
        match self {
            Self::Diesel(error) => map_diesel(error),
            Self::Domain(error) => error.into(),
        }
    }
}
