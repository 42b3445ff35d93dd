/// Errors produced while building or querying address sets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A range whose end lies before its start
    ///
    /// The bounds are kept in their `Debug` rendering so `Error` stays independent of the
    /// address type, a single `Result` alias serves sets of every address type.
    #[error("Invalid address range: end {end} precedes start {start}")]
    InvalidRange { start: String, end: String },

    /// A query whose arguments don't describe any supported shape
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(&'static str),

    /// Stepping or measuring past the top of the address domain
    #[error("Address overflow")]
    Overflow,

    /// Stepping below the bottom of the address domain
    #[error("Address underflow")]
    Underflow,
}

impl Error {
    pub(crate) fn invalid_range<A: std::fmt::Debug>(start: &A, end: &A) -> Self {
        Error::InvalidRange {
            start: format!("{start:?}"),
            end: format!("{end:?}"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
