//! Unified error type.

/// A boxed error type carried by [`Error::Handler`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by kumi's fallible operations.
///
/// Two kinds of failure live here. Setup errors (`InvalidChain`,
/// `InvalidRoute`) are raised while the application is being assembled and
/// never reach a request. Everything else is a failed *outcome* of a
/// middleware: it travels up through every composed layer untouched until
/// the transport turns it into a `500`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A middleware chain was assembled with a missing entry.
    #[error("invalid middleware chain: entry {index} is absent")]
    InvalidChain { index: usize },

    /// A route pattern compiled into a matcher over the regex size limit.
    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: String },

    /// The middleware at `index` invoked its continuation more than once,
    /// or after a later step had already run.
    #[error("next() called multiple times by middleware #{index}")]
    MultipleNext { index: usize },

    /// A middleware body failed. The underlying error is the `source()`.
    #[error("handler failed")]
    Handler(#[source] BoxError),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps any error raised inside a middleware body.
    ///
    /// ```rust
    /// # use kumi::Error;
    /// use std::error::Error as _;
    ///
    /// let err = Error::handler("database unavailable");
    /// assert_eq!(err.to_string(), "handler failed");
    /// assert_eq!(err.source().unwrap().to_string(), "database unavailable");
    /// ```
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}
