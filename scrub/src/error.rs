//! Error types and result definitions for the scrub pipeline.
//!
//! [`ScrubError`] classifies every failure the pipeline can surface and can
//! aggregate multiple errors, which is how a cleanup failure is reported
//! alongside the stage failure that was already in flight instead of
//! masking it.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for scrub operations using [`ScrubError`] as the error type.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// Categories of failures surfaced by the pipeline.
///
/// The pipeline reports exactly one primary kind per run; when closing the
/// store also fails, the cleanup kind is aggregated next to the primary one
/// rather than replacing it.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backing store could not be opened (unreachable file, locked database).
    ConnectionFailed,
    /// A read against an open store failed.
    QueryFailed,
    /// A partitioned fetch failed or timed out; the whole gather is discarded.
    FetchFailed,
    /// The transactional write of the clean table failed; prior contents remain.
    WriteFailed,
    /// Closing the store connection failed.
    CleanupFailed,
    /// Invalid or incomplete configuration.
    ConfigError,
    /// An operation was invoked in a state that does not allow it.
    InvalidState,
    /// Underlying I/O failure outside the store itself.
    IoError,
    /// Uncategorized failure.
    Unknown,
}

/// Payload stored for single [`ScrubError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for scrub operations.
#[derive(Debug, Clone)]
pub struct ScrubError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Multiple aggregated errors, used when cleanup fails on top of a
    /// primary stage failure.
    Many {
        errors: Vec<ScrubError>,
        location: &'static Location<'static>,
    },
}

impl ScrubError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error, which by
    /// construction is the primary failure.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the callsite location captured when the error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error.
    ///
    /// Has no effect on aggregated errors, which forward the first contained
    /// error as their source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        ScrubError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for ScrubError {
    fn eq(&self, other: &ScrubError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ScrubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                write!(
                    f,
                    "[{:?}] {} @ {}:{}",
                    payload.kind,
                    payload.description,
                    payload.location.file(),
                    payload.location.line(),
                )?;
                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail: {detail}")?;
                }
                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                write!(
                    f,
                    "[Many] {} errors aggregated @ {}:{}",
                    errors.len(),
                    location.file(),
                    location.line(),
                )?;
                for (index, error) in errors.iter().enumerate() {
                    for (n, line) in format!("{error}").lines().enumerate() {
                        if n == 0 {
                            write!(f, "\n  {}. {line}", index + 1)?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl error::Error for ScrubError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`ScrubError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for ScrubError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> ScrubError {
        ScrubError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`ScrubError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for ScrubError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> ScrubError {
        ScrubError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates a vector of errors into one.
///
/// A single-element vector unwraps to that error directly; the `Many`
/// variant is reserved for genuinely concurrent failures.
impl<E> From<Vec<E>> for ScrubError
where
    E: Into<ScrubError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> ScrubError {
        let location = Location::caller();
        let mut errors: Vec<ScrubError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        ScrubError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`ScrubError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for ScrubError {
    #[track_caller]
    fn from(err: std::io::Error) -> ScrubError {
        let detail = err.to_string();
        ScrubError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
