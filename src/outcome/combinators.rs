//! Constructors and combinators over [`Outcome`].

use std::fmt::Display;
use std::future::Future;

use http::StatusCode;

use super::{Failure, Outcome};

/// Wraps `data` in a successful outcome.
pub const fn success<T>(data: T) -> Outcome<T> {
    Ok(data)
}

/// Creates a failed outcome with the default status (400).
pub fn failure<T>(message: impl Into<String>) -> Outcome<T> {
    Err(Failure::validation(message))
}

/// Creates a failed outcome with an explicit status code.
pub fn failure_with_status<T>(message: impl Into<String>, status: StatusCode) -> Outcome<T> {
    Err(Failure::new(message, status))
}

/// Converts a fallible operation into an outcome.
///
/// The error's `Display` text becomes the failure message (status 400).
///
/// # Errors
///
/// Returns a validation failure when `operation` returns `Err`.
pub fn from_fallible<T, E, F>(operation: F) -> Outcome<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    operation().map_err(|error| Failure::validation(error.to_string()))
}

/// Awaits a fallible future and converts its result into an outcome.
///
/// # Errors
///
/// Returns a validation failure when the future resolves to `Err`.
pub async fn from_future<T, E, Fut>(future: Fut) -> Outcome<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    future
        .await
        .map_err(|error| Failure::validation(error.to_string()))
}

/// Runs an asynchronous fallible operation and converts its result.
///
/// # Errors
///
/// Returns a validation failure when the operation resolves to `Err`.
pub async fn from_async_fallible<T, E, F, Fut>(operation: F) -> Outcome<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    from_future(operation()).await
}

/// Collects outcomes, failing fast.
///
/// Returns every success payload in input order, or the first failure
/// unchanged. An empty input succeeds with an empty vector.
///
/// # Errors
///
/// Returns the first failing element's [`Failure`].
///
/// # Examples
///
/// ```
/// use conservatory::outcome::{self, Failure};
///
/// let combined = outcome::all([Ok(1), Err(Failure::not_found("gone")), Ok(3)]);
/// assert_eq!(combined, Err(Failure::not_found("gone")));
/// assert_eq!(outcome::all::<u8>([]), Ok(vec![]));
/// ```
pub fn all<T>(outcomes: impl IntoIterator<Item = Outcome<T>>) -> Outcome<Vec<T>> {
    outcomes.into_iter().collect()
}

/// Returns the first successful outcome.
///
/// Later elements are not inspected once a success is found. When every
/// element fails, the messages are joined with `", "` in input order.
///
/// # Errors
///
/// Returns a validation failure when no element succeeds or the input is
/// empty.
pub fn any<T>(outcomes: impl IntoIterator<Item = Outcome<T>>) -> Outcome<T> {
    let mut messages = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(data) => return Ok(data),
            Err(failed) => messages.push(failed.into_message()),
        }
    }
    if messages.is_empty() {
        return Err(Failure::validation("no outcomes supplied"));
    }
    Err(Failure::validation(messages.join(", ")))
}

/// Combinators beyond the native [`Result`] API.
pub trait OutcomeExt<T>: Sized {
    /// Collapses both branches into a single value.
    fn fold<U>(
        self,
        on_success: impl FnOnce(T) -> U,
        on_failure: impl FnOnce(Failure) -> U,
    ) -> U;

    /// Applies a fallible transformation to the success payload.
    ///
    /// An error returned by `f` becomes a 400 failure.
    ///
    /// # Errors
    ///
    /// Returns the original failure, or a validation failure raised by `f`.
    fn try_map<U, E: Display>(self, f: impl FnOnce(T) -> Result<U, E>) -> Outcome<U>;

    /// Applies an asynchronous transformation to the success payload.
    ///
    /// `f` is never invoked on a failure.
    fn async_map<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>;

    /// Chains an asynchronous step that itself returns an outcome.
    ///
    /// `f` is never invoked on a failure.
    fn async_flat_map<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Returns the success payload.
    ///
    /// # Panics
    ///
    /// Panics when called on a failure; reading data from a failed outcome
    /// is a programming error.
    fn into_data(self) -> T;

    /// Returns the failure.
    ///
    /// # Panics
    ///
    /// Panics when called on a success.
    fn into_failure(self) -> Failure;
}

impl<T> OutcomeExt<T> for Outcome<T> {
    fn fold<U>(
        self,
        on_success: impl FnOnce(T) -> U,
        on_failure: impl FnOnce(Failure) -> U,
    ) -> U {
        match self {
            Ok(data) => on_success(data),
            Err(failed) => on_failure(failed),
        }
    }

    fn try_map<U, E: Display>(self, f: impl FnOnce(T) -> Result<U, E>) -> Outcome<U> {
        self.and_then(|data| f(data).map_err(|error| Failure::validation(error.to_string())))
    }

    async fn async_map<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        match self {
            Ok(data) => Ok(f(data).await),
            Err(failed) => Err(failed),
        }
    }

    async fn async_flat_map<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        match self {
            Ok(data) => f(data).await,
            Err(failed) => Err(failed),
        }
    }

    #[track_caller]
    fn into_data(self) -> T {
        match self {
            Ok(data) => data,
            Err(failed) => panic!("into_data called on a failed outcome: {failed}"),
        }
    }

    #[track_caller]
    fn into_failure(self) -> Failure {
        match self {
            Ok(_) => panic!("into_failure called on a successful outcome"),
            Err(failed) => failed,
        }
    }
}
