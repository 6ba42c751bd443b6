//! response errors
use std::io::ErrorKind;
use std::num::ParseIntError;

use thiserror::Error as ThisError;

use crate::Response;

/// A `Result` alias where the `Err` case is `bridge_response::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur when building or decoding a `Response`.
#[derive(ThisError, Debug)]
pub enum Error {
  /// Error
  #[error(transparent)]
  IO(#[from] std::io::Error),
  /// http::Error
  #[error(transparent)]
  Http(http::Error),
  /// ParseIntError
  #[error(transparent)]
  IntError(#[from] ParseIntError),
  /// A decoding or assertion failure tied to a specific response
  #[error(transparent)]
  Response(#[from] ResponseError),
  /// Unknown Error
  #[error("other: {0}")]
  Other(String),
}

impl Error {
  /// The response-level error, if this is one.
  pub fn as_response_error(&self) -> Option<&ResponseError> {
    match self {
      Error::Response(err) => Some(err),
      _ => None,
    }
  }
  /// Shortcut for `as_response_error().map(ResponseError::reason)`.
  pub fn reason(&self) -> Option<Reason> {
    self.as_response_error().map(ResponseError::reason)
  }
}

/// Coarse classification of a [`ResponseError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
  /// Status code outside of `2xx` on an explicit success assertion.
  Unsuccessful,
  /// The body was missing or could not be parsed.
  Unparseable,
  /// Writing the body out failed.
  IoError,
}

/// An error that carries the `Response` it was raised for.
#[derive(ThisError, Debug)]
pub enum ResponseError {
  /// The status code was not in the `2xx` range.
  #[error("response status code was not successful: {0}")]
  Unsuccessful(Box<Response>),
  /// The body was required but absent.
  #[error("no content was returned in this response: {0}")]
  NoContent(Box<Response>),
  /// The body was not valid JSON of the requested shape.
  #[error("response could not be parsed: {response}")]
  Unparseable {
    /// originating response
    response: Box<Response>,
    /// parser error
    source: serde_json::Error,
  },
  /// The body could not be written out.
  #[error("failed to write response body: {response}")]
  Io {
    /// originating response
    response: Box<Response>,
    /// underlying io error
    source: std::io::Error,
  },
}

impl ResponseError {
  /// The response this error was raised for.
  pub fn response(&self) -> &Response {
    match self {
      ResponseError::Unsuccessful(response) | ResponseError::NoContent(response) => response,
      ResponseError::Unparseable { response, .. } | ResponseError::Io { response, .. } => response,
    }
  }
  /// Take back ownership of the response.
  pub fn into_response(self) -> Response {
    match self {
      ResponseError::Unsuccessful(response) | ResponseError::NoContent(response) => *response,
      ResponseError::Unparseable { response, .. } | ResponseError::Io { response, .. } => *response,
    }
  }
  /// Classification of this error.
  pub fn reason(&self) -> Reason {
    match self {
      ResponseError::Unsuccessful(_) => Reason::Unsuccessful,
      ResponseError::NoContent(_) | ResponseError::Unparseable { .. } => Reason::Unparseable,
      ResponseError::Io { .. } => Reason::IoError,
    }
  }
}

impl From<http::Error> for Error {
  fn from(value: http::Error) -> Self {
    Error::Http(value)
  }
}

pub(crate) fn new_io_error(error_kind: ErrorKind, msg: &str) -> Error {
  Error::IO(std::io::Error::new(error_kind, msg))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_content_is_classified_unparseable() {
    let err = ResponseError::NoContent(Box::default());
    assert_eq!(err.reason(), Reason::Unparseable);
    let err: Error = err.into();
    assert_eq!(err.reason(), Some(Reason::Unparseable));
  }

  #[test]
  fn io_errors_are_not_response_errors() {
    let err = new_io_error(ErrorKind::InvalidData, "bad status line");
    assert!(err.as_response_error().is_none());
    assert_eq!(err.to_string(), "bad status line");
  }
}
