//! The handle a `Response` is captured from.
use std::io;
use std::io::ErrorKind;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

use crate::errors::{new_io_error, Error, Result};
use crate::{CR_LF, SPACE};

/// A completed exchange whose status and headers can still be queried.
///
/// This is the connection-like side of [`Response::from_exchange`](crate::Response::from_exchange).
/// Any method may fail if the underlying connection is already broken.
pub trait Exchange {
  /// Numeric status reported by the peer.
  fn response_code(&self) -> io::Result<StatusCode>;
  /// Reason phrase from the status line, possibly empty.
  fn response_message(&self) -> io::Result<String>;
  /// All response headers, in arrival order per name.
  fn header_fields(&self) -> io::Result<HeaderMap>;
  /// Protocol version of the exchange.
  fn version(&self) -> Version {
    Version::HTTP_11
  }
}

/// A status line and header block captured from the wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseHead {
  /// version
  pub version: Version,
  /// status code
  pub status: StatusCode,
  /// reason phrase
  pub reason: String,
  /// headers
  pub headers: HeaderMap,
}

impl ResponseHead {
  /// Head with the canonical reason phrase for `status`.
  pub fn new(status: StatusCode) -> Self {
    ResponseHead {
      version: Version::HTTP_11,
      status,
      reason: status.canonical_reason().unwrap_or_default().to_string(),
      headers: HeaderMap::new(),
    }
  }

  /// Parse a status line such as `HTTP/1.1 404 Not Found\r\n`.
  ///
  /// The reason phrase may be missing, empty or contain spaces.
  pub fn parse_status_line(line: &[u8]) -> Result<ResponseHead> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let mut parts = line.splitn(3, |b| b == &b' ');
    let version = match parts.next() {
      Some(b"HTTP/0.9") => Version::HTTP_09,
      Some(b"HTTP/1.0") => Version::HTTP_10,
      Some(b"HTTP/1.1") => Version::HTTP_11,
      Some(b"HTTP/2.0") | Some(b"HTTP/2") => Version::HTTP_2,
      Some(b"HTTP/3.0") | Some(b"HTTP/3") => Version::HTTP_3,
      _ => {
        return Err(new_io_error(ErrorKind::InvalidData, "invalid http version"));
      }
    };
    let status = match parts.next() {
      Some(code) if !code.is_empty() => {
        StatusCode::from_bytes(code).map_err(|x| Error::Http(http::Error::from(x)))?
      }
      _ => {
        return Err(new_io_error(
          ErrorKind::InvalidData,
          "invalid http version and status_code data",
        ));
      }
    };
    let reason = parts
      .next()
      .map(|r| String::from_utf8_lossy(r).trim().to_string())
      .unwrap_or_default();
    Ok(ResponseHead {
      version,
      status,
      reason,
      headers: HeaderMap::new(),
    })
  }
}

impl Exchange for ResponseHead {
  fn response_code(&self) -> io::Result<StatusCode> {
    Ok(self.status)
  }
  fn response_message(&self) -> io::Result<String> {
    Ok(self.reason.clone())
  }
  fn header_fields(&self) -> io::Result<HeaderMap> {
    Ok(self.headers.clone())
  }
  fn version(&self) -> Version {
    self.version
  }
}

impl<T> Exchange for http::Response<T> {
  fn response_code(&self) -> io::Result<StatusCode> {
    Ok(self.status())
  }
  fn response_message(&self) -> io::Result<String> {
    Ok(self.status().canonical_reason().unwrap_or_default().to_string())
  }
  fn header_fields(&self) -> io::Result<HeaderMap> {
    Ok(self.headers().clone())
  }
  fn version(&self) -> Version {
    self.version()
  }
}

/// Split one `name: value\r\n` header line.
pub(crate) fn parser_headers(buffer: &[u8]) -> Result<(Option<HeaderName>, Option<HeaderValue>)> {
  let mut k = None;
  let mut v = None;
  let buffer = buffer.strip_suffix(CR_LF).unwrap_or(buffer);
  for (index, h) in buffer.splitn(2, |s| s == &b':').enumerate() {
    let h = h.strip_prefix(SPACE).unwrap_or(h);
    match index {
      0 => k = Some(HeaderName::from_bytes(h).map_err(|err| Error::Http(err.into()))?),
      1 => v = Some(HeaderValue::from_bytes(h).map_err(|err| Error::Http(err.into()))?),
      _ => {}
    }
  }
  Ok((k, v))
}
