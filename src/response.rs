use std::any::Any;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
#[cfg(feature = "charset")]
use encoding_rs::{Encoding, UTF_8};
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
use http::header::AsHeaderName;
use http::{HeaderMap, Method, StatusCode, Version};
#[cfg(feature = "charset")]
use mime::Mime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::body::Body;
use crate::decode::{ImageDecoder, MarkupRenderer};
use crate::errors::{new_io_error, Error, ResponseError, Result};
use crate::exchange::{parser_headers, Exchange, ResponseHead};
use crate::{COLON_SPACE, CR_LF, SPACE};

type ImageCache = OnceLock<Option<Arc<dyn Any + Send + Sync>>>;

/// The captured result of one completed HTTP exchange.
///
/// Everything except the decoded-image cache is fixed at construction.
#[derive(Default, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
  url: String,
  #[cfg_attr(feature = "serialize", serde(with = "http_serde::version"))]
  version: Version,
  #[cfg_attr(feature = "serialize", serde(with = "http_serde::status_code"))]
  status_code: StatusCode,
  reason_phrase: String,
  #[cfg_attr(feature = "serialize", serde(with = "http_serde::header_map"))]
  headers: HeaderMap,
  body: Option<Body>,
  #[cfg_attr(feature = "serialize", serde(skip))]
  image_cache: ImageCache,
}

impl fmt::Debug for Response {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Response")
      .field("url", &self.url)
      .field("version", &self.version)
      .field("status_code", &self.status_code)
      .field("reason_phrase", &self.reason_phrase)
      .field("headers", &self.headers)
      .field("body", &self.body)
      .field("image_cached", &self.image_cache.get().is_some())
      .finish()
  }
}

impl PartialEq for Response {
  fn eq(&self, other: &Self) -> bool {
    self.url == other.url
      && self.version == other.version
      && self.status_code == other.status_code
      && self.reason_phrase == other.reason_phrase
      && self.headers == other.headers
      && self.body == other.body
  }
}

impl fmt::Display for Response {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}, {} {}, {} bytes",
      self.url,
      self.status_code.as_u16(),
      self.reason_phrase,
      self.body.as_ref().map_or(0, Body::len)
    )
  }
}

impl<T> From<http::Response<T>> for Response
where
  T: Into<Body>,
{
  fn from(value: http::Response<T>) -> Self {
    let (parts, body) = value.into_parts();
    let body = body.into();
    Self {
      url: String::new(),
      version: parts.version,
      status_code: parts.status,
      reason_phrase: parts
        .status
        .canonical_reason()
        .unwrap_or_default()
        .to_string(),
      headers: parts.headers,
      body: if body.is_empty() { None } else { Some(body) },
      image_cache: OnceLock::new(),
    }
  }
}

impl Response {
  /// Capture a response from a finished exchange.
  ///
  /// `body` must already be fully read. Status, reason phrase and headers are
  /// read from `exchange` once, here, and never again.
  ///
  /// # Errors
  ///
  /// Returns [`Error::IO`] when the exchange can no longer report its status.
  ///
  /// # Example
  ///
  /// ```rust
  /// use bridge_response::{Response, ResponseHead};
  ///
  /// let head = ResponseHead::parse_status_line(b"HTTP/1.1 200 OK\r\n")?;
  /// let resp = Response::from_exchange("hello", "http://example.com/", &head)?;
  /// assert_eq!(resp.to_string(), "http://example.com/, 200 OK, 5 bytes");
  /// # Ok::<(), bridge_response::Error>(())
  /// ```
  pub fn from_exchange<B, U, E>(body: B, url: U, exchange: &E) -> Result<Response>
  where
    B: Into<Body>,
    U: Into<String>,
    E: Exchange + ?Sized,
  {
    let status_code = exchange.response_code()?;
    let reason_phrase = exchange.response_message()?;
    let headers = exchange.header_fields()?;
    let body = body.into();
    Ok(Response {
      url: url.into(),
      version: exchange.version(),
      status_code,
      reason_phrase,
      headers,
      body: if body.is_empty() { None } else { Some(body) },
      image_cache: OnceLock::new(),
    })
  }
  /// An HTTP response builder
  ///
  /// This type can be used to construct an instance of `Response` through a
  /// builder-like pattern, then converted with `Response::from`.
  pub fn builder() -> http::response::Builder {
    http::response::Builder::new()
  }
  /// Attach the URL that produced this response.
  pub fn with_url<U: Into<String>>(mut self, url: U) -> Self {
    self.url = url.into();
    self
  }

  /// Re-serialize as an HTTP/1.x message.
  pub fn to_raw(&self) -> Bytes {
    let mut http_response = Vec::new();
    http_response.extend(format!("{:?}", self.version).as_bytes());
    http_response.extend(SPACE);
    http_response.extend(self.status_code.as_str().as_bytes());
    if !self.reason_phrase.is_empty() {
      http_response.extend(SPACE);
      http_response.extend(self.reason_phrase.as_bytes());
    }
    http_response.extend(CR_LF);
    for (k, v) in self.headers.iter() {
      http_response.extend(k.as_str().as_bytes());
      http_response.extend(COLON_SPACE);
      http_response.extend(v.as_bytes());
      http_response.extend(CR_LF);
    }
    http_response.extend(CR_LF);
    if let Some(b) = self.body() {
      http_response.extend(b.as_ref());
    }
    Bytes::from(http_response)
  }
}

impl Response {
  /// The request URL that produced this response.
  #[inline]
  pub fn url(&self) -> &str {
    &self.url
  }
  /// Get the `StatusCode` of this `Response`.
  ///
  /// # Example
  ///
  /// ```rust
  /// use bridge_response::{Response, StatusCode};
  ///
  /// let resp = Response::from(Response::builder().status(413).body("").unwrap());
  /// match resp.status_code() {
  ///   StatusCode::OK => println!("success!"),
  ///   StatusCode::PAYLOAD_TOO_LARGE => println!("Request payload is too large!"),
  ///   s => println!("Received response status: {s:?}"),
  /// };
  /// ```
  #[inline]
  pub fn status_code(&self) -> StatusCode {
    self.status_code
  }
  /// The reason phrase exactly as the server sent it.
  #[inline]
  pub fn reason_phrase(&self) -> &str {
    &self.reason_phrase
  }
  /// Get the HTTP `Version` of this `Response`.
  #[inline]
  pub fn version(&self) -> Version {
    self.version
  }
  /// Get the `Headers` of this `Response`.
  #[inline]
  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }
  /// First value of header `name`.
  ///
  /// Returns `None` when the header is missing or its value is not visible
  /// ASCII. Names are matched case-insensitively.
  pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
    self.headers.get(name).and_then(|v| v.to_str().ok())
  }
  /// Every value of header `name`, in the order received.
  ///
  /// Returns `None` when the header is missing. Values that are not visible
  /// ASCII are skipped.
  pub fn header_list<K: AsHeaderName>(&self, name: K) -> Option<Vec<&str>> {
    let values = self.headers.get_all(name);
    let mut iter = values.iter().peekable();
    iter.peek()?;
    Some(iter.filter_map(|v| v.to_str().ok()).collect())
  }
  /// Get the content-length of the response, if the server sent one.
  ///
  /// # Errors
  ///
  /// Returns [`Error::IntError`] if the header is present but not a number.
  pub fn content_length(&self) -> Result<Option<u64>> {
    match self.headers.get(http::header::CONTENT_LENGTH) {
      Some(value) => {
        let length = String::from_utf8_lossy(value.as_bytes()).trim().parse()?;
        Ok(Some(length))
      }
      None => Ok(None),
    }
  }
  /// The `Content-Type` header.
  pub fn content_type(&self) -> Option<&str> {
    self.header(http::header::CONTENT_TYPE)
  }
  /// `true` for any `2xx` status.
  #[inline]
  pub fn is_success(&self) -> bool {
    self.status_code.is_success()
  }
  /// Return `self` if the status is `2xx`, fail otherwise.
  ///
  /// # Example
  ///
  /// ```rust
  /// use bridge_response::{Reason, Response};
  ///
  /// let resp = Response::from(Response::builder().status(503).body("").unwrap());
  /// let err = resp.require_success().unwrap_err();
  /// assert_eq!(err.reason(), Some(Reason::Unsuccessful));
  /// ```
  pub fn require_success(self) -> Result<Response> {
    if self.is_success() {
      Ok(self)
    } else {
      Err(ResponseError::Unsuccessful(Box::new(self)).into())
    }
  }
}

impl Response {
  /// Get the full response body.
  pub fn body(&self) -> &Option<Body> {
    &self.body
  }
  /// Raw body bytes, `None` when the body was empty.
  pub fn as_bytes(&self) -> Option<&[u8]> {
    self.body.as_ref().map(AsRef::<[u8]>::as_ref)
  }
  /// Body decoded as UTF-8, `None` when the body was empty.
  ///
  /// Malformed sequences are replaced with U+FFFD rather than rejected.
  pub fn as_string(&self) -> Option<String> {
    self.body.as_ref().map(Body::to_utf8_lossy)
  }
  /// Decode the body using the `charset` of `Content-Type`.
  ///
  /// Falls back to `default_encoding`, and then to UTF-8 for unknown labels.
  ///
  /// # Optional
  ///
  /// This requires the optional `charset` feature to be enabled.
  #[cfg(feature = "charset")]
  #[cfg_attr(docsrs, doc(cfg(feature = "charset")))]
  pub fn text_with_charset(&self, default_encoding: &str) -> Option<String> {
    let body = self.body.as_ref()?;
    let content_type = self
      .content_type()
      .and_then(|value| value.parse::<Mime>().ok());
    let header_encoding = content_type
      .as_ref()
      .and_then(|mime| mime.get_param("charset").map(|charset| charset.as_str()))
      .unwrap_or(default_encoding);
    let mut fallback = None;
    for encoding_name in [header_encoding, default_encoding] {
      let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);
      let (text, _, had_errors) = encoding.decode(body);
      if !had_errors {
        return Some(text.into_owned());
      }
      fallback.get_or_insert(text.into_owned());
    }
    fallback
  }
  /// Render the body text with `renderer`, `None` when the body was empty.
  pub fn as_formatted_text<R>(&self, renderer: &R) -> Option<R::Output>
  where
    R: MarkupRenderer + ?Sized,
  {
    let content = self.as_string()?;
    Some(renderer.render(&content))
  }
  /// Decode the body as an image, at most once per response.
  ///
  /// The first call runs `decoder` and caches the outcome, failures included.
  /// Every later call returns the cached value without decoding again. A
  /// later call with a decoder of a different image type gets `None`.
  ///
  /// The cache is a [`OnceLock`], so racing first calls still decode once.
  pub fn as_image_with<D>(&self, decoder: &D) -> Option<Arc<D::Image>>
  where
    D: ImageDecoder + ?Sized,
  {
    let cached = self.image_cache.get_or_init(|| {
      let image = self.as_bytes().and_then(|bytes| decoder.decode(bytes));
      log::trace!("decoded image from {}: {}", self.url, image.is_some());
      image.map(|img| Arc::new(img) as Arc<dyn Any + Send + Sync>)
    });
    cached.clone()?.downcast::<D::Image>().ok()
  }
  /// Decode the body as a raster image with [`RasterDecoder`](crate::decode::RasterDecoder).
  ///
  /// # Optional
  ///
  /// This requires the optional `image` feature to be enabled.
  #[cfg(feature = "image")]
  #[cfg_attr(docsrs, doc(cfg(feature = "image")))]
  pub fn as_image(&self) -> Option<Arc<image::DynamicImage>> {
    self.as_image_with(&crate::decode::RasterDecoder)
  }
  /// Deserialize the JSON body into `T`.
  ///
  /// # Errors
  ///
  /// [`ResponseError::NoContent`] for an empty body and
  /// [`ResponseError::Unparseable`] for malformed JSON. Both carry this
  /// response.
  pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
    let content = match self.as_string() {
      Some(content) => content,
      None => return Err(ResponseError::NoContent(Box::new(self.clone())).into()),
    };
    serde_json::from_str(&content).map_err(|source| {
      ResponseError::Unparseable {
        response: Box::new(self.clone()),
        source,
      }
      .into()
    })
  }
  /// The body as a JSON object.
  pub fn as_json_object(&self) -> Result<Map<String, Value>> {
    self.json()
  }
  /// The body as a JSON array.
  pub fn as_json_array(&self) -> Result<Vec<Value>> {
    self.json()
  }
  /// Write the raw body to `path`, replacing any existing file.
  ///
  /// An empty body produces an empty file. If the file was created but the
  /// write failed, the partial file is removed before the error is returned.
  ///
  /// # Errors
  ///
  /// [`ResponseError::Io`] on any failure.
  pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path).map_err(|source| self.io_error(source))?;
    let written = file
      .write_all(self.as_bytes().unwrap_or_default())
      .and_then(|_| file.flush());
    drop(file);
    if let Err(source) = written {
      remove_partial(path);
      return Err(self.io_error(source));
    }
    log::trace!("wrote {} bytes to {}", self.as_bytes().map_or(0, <[u8]>::len), path.display());
    Ok(())
  }
  /// Async variant of [`write_to_file`](Response::write_to_file).
  pub async fn write_to_file_async<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let path = path.as_ref();
    let mut file = tokio::fs::File::create(path)
      .await
      .map_err(|source| self.io_error(source))?;
    let mut written = file.write_all(self.as_bytes().unwrap_or_default()).await;
    if written.is_ok() {
      written = file.flush().await;
    }
    drop(file);
    if let Err(source) = written {
      remove_partial(path);
      return Err(self.io_error(source));
    }
    Ok(())
  }
  fn io_error(&self, source: std::io::Error) -> Error {
    ResponseError::Io {
      response: Box::new(self.clone()),
      source,
    }
    .into()
  }
}

fn remove_partial(path: &Path) {
  if let Err(err) = std::fs::remove_file(path) {
    log::warn!("could not remove partial file {}: {err}", path.display());
  }
}

/// A builder that reads a `Response` off an HTTP/1.x byte stream.
#[derive(Debug)]
pub struct ResponseBuilder<T: AsyncRead> {
  reader: BufReader<T>,
  config: ResponseConfig,
}

/// response config
#[derive(Clone, Debug, Default)]
pub struct ResponseConfig {
  method: Method,
  timeout: Option<Duration>,
  max_read: Option<u64>,
}

impl ResponseConfig {
  /// Config for the response to a `method` request.
  pub fn new(method: Method) -> Self {
    ResponseConfig {
      method,
      ..Default::default()
    }
  }
  /// Give up on a body read that stalls for longer than `timeout`.
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
  /// Stop reading the body after `max` bytes.
  pub fn max_read(mut self, max: u64) -> Self {
    self.max_read = Some(max);
    self
  }
}

impl<T: AsyncRead + Unpin> ResponseBuilder<T> {
  /// Constructs a new response builder.
  pub fn new(reader: BufReader<T>, config: ResponseConfig) -> ResponseBuilder<T> {
    ResponseBuilder { reader, config }
  }
  async fn read_head(&mut self) -> Result<ResponseHead> {
    let mut line = Vec::new();
    let length = self.reader.read_until(b'\n', &mut line).await?;
    if length == 0 {
      return Err(new_io_error(
        std::io::ErrorKind::UnexpectedEof,
        "connection closed before status line",
      ));
    }
    let mut head = ResponseHead::parse_status_line(&line)?;
    head.headers = self.read_headers().await?;
    Ok(head)
  }
  async fn read_headers(&mut self) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut header_line = Vec::new();
    loop {
      header_line.clear();
      let length = self.reader.read_until(b'\n', &mut header_line).await?;
      if length == 0 || header_line == CR_LF || header_line == b"\n" {
        break;
      }
      match parser_headers(&header_line) {
        Ok((Some(k), Some(v))) => {
          headers.append(k, v);
        }
        _ => {
          log::debug!("skipping malformed header line {}", header_line.escape_ascii());
        }
      }
    }
    Ok(headers)
  }
  fn has_body(&self, status: StatusCode) -> bool {
    !(self.config.method == Method::HEAD
      || status.is_informational()
      || status == StatusCode::NO_CONTENT
      || status == StatusCode::NOT_MODIFIED)
  }
  async fn read_body(&mut self, headers: &HeaderMap) -> Result<Vec<u8>> {
    let chunked = headers
      .get(http::header::TRANSFER_ENCODING)
      .and_then(|te| te.to_str().ok())
      .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    #[cfg(feature = "gzip")]
    let gzip = headers
      .get(http::header::CONTENT_ENCODING)
      .is_some_and(|ce| ce == "gzip");
    #[cfg(not(feature = "gzip"))]
    let gzip = false;
    // a gzip body is capped after inflation, not on the wire
    let wire_cap = if gzip { None } else { self.config.max_read };
    let body = if chunked {
      log::debug!("reading chunked body");
      self.read_chunked_body(wire_cap).await?
    } else {
      let content_length: Option<u64> = headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|x| x.to_str().ok()?.trim().parse().ok());
      let limit = match (content_length, wire_cap) {
        (Some(l), Some(max)) => Some(l.min(max)),
        (l, max) => l.or(max),
      };
      log::debug!("reading body with limit {limit:?}");
      self.read_limited_body(limit).await?
    };
    #[cfg(feature = "gzip")]
    if gzip {
      use std::io::Read;

      let mut gzip_body = Vec::new();
      let mut decoder = MultiGzDecoder::new(&body[..]);
      match self.config.max_read {
        Some(max) => decoder.by_ref().take(max).read_to_end(&mut gzip_body)?,
        None => decoder.read_to_end(&mut gzip_body)?,
      };
      log::trace!("inflated {} gzip bytes to {}", body.len(), gzip_body.len());
      return Ok(gzip_body);
    }
    Ok(body)
  }
  async fn read_limited_body(&mut self, limit: Option<u64>) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut buffer = vec![0; 8192];
    loop {
      let want = match limit {
        Some(l) if body.len() as u64 >= l => break,
        Some(l) => buffer.len().min((l - body.len() as u64) as usize),
        None => buffer.len(),
      };
      let read = self.reader.read(&mut buffer[..want]);
      let size = match self.config.timeout {
        Some(to) => match tokio::time::timeout(to, read).await {
          Ok(size) => size?,
          Err(_) => {
            log::debug!("body read timed out after {} bytes", body.len());
            break;
          }
        },
        None => read.await?,
      };
      if size == 0 {
        break;
      }
      body.extend_from_slice(&buffer[..size]);
    }
    Ok(body)
  }
  async fn read_chunked_body(&mut self, cap: Option<u64>) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    let mut line = Vec::new();
    let mut piece = vec![0; 8192];
    loop {
      line.clear();
      if self.reader.read_until(b'\n', &mut line).await? == 0 {
        return Err(new_io_error(
          std::io::ErrorKind::UnexpectedEof,
          "chunked body ended without a last chunk",
        ));
      }
      let size = String::from_utf8_lossy(&line);
      let size = size.split(';').next().unwrap_or_default().trim();
      if size.is_empty() {
        continue;
      }
      let size = u64::from_str_radix(size, 16)?;
      if size == 0 {
        // trailers
        loop {
          line.clear();
          let n = self.reader.read_until(b'\n', &mut line).await?;
          if n == 0 || line == CR_LF || line == b"\n" {
            break;
          }
        }
        break;
      }
      let read = body.len() as u64;
      let take = match cap {
        Some(max) => size.min(max.saturating_sub(read)),
        None => {
          if read.checked_add(size).is_none() {
            return Err(new_io_error(
              std::io::ErrorKind::InvalidData,
              "chunked body length overflows",
            ));
          }
          size
        }
      };
      let mut remaining = take;
      while remaining > 0 {
        let n = usize::try_from(remaining)
          .unwrap_or(usize::MAX)
          .min(piece.len());
        self.reader.read_exact(&mut piece[..n]).await?;
        body.extend_from_slice(&piece[..n]);
        remaining -= n as u64;
      }
      if take < size {
        log::debug!("chunked body capped at {} bytes", body.len());
        break;
      }
    }
    Ok(body)
  }

  /// Read the whole message and capture it as a `Response` for `url`.
  ///
  /// Interim `1xx` responses such as `100 Continue` are skipped. `101
  /// Switching Protocols` is final and is returned without a body.
  pub async fn build<U: Into<String>>(mut self, url: U) -> Result<Response> {
    let mut head = self.read_head().await?;
    while head.status.is_informational() && head.status != StatusCode::SWITCHING_PROTOCOLS {
      log::debug!("skipping interim {} response", head.status);
      head = self.read_head().await?;
    }
    let body = if self.has_body(head.status) {
      self.read_body(&head.headers).await?
    } else {
      Vec::new()
    };
    Response::from_exchange(body, url, &head)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct Closed;

  impl Exchange for Closed {
    fn response_code(&self) -> io::Result<StatusCode> {
      Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"))
    }
    fn response_message(&self) -> io::Result<String> {
      Ok(String::new())
    }
    fn header_fields(&self) -> io::Result<HeaderMap> {
      Ok(HeaderMap::new())
    }
  }

  fn response(status: u16, body: &'static str) -> Response {
    let mut head = ResponseHead::new(StatusCode::from_u16(status).unwrap());
    head
      .headers
      .insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());
    Response::from_exchange(body, "http://example.com/api", &head).unwrap()
  }

  #[test]
  fn broken_exchange_propagates_io_error() {
    match Response::from_exchange("", "http://example.com/", &Closed) {
      Err(Error::IO(err)) => assert_eq!(err.kind(), io::ErrorKind::NotConnected),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn is_success_covers_exactly_2xx() {
    for code in 100..=999u16 {
      let status = StatusCode::from_u16(code).unwrap();
      let resp = Response::from_exchange("", "", &ResponseHead::new(status)).unwrap();
      assert_eq!(resp.is_success(), (200..300).contains(&code), "{code}");
    }
  }

  #[test]
  fn require_success_is_identity_on_2xx() {
    let resp = response(201, "{}");
    let same = resp.clone().require_success().unwrap();
    assert_eq!(same, resp);

    let err = response(404, "{}").require_success().unwrap_err();
    let err = err.as_response_error().unwrap();
    assert_eq!(err.reason(), crate::Reason::Unsuccessful);
    assert_eq!(err.response().status_code(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn missing_headers_are_none() {
    let resp = response(200, "");
    assert_eq!(resp.header("x-missing"), None);
    assert_eq!(resp.header_list("x-missing"), None);
    assert_eq!(resp.content_type(), Some("application/json"));
    assert_eq!(resp.header("Content-Type"), Some("application/json"));
  }

  #[test]
  fn header_list_keeps_order() {
    let mut head = ResponseHead::new(StatusCode::OK);
    head.headers.append("via", "1.1 a".parse().unwrap());
    head.headers.append("via", "1.1 b".parse().unwrap());
    let resp = Response::from_exchange("", "", &head).unwrap();
    assert_eq!(resp.header("via"), Some("1.1 a"));
    assert_eq!(resp.header_list("via"), Some(vec!["1.1 a", "1.1 b"]));
  }

  #[test]
  fn content_length_parsing() {
    let mut head = ResponseHead::new(StatusCode::OK);
    assert_eq!(
      Response::from_exchange("", "", &head).unwrap().content_length().unwrap(),
      None
    );
    head
      .headers
      .insert(http::header::CONTENT_LENGTH, "42".parse().unwrap());
    assert_eq!(
      Response::from_exchange("", "", &head).unwrap().content_length().unwrap(),
      Some(42)
    );
    head
      .headers
      .insert(http::header::CONTENT_LENGTH, "forty-two".parse().unwrap());
    assert!(matches!(
      Response::from_exchange("", "", &head).unwrap().content_length(),
      Err(Error::IntError(_))
    ));
  }

  #[test]
  fn text_accessors() {
    let resp = response(200, "hello");
    assert_eq!(resp.as_bytes(), Some(&b"hello"[..]));
    assert_eq!(resp.as_string().as_deref(), Some("hello"));
    let empty = response(200, "");
    assert_eq!(empty.as_bytes(), None);
    assert_eq!(empty.as_string(), None);
    assert_eq!(empty.as_formatted_text(&|s: &str| s.to_uppercase()), None);
    assert_eq!(
      resp.as_formatted_text(&|s: &str| s.to_uppercase()).as_deref(),
      Some("HELLO")
    );
  }

  #[test]
  fn json_object_and_array() {
    let obj = response(200, r#"{"a":1}"#).as_json_object().unwrap();
    assert_eq!(obj.get("a"), Some(&Value::from(1)));
    let arr = response(200, "[1, 2]").as_json_array().unwrap();
    assert_eq!(arr, vec![Value::from(1), Value::from(2)]);
  }

  #[test]
  fn json_failures_are_unparseable() {
    let err = response(200, "not json").as_json_object().unwrap_err();
    assert!(matches!(
      err.as_response_error(),
      Some(ResponseError::Unparseable { .. })
    ));
    assert_eq!(err.reason(), Some(crate::Reason::Unparseable));

    let err = response(200, "[1]").as_json_object().unwrap_err();
    assert_eq!(err.reason(), Some(crate::Reason::Unparseable));

    let err = response(200, "").as_json_array().unwrap_err();
    assert!(matches!(
      err.as_response_error(),
      Some(ResponseError::NoContent(_))
    ));
    assert_eq!(err.reason(), Some(crate::Reason::Unparseable));
  }

  #[test]
  fn image_is_decoded_once() {
    let calls = AtomicUsize::new(0);
    let decoder = |bytes: &[u8]| {
      calls.fetch_add(1, Ordering::SeqCst);
      Some(bytes.len())
    };
    let resp = response(200, "GIF89a");
    let first = resp.as_image_with(&decoder).unwrap();
    let second = resp.as_image_with(&decoder).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, 6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn failed_image_decode_is_cached() {
    let calls = AtomicUsize::new(0);
    let decoder = |_: &[u8]| {
      calls.fetch_add(1, Ordering::SeqCst);
      None::<Vec<u8>>
    };
    let resp = response(200, "not an image");
    assert!(resp.as_image_with(&decoder).is_none());
    assert!(resp.as_image_with(&decoder).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn display_summary() {
    assert_eq!(
      response(404, "abc").to_string(),
      "http://example.com/api, 404 Not Found, 3 bytes"
    );
    assert_eq!(
      response(200, "").to_string(),
      "http://example.com/api, 200 OK, 0 bytes"
    );
  }

  #[test]
  fn raw_round_trip_keeps_reason() {
    let raw = response(404, "{}").to_raw();
    assert!(raw.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    assert!(raw.ends_with(b"\r\n\r\n{}"));
  }

  #[cfg(feature = "charset")]
  #[test]
  fn charset_from_content_type() {
    let mut head = ResponseHead::new(StatusCode::OK);
    head.headers.insert(
      http::header::CONTENT_TYPE,
      "text/plain; charset=iso-8859-1".parse().unwrap(),
    );
    let resp = Response::from_exchange(vec![0x63, 0x61, 0x66, 0xe9], "", &head).unwrap();
    assert_eq!(resp.text_with_charset("utf-8").as_deref(), Some("café"));
  }
}
