#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # bridge-response
//!
//! The `bridge_response` crate models the captured result of one completed
//! HTTP exchange: a [`Response`].
//!
//! A `Response` is built once, after the body has been read in full, and is
//! immutable from then on. It offers typed views over the body:
//!
//! - raw bytes and UTF-8 text
//! - JSON objects, arrays or any `serde` type
//! - images, through a pluggable [`ImageDecoder`](decode::ImageDecoder)
//! - rich text, through a pluggable [`MarkupRenderer`](decode::MarkupRenderer)
//! - files on disk
//!
//! ## Capturing a response
//!
//! Anything that implements [`Exchange`] can be captured. [`ResponseHead`] is
//! the simplest one, and [`ResponseBuilder`] reads a full HTTP/1.x message off
//! any `AsyncRead`.
//!
//! ```rust
//! use bridge_response::{Response, ResponseHead};
//!
//! # fn run() -> Result<(), bridge_response::Error> {
//! let mut head = ResponseHead::parse_status_line(b"HTTP/1.1 200 OK\r\n")?;
//! head.headers.insert(bridge_response::header::CONTENT_TYPE, "application/json".parse().unwrap());
//! let resp = Response::from_exchange(r#"{"a":1}"#, "http://example.com/a", &head)?
//!   .require_success()?;
//! assert_eq!(resp.as_json_object()?["a"], 1);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ## Errors
//!
//! Decoding and assertion failures surface as [`ResponseError`], which carries
//! the response that caused it and classifies itself with a [`Reason`].
//!
//! ## Optional Features
//!
//! The following are a list of [Cargo features][cargo-features] that can be
//! enabled or disabled:
//!
//! - **charset**: Improved support for decoding text.
//! - **gzip**: Provides response body gzip decompression.
//! - **image**: Provides a default raster image decoder.
//! - **serialize**: Provides serialization and deserialization support.
//!
//! [cargo-features]: https://doc.rust-lang.org/stable/cargo/reference/manifest.html#the-features-section
mod body;
/// Pluggable body decoders
pub mod decode;
mod errors;
mod exchange;
mod response;

pub use body::Body;
pub use errors::{Error, Reason, ResponseError, Result};
pub use exchange::{Exchange, ResponseHead};
pub use http::header;
pub use http::{HeaderMap, Method, StatusCode, Version};
pub use response::{Response, ResponseBuilder, ResponseConfig};

pub(crate) const CR_LF: &[u8] = &[13, 10];
pub(crate) const SPACE: &[u8] = &[32];
pub(crate) const COLON_SPACE: &[u8] = &[58, 32];
