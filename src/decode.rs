//! Pluggable body decoders.
//!
//! A [`Response`](crate::Response) knows how to hand its bytes to a decoder but
//! not how to rasterize an image or render markup. Both are supplied by the
//! caller through the traits in this module, so the same response type works
//! with whatever imaging or rich-text stack the application already carries.
//!
//! Closures implement both traits:
//!
//! ```rust
//! use bridge_response::Response;
//!
//! let resp = Response::from(Response::builder().body("<b>hi</b>").unwrap());
//! let strip = |markup: &str| markup.replace("<b>", "").replace("</b>", "");
//! let plain = resp.as_formatted_text(&strip);
//! assert_eq!(plain.as_deref(), Some("hi"));
//! ```

/// Turns raw body bytes into an in-memory image.
pub trait ImageDecoder {
  /// The decoded image type.
  type Image: Send + Sync + 'static;
  /// Decode `bytes`, or `None` when they are not a supported image.
  fn decode(&self, bytes: &[u8]) -> Option<Self::Image>;
}

impl<F, I> ImageDecoder for F
where
  F: Fn(&[u8]) -> Option<I>,
  I: Send + Sync + 'static,
{
  type Image = I;

  fn decode(&self, bytes: &[u8]) -> Option<I> {
    self(bytes)
  }
}

/// Turns markup text into a rich-text representation.
pub trait MarkupRenderer {
  /// The rendered form.
  type Output;
  /// Render `markup`.
  fn render(&self, markup: &str) -> Self::Output;
}

impl<F, O> MarkupRenderer for F
where
  F: Fn(&str) -> O,
{
  type Output = O;

  fn render(&self, markup: &str) -> O {
    self(markup)
  }
}

/// Decodes common raster formats (PNG, JPEG, GIF, BMP) with the `image` crate.
///
/// # Optional
///
/// This requires the optional `image` feature to be enabled.
#[cfg(feature = "image")]
#[cfg_attr(docsrs, doc(cfg(feature = "image")))]
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterDecoder;

#[cfg(feature = "image")]
impl ImageDecoder for RasterDecoder {
  type Image = image::DynamicImage;

  fn decode(&self, bytes: &[u8]) -> Option<image::DynamicImage> {
    match image::load_from_memory(bytes) {
      Ok(img) => Some(img),
      Err(err) => {
        log::debug!("body is not a decodable image: {err}");
        None
      }
    }
  }
}
