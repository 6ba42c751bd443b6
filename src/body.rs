use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

/// The fully read bytes of a response body.
///
/// Cloning is cheap: clones share the same underlying buffer.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Body {
  inner: Bytes,
}

impl Body {
  /// Body length in bytes.
  #[inline]
  pub fn len(&self) -> usize {
    self.inner.len()
  }
  /// `true` when the body holds no bytes.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }
  /// Lossy UTF-8 view, invalid sequences become U+FFFD.
  pub fn to_utf8_lossy(&self) -> String {
    String::from_utf8_lossy(&self.inner).into_owned()
  }
  /// Consume the body and return its bytes.
  pub fn into_bytes(self) -> Bytes {
    self.inner
  }
}

impl Deref for Body {
  type Target = Bytes;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl AsRef<[u8]> for Body {
  fn as_ref(&self) -> &[u8] {
    &self.inner
  }
}

impl From<Bytes> for Body {
  #[inline]
  fn from(b: Bytes) -> Body {
    Body { inner: b }
  }
}

impl From<String> for Body {
  #[inline]
  fn from(s: String) -> Body {
    s.into_bytes().into()
  }
}

impl From<&'static str> for Body {
  #[inline]
  fn from(s: &'static str) -> Body {
    s.as_bytes().into()
  }
}

impl From<&'static [u8]> for Body {
  #[inline]
  fn from(s: &'static [u8]) -> Body {
    Body {
      inner: Bytes::from_static(s),
    }
  }
}

impl From<Vec<u8>> for Body {
  #[inline]
  fn from(v: Vec<u8>) -> Body {
    Body { inner: v.into() }
  }
}

impl From<Option<Vec<u8>>> for Body {
  #[inline]
  fn from(v: Option<Vec<u8>>) -> Body {
    v.map(Body::from).unwrap_or_default()
  }
}

impl fmt::Debug for Body {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match std::str::from_utf8(&self.inner) {
      Ok(s) => fmt::Debug::fmt(s, f),
      Err(_err) => write!(f, "b\"{}\"", self.inner.escape_ascii()),
    }
  }
}

impl fmt::Display for Body {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match std::str::from_utf8(&self.inner) {
      Ok(s) => fmt::Display::fmt(s, f),
      Err(_err) => write!(f, "{}", self.inner.escape_ascii()),
    }
  }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for Body {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_bytes(&self.inner)
  }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for Body {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let s = Vec::deserialize(deserializer)?;
    Ok(Body::from(s))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lossy_text_replaces_invalid_sequences() {
    let body = Body::from(vec![b'o', b'k', 0xff]);
    assert_eq!(body.to_utf8_lossy(), "ok\u{fffd}");
  }

  #[test]
  fn missing_vec_is_empty() {
    assert!(Body::from(None::<Vec<u8>>).is_empty());
  }

  #[test]
  fn debug_escapes_binary() {
    let body = Body::from(vec![0x00, 0xff]);
    assert_eq!(format!("{body:?}"), "b\"\\x00\\xff\"");
  }
}
