//! Immutable view over a cached value.

use bytes::Bytes;

/// An immutable, length-tagged byte sequence.
///
/// Values are copied once at ingress and never mutated afterwards, so a
/// `ByteView` can be cloned and handed out freely: clones share the same
/// frozen buffer, and no holder can observe another's mutations because
/// there are none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Copy `data` into a new view.
    ///
    /// Use this when the caller retains (and may reuse) its buffer.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Length of the value in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the value bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy the value into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Unwrap into the underlying frozen buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteView {
    /// Take ownership of `data` without copying; moving the vector in is
    /// what guarantees no other holder can mutate it.
    fn from(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl std::fmt::Display for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl lruk::Weight for ByteView {
    fn weight(&self) -> usize {
        self.len()
    }
}
