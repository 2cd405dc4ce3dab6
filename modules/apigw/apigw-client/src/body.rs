use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use crate::error::ClientError;

/// A value that can be turned into JSON text at dispatch time.
///
/// Implemented for every `Serialize` type. Serialization is deferred so that a
/// failure surfaces from the dispatcher before any transport is contacted.
pub trait JsonBody: Send + Sync {
    /// Serialize the value to its JSON text.
    ///
    /// # Errors
    /// Returns the serializer error when the value has no JSON representation.
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

impl<T: Serialize + Send + Sync> JsonBody for T {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A view over a region of a shared byte buffer.
///
/// Normalization sends the whole backing buffer, not only the viewed region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteView {
    buffer: Bytes,
    offset: usize,
    len: usize,
}

impl ByteView {
    /// A view covering the entire buffer.
    #[must_use]
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        let buffer = buffer.into();
        let len = buffer.len();
        Self {
            buffer,
            offset: 0,
            len,
        }
    }

    /// A view over `len` bytes of `buffer` starting at `offset`.
    ///
    /// # Errors
    /// Returns `ClientError::BuildError` when the range exceeds the buffer.
    pub fn with_range(
        buffer: impl Into<Bytes>,
        offset: usize,
        len: usize,
    ) -> Result<Self, ClientError> {
        let buffer = buffer.into();
        match offset.checked_add(len) {
            Some(end) if end <= buffer.len() => Ok(Self {
                buffer,
                offset,
                len,
            }),
            _ => Err(ClientError::BuildError(format!(
                "view {offset}+{len} out of bounds for buffer of {} bytes",
                buffer.len()
            ))),
        }
    }

    /// The viewed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.len]
    }

    /// Number of viewed bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Give up the view and return the backing buffer.
    #[must_use]
    pub fn into_buffer(self) -> Bytes {
        self.buffer
    }
}

/// Opaque binary content with an optional media type, such as a file picked
/// for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    content_type: Option<String>,
    name: Option<String>,
}

impl Blob {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            name: None,
        }
    }

    /// Read a file into a blob named after the file.
    ///
    /// # Errors
    /// Returns `ClientError::Io` when the file cannot be read.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(Self {
            bytes: Bytes::from(bytes),
            content_type: None,
            name,
        })
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Caller-supplied request payload, before normalization.
#[derive(Default)]
pub enum Payload {
    /// No payload
    #[default]
    Absent,
    /// A raw binary buffer
    Buffer(Bytes),
    /// A view over a binary buffer
    View(ByteView),
    /// An opaque blob, sent as-is
    Blob(Blob),
    /// Any other value, sent as JSON text
    Structured(Box<dyn JsonBody>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Absent => write!(f, "Payload::Absent"),
            Payload::Buffer(bytes) => f.debug_tuple("Payload::Buffer").field(&bytes.len()).finish(),
            Payload::View(view) => f.debug_tuple("Payload::View").field(&view.len()).finish(),
            Payload::Blob(blob) => f.debug_tuple("Payload::Blob").field(&blob.len()).finish(),
            Payload::Structured(_) => write!(f, "Payload::Structured(..)"),
        }
    }
}

impl Payload {
    /// Wrap any serializable value; it is turned into JSON text when the
    /// request is prepared. A value that serializes to `null` is sent as no
    /// body.
    #[must_use]
    pub fn json<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Payload::Structured(Box::new(value))
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    /// Classify the payload into its transport-ready form.
    ///
    /// Order matters: views, then buffers, then blobs, then absence, and
    /// everything else is serialized. Structured values whose JSON text is
    /// `null` count as absent.
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` when a structured value cannot be
    /// represented as JSON.
    pub fn normalize(self) -> Result<NormalizedBody, ClientError> {
        let body = match self {
            Payload::View(view) => NormalizedBody::Binary(view.into_buffer()),
            Payload::Buffer(bytes) => NormalizedBody::Binary(bytes),
            Payload::Blob(blob) => NormalizedBody::Blob(blob),
            Payload::Absent => NormalizedBody::Empty,
            Payload::Structured(value) => {
                let text = value.to_json()?;
                if text == "null" {
                    NormalizedBody::Empty
                } else {
                    NormalizedBody::Json(text)
                }
            }
        };
        Ok(body)
    }
}

impl From<()> for Payload {
    fn from((): ()) -> Self {
        Payload::Absent
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Buffer(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Buffer(Bytes::from(v))
    }
}

impl From<ByteView> for Payload {
    fn from(view: ByteView) -> Self {
        Payload::View(view)
    }
}

impl From<Blob> for Payload {
    fn from(blob: Blob) -> Self {
        Payload::Blob(blob)
    }
}

/// JSON `null` counts as absent; every other value is structured.
impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        if value.is_null() {
            Payload::Absent
        } else {
            Payload::Structured(Box::new(value))
        }
    }
}

/// Text is a structured value too, so it goes out as a JSON string literal.
impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Structured(Box::new(s))
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Structured(Box::new(s.to_owned()))
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Absent, Into::into)
    }
}

/// Request body in the only shapes a transport accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NormalizedBody {
    #[default]
    Empty,
    Binary(Bytes),
    Blob(Blob),
    Json(String),
}

impl NormalizedBody {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedBody::Empty)
    }

    /// Media type the body carries on its own, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            NormalizedBody::Blob(blob) => blob.content_type(),
            _ => None,
        }
    }

    /// The bytes that go on the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            NormalizedBody::Empty => Bytes::new(),
            NormalizedBody::Binary(bytes) => bytes.clone(),
            NormalizedBody::Blob(blob) => blob.bytes().clone(),
            NormalizedBody::Json(text) => Bytes::from(text.clone()),
        }
    }
}
