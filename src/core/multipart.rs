//! In-memory `multipart/form-data` encoder
//!
//! The API signs the MD5 of the complete request body, so multipart bodies
//! are assembled into a single buffer before sending instead of streamed.

use uuid::Uuid;

/// Multipart body under construction
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    buffer: Vec<u8>,
}

impl MultipartBody {
    /// Start a body with a random boundary
    pub fn new() -> Self {
        Self::with_boundary(format!("lara-{}", Uuid::new_v4().simple()))
    }

    /// Start a body with a fixed boundary
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buffer: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a file part
    pub fn add_file(&mut self, field: &str, filename: &str, content: &[u8]) {
        self.open_part();
        self.buffer.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quotes(field),
                escape_quotes(filename)
            )
            .as_bytes(),
        );
        self.buffer
            .extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        self.buffer.extend_from_slice(content);
        self.buffer.extend_from_slice(b"\r\n");
    }

    /// Append a plain text field
    pub fn add_field(&mut self, name: &str, value: &str) {
        self.open_part();
        self.buffer.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_quotes(name)
            )
            .as_bytes(),
        );
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.extend_from_slice(b"\r\n");
    }

    /// Write the closing boundary and return the encoded bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buffer
    }

    fn open_part(&mut self) {
        self.buffer
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
