use uuid::Uuid;

const CRLF: &str = "\r\n";

/// `multipart/form-data` body builder.
///
/// Each body gets a fresh random boundary.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    buffer: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// An empty body with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("Boundary-{}", Uuid::new_v4()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buffer: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a plain text part.
    pub fn field(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{name}\"{CRLF}{CRLF}"
        ));
        self.push(value);
        self.push(CRLF);
        self
    }

    pub fn file(
        &mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> &mut Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"{CRLF}"
        ));
        self.push(&format!("Content-Type: {content_type}{CRLF}{CRLF}"));
        self.buffer.extend_from_slice(bytes);
        self.push(CRLF);
        self
    }

    /// Close the body with the terminating boundary.
    pub fn finish(mut self) -> Vec<u8> {
        let closing = format!("--{}--{CRLF}", self.boundary);
        self.push(&closing);
        self.buffer
    }

    fn open_part(&mut self) {
        let opening = format!("--{}{CRLF}", self.boundary);
        self.push(&opening);
    }

    fn push(&mut self, text: &str) {
        self.buffer.extend_from_slice(text.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_rfc_7578() {
        let mut body = MultipartBody::with_boundary("XyZ");
        body.field("name", "Jo")
            .file("photo", "photo.jpg", "image/jpeg", &[0xFF, 0xD8]);
        assert_eq!(body.content_type(), "multipart/form-data; boundary=XyZ");

        let mut expected = b"--XyZ\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nJo\r\n\
--XyZ\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"photo.jpg\"\r\n\
Content-Type: image/jpeg\r\n\r\n"
            .to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8]);
        expected.extend_from_slice(b"\r\n--XyZ--\r\n");

        assert_eq!(body.finish(), expected);
    }

    #[test]
    fn boundaries_are_unique() {
        let a = MultipartBody::new();
        let b = MultipartBody::new();
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.boundary().starts_with("Boundary-"));
    }
}
