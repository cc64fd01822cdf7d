use std::fmt;

/// Image encodings that can be pulled off the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Order in which clipboard types are matched when a backend lists several
    pub const PRIORITY: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif];

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }

    /// Parse a MIME type as advertised by a clipboard tool
    /// Parameters such as `;charset=` are ignored
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Identify the encoding from the leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Raw bytes produced by one backend invocation, consumed once by persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImagePayload {
    /// Build a payload, trusting the magic bytes over the negotiated format
    /// when they clearly identify a different supported encoding
    pub fn validated(bytes: Vec<u8>, negotiated: ImageFormat) -> Self {
        let format = match ImageFormat::sniff(&bytes) {
            Some(sniffed) if sniffed != negotiated => {
                log::debug!(
                    target: "clipboard",
                    "Clipboard advertised {} but bytes look like {}",
                    negotiated,
                    sniffed
                );
                sniffed
            }
            _ => negotiated,
        };
        ImagePayload { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime("image/gif; foo=bar"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_mime("image/webp"), None);
        assert_eq!(ImageFormat::from_mime("text/plain"), None);
    }

    #[test]
    fn test_default_is_png() {
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
        assert_eq!(ImageFormat::PRIORITY[0], ImageFormat::Png);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(ImageFormat::sniff(&PNG_MAGIC), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a\x01\x00"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"hello world"), None);
    }

    #[test]
    fn test_validated_prefers_magic_bytes() {
        let payload = ImagePayload::validated(PNG_MAGIC.to_vec(), ImageFormat::Jpeg);
        assert_eq!(payload.format, ImageFormat::Png);

        // Unknown bytes keep whatever was negotiated
        let payload = ImagePayload::validated(b"not an image".to_vec(), ImageFormat::Gif);
        assert_eq!(payload.format, ImageFormat::Gif);
        assert_eq!(payload.len(), 12);
    }
}
