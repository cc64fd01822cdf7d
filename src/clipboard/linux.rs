use super::backend::{Backend, Negotiation};
use crate::models::ImageFormat;

/// Linux backends in order of preference
pub const CHAIN: &[Backend] = &[Backend::WlPaste, Backend::Xclip, Backend::Xsel];

pub const INSTALL_HINT: &str =
    "Install wl-clipboard (Wayland) or xclip (X11) to paste images from the clipboard.";

/// Arguments that make a tool print the MIME types on the clipboard, one per line
pub(super) fn list_types_args(backend: Backend) -> Vec<&'static str> {
    match backend {
        Backend::WlPaste => vec!["--list-types"],
        Backend::Xclip => vec!["-selection", "clipboard", "-t", "TARGETS", "-o"],
        _ => Vec::new(),
    }
}

/// Arguments that make a tool write the clipboard contents for `format` to stdout
pub(super) fn fetch_args(backend: Backend, format: ImageFormat) -> Vec<&'static str> {
    match backend {
        Backend::WlPaste => vec!["--no-newline", "--type", format.mime_type()],
        Backend::Xclip => vec!["-selection", "clipboard", "-t", format.mime_type(), "-o"],
        _ => Vec::new(),
    }
}

/// Pick the preferred image type out of a newline separated type listing
pub(super) fn parse_type_list(stdout: &[u8]) -> Negotiation {
    let listing = String::from_utf8_lossy(stdout);
    let offered: Vec<ImageFormat> = listing
        .lines()
        .filter_map(|line| ImageFormat::from_mime(line.trim()))
        .collect();

    ImageFormat::PRIORITY
        .into_iter()
        .find(|format| offered.contains(format))
        .map(Negotiation::Format)
        .unwrap_or(Negotiation::NoImage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_preferred_over_listing_order() {
        let negotiation = parse_type_list(b"image/gif\nimage/jpeg\nimage/png\n");
        assert_eq!(negotiation, Negotiation::Format(ImageFormat::Png));
    }

    #[test]
    fn test_jpeg_before_gif() {
        let negotiation = parse_type_list(b"text/plain\nimage/gif\nimage/jpeg\n");
        assert_eq!(negotiation, Negotiation::Format(ImageFormat::Jpeg));
    }

    #[test]
    fn test_no_image_types() {
        assert_eq!(
            parse_type_list(b"TARGETS\nUTF8_STRING\ntext/plain;charset=utf-8\n"),
            Negotiation::NoImage
        );
        assert_eq!(parse_type_list(b""), Negotiation::NoImage);
    }

    #[test]
    fn test_unsupported_image_types_are_ignored() {
        assert_eq!(
            parse_type_list(b"image/webp\nimage/bmp\n"),
            Negotiation::NoImage
        );
    }

    #[test]
    fn test_crlf_listing() {
        assert_eq!(
            parse_type_list(b"text/plain\r\nimage/png\r\n"),
            Negotiation::Format(ImageFormat::Png)
        );
    }

    #[test]
    fn test_chain_order() {
        assert_eq!(CHAIN, &[Backend::WlPaste, Backend::Xclip, Backend::Xsel]);
    }

    #[test]
    fn test_fetch_args() {
        assert_eq!(
            fetch_args(Backend::Xclip, ImageFormat::Png),
            vec!["-selection", "clipboard", "-t", "image/png", "-o"]
        );
        assert_eq!(
            fetch_args(Backend::WlPaste, ImageFormat::Jpeg),
            vec!["--no-newline", "--type", "image/jpeg"]
        );
    }
}
