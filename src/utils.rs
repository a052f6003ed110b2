//! Small helpers shared across the library.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::Error;

/// Sniffs the image format of raw bytes and encodes them as a
/// `data:` URI suitable for the avatar and icon fields of the API.
///
/// Supports PNG, JPEG, GIF and WebP. Returns
/// [`Error::UnsupportedImage`] for anything else.
pub fn image_data(bytes: &[u8]) -> Result<String, Error> {
    let mime = sniff_mime(bytes).ok_or(Error::UnsupportedImage)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"\xff\xd8\xff")
        || bytes.get(6..10) == Some(b"JFIF".as_slice())
        || bytes.get(6..10) == Some(b"Exif".as_slice())
    {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let bytes = b"\x89PNG\r\n\x1a\nrest";
        let uri = image_data(bytes).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_magic() {
        let uri = image_data(b"\xff\xd8\xff\xe0body").unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_gif_magic() {
        let uri = image_data(b"GIF89abody").unwrap();
        assert!(uri.starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_webp_magic() {
        let uri = image_data(b"RIFF\x00\x00\x00\x00WEBPVP8 ").unwrap();
        assert!(uri.starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            image_data(b"plain text"),
            Err(Error::UnsupportedImage)
        ));
    }

    #[test]
    fn test_base64_payload_round_trips() {
        let bytes = b"GIF87a\x01\x02\x03";
        let uri = image_data(bytes).unwrap();
        let encoded = uri.split(',').nth(1).unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
    }
}
