//! # Inline Product Images
//!
//! Product photos are stored in the catalog as base64 text next to their
//! MIME type, and shown through `data:` URIs.
//!
//! ```text
//! picked file (bytes + uri) ──encode_image──► EncodedImage { data, mime_type }
//!                                                    │
//!                                                    ▼
//!                                    products.image_data / products.mime_type
//!                                                    │
//!                                                    ▼
//!                              data_uri() ──► "data:image/png;base64,iVBOR..."
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};

/// MIME type used when the file extension is unknown.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A photo ready to be stored on a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

/// Guesses the MIME type from the extension of a picked file.
pub fn mime_type_from_uri(uri: &str) -> &'static str {
    let extension = uri
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// Encodes raw image bytes for storage.
pub fn encode_image(bytes: &[u8], uri: &str) -> EncodedImage {
    EncodedImage {
        data: STANDARD.encode(bytes),
        mime_type: mime_type_from_uri(uri).to_string(),
    }
}

pub fn data_uri(data: &str, mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, data)
}
