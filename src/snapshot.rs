//! Canvas snapshots: PNG wrapped in a base64 data URL, so the whole bitmap
//! fits in a single string value of the key/value store.

use std::io::Cursor;
use std::sync::mpsc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};

use crate::error::{PadError, Result};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

pub fn encode_data_url(image: &RgbaImage) -> Result<String> {
    let mut png = Vec::new();
    PngEncoder::new(Cursor::new(&mut png)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;

    let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    url.push_str(PNG_DATA_URL_PREFIX);
    STANDARD.encode_string(&png, &mut url);
    Ok(url)
}

/// Decode any `data:<mime>;base64,<payload>` URL holding an image.
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let rest = url.trim().strip_prefix("data:").ok_or(PadError::NotADataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(PadError::NotADataUrl)?;
    if !header.ends_with(";base64") {
        return Err(PadError::NotADataUrl);
    }
    let bytes = STANDARD.decode(payload)?;
    Ok(image::load_from_memory(&bytes)?.into_rgba8())
}

// ============================================================================
// Background restore
// ============================================================================

/// A snapshot decode running off the UI thread. Poll once per frame; the
/// result is delivered exactly once.
pub struct SnapshotLoader {
    receiver: mpsc::Receiver<Result<RgbaImage>>,
}

impl SnapshotLoader {
    pub fn spawn(data_url: String) -> Self {
        let (sender, receiver) = mpsc::channel();
        rayon::spawn(move || {
            // The receiver may already be gone if the app shut down first.
            let _ = sender.send(decode_data_url(&data_url));
        });
        Self { receiver }
    }

    /// `None` while the decode is still running.
    pub fn try_take(&self) -> Option<Result<RgbaImage>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(PadError::DecoderGone)),
        }
    }
}
