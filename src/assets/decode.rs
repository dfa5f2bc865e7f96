use eframe::egui::ColorImage;

use super::fetch::AssetError;

pub(crate) const DEFAULT_ICON_PNG: &[u8] = include_bytes!("../../assets/default_icon.png");

const THUMBNAIL_MAX_EDGE: u32 = 256;

pub fn decode_thumbnail(url: &str, bytes: &[u8]) -> Result<ColorImage, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
        url: url.to_owned(),
        source,
    })?;

    let decoded = if decoded.width() > THUMBNAIL_MAX_EDGE || decoded.height() > THUMBNAIL_MAX_EDGE
    {
        decoded.thumbnail(THUMBNAIL_MAX_EDGE, THUMBNAIL_MAX_EDGE)
    } else {
        decoded
    };

    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// The bundled default icon, substituted for every thumbnail that fails.
pub fn fallback_icon() -> ColorImage {
    match decode_thumbnail("bundled default icon", DEFAULT_ICON_PNG) {
        Ok(image) => image,
        Err(error) => {
            log::error!("bundled default icon is unreadable: {error}");
            ColorImage::from_rgba_unmultiplied([8, 8], &[96u8, 96, 96, 255].repeat(64))
        }
    }
}
