use crate::AssetError;
use hologram_scene::Texture;
use std::path::Path;

/// Load an image file into an RGBA8 texture.
pub fn load_texture(path: impl AsRef<Path>) -> Result<Texture, AssetError> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    let label = path.display().to_string();
    let texture = Texture::from_rgba(label.clone(), width, height, image.into_raw())
        .ok_or(AssetError::InvalidTexture(label))?;
    tracing::debug!(path = %path.display(), width, height, "texture loaded");
    Ok(texture)
}

/// Decode an in-memory image (PNG, JPEG, ...) into an RGBA8 texture.
pub fn decode_texture(label: &str, bytes: &[u8]) -> Result<Texture, AssetError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    Texture::from_rgba(label, width, height, image.into_raw())
        .ok_or_else(|| AssetError::InvalidTexture(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path) {
        let mut img = image::RgbaImage::new(4, 2);
        img.put_pixel(3, 1, image::Rgba([255, 128, 0, 200]));
        img.save(path).unwrap();
    }

    #[test]
    fn loads_png_as_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle.png");
        write_png(&path);

        let texture = load_texture(&path).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.rgba.len(), 4 * 2 * 4);
        assert_eq!(texture.pixel(3, 1), Some([255, 128, 0, 200]));
    }

    #[test]
    fn missing_texture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_texture(dir.path().join("nope.png")).is_err());
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(decode_texture("junk", b"definitely not an image").is_err());
    }
}
