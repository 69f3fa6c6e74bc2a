use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Storage directory for copies of user-supplied images.
///
/// Copies are named by the original file's base name; a later image with
/// the same base name silently overwrites the earlier copy.
pub struct SavedImageArea {
    dir: PathBuf,
}

impl SavedImageArea {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, String> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create image dir {}: {}", dir.display(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies `src` into the image area and returns the copy's path.
    pub fn store(&self, src: &Path) -> Result<PathBuf, String> {
        let name = src
            .file_name()
            .ok_or_else(|| format!("Not a file path: {}", src.display()))?;
        let dest = self.dir.join(name);
        std::fs::copy(src, &dest)
            .map_err(|e| format!("Failed to copy {}: {}", src.display(), e))?;
        Ok(dest)
    }
}

/// Reads an image, downscales it for efficiency (max 1280px wide), and
/// returns it as base64-encoded PNG for the captioning model.
pub fn encode_for_caption(path: &Path) -> Result<String, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to read image {}: {}", path.display(), e))?;
    let rgba = image.to_rgba8();

    let width = rgba.width();
    let height = rgba.height();

    let rgba = if width > 1280 {
        let scale = 1280.0 / width as f64;
        let new_height = (height as f64 * scale) as u32;
        image::imageops::resize(&rgba, 1280, new_height, image::imageops::FilterType::Triangle)
    } else {
        rgba
    };

    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| format!("Failed to encode image: {}", e))?;

    Ok(STANDARD.encode(buffer.into_inner()))
}
