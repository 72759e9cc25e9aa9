/// A decoded RGBA8 image kept on the CPU until a renderer uploads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Texture {
    /// Returns `None` when the pixel buffer does not match the dimensions.
    pub fn from_rgba(
        label: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            label: label.into(),
            width,
            height,
            rgba,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }
}
