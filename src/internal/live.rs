//! The live frame: the rendered view the reference is compared against.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use std::path::Path;

pub const DEMO_FRAME_WIDTH: u32 = 400;
pub const DEMO_FRAME_HEIGHT: u32 = 100;

/// Decode a screenshot of the view under test.
pub fn load_live_frame(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to open live image {}", path.display()))?;
    let frame = img.to_rgba8();
    if frame.width() == 0 || frame.height() == 0 {
        anyhow::bail!("live image {} is empty", path.display());
    }
    Ok(frame)
}

/// Horizontal red to green gradient, used when no screenshot is configured.
pub fn demo_frame(width: u32, height: u32) -> RgbaImage {
    let span = width.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(width, height, |x, _| {
        let t = x as f32 / span;
        Rgba([
            ((1.0 - t) * 255.0).round() as u8,
            (t * 255.0).round() as u8,
            0,
            255,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_frame_gradient_ends() {
        let frame = demo_frame(DEMO_FRAME_WIDTH, DEMO_FRAME_HEIGHT);
        assert_eq!(frame.dimensions(), (400, 100));
        assert_eq!(*frame.get_pixel(0, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*frame.get_pixel(399, 50), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_missing_live_image_is_an_error() {
        let err = load_live_frame(Path::new("/nonexistent/live.png")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to open live image"));
    }
}
