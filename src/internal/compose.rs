//! Composition of the live frame and the reference image.
//!
//! Pure: the output depends only on the live frame and the overlay state, so the
//! host can call [`compose`] again after every state change.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::internal::models::Bitmap;
use crate::internal::overlay::{OverlayMode, OverlayState};

pub const SPLIT_LINE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Diameter of the drag handle disc, in frame pixels.
pub const HANDLE_DIAMETER: u32 = 40;
pub const HANDLE_OPACITY: f32 = 0.4;

/// Result of one composition pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub frame: RgbaImage,
    /// The reference is still resolving; the host should show a progress indicator.
    pub progress: bool,
    /// Split line position in frame pixels when the compare slider is shown.
    pub split_x: Option<f32>,
}

/// Placement of a scaled-to-fit image inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest rect with the image's aspect ratio that fits the container, centered.
pub fn fit_rect(image: (u32, u32), container: (u32, u32)) -> FitRect {
    let (iw, ih) = image;
    let (cw, ch) = container;
    if iw == 0 || ih == 0 || cw == 0 || ch == 0 {
        return FitRect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let scale = (cw as f64 / iw as f64).min(ch as f64 / ih as f64);
    let width = ((iw as f64 * scale).round() as u32).clamp(1, cw);
    let height = ((ih as f64 * scale).round() as u32).clamp(1, ch);

    FitRect {
        x: (cw - width) / 2,
        y: (ch - height) / 2,
        width,
        height,
    }
}

/// Reference resampled to its fitted size inside one container.
///
/// Resampling is the expensive part of a composition and depends only on the
/// reference and the container size, so hosts keep one of these across redraws.
#[derive(Debug, Clone)]
pub struct FittedReference {
    source: Bitmap,
    container: (u32, u32),
    rect: FitRect,
    resampled: Option<RgbaImage>,
}

impl FittedReference {
    pub fn new(reference: &Bitmap, container: (u32, u32)) -> Self {
        let rect = fit_rect(reference.dimensions(), container);
        let resampled = match (rect.width, rect.height) == reference.dimensions() {
            true => None,
            false => Some(imageops::resize(
                &**reference,
                rect.width,
                rect.height,
                FilterType::Triangle,
            )),
        };
        Self {
            source: reference.clone(),
            container,
            rect,
            resampled,
        }
    }

    /// Whether this was built from `reference` for `container`.
    pub fn matches(&self, reference: &Bitmap, container: (u32, u32)) -> bool {
        Arc::ptr_eq(&self.source, reference) && self.container == container
    }

    pub fn rect(&self) -> FitRect {
        self.rect
    }

    pub fn image(&self) -> &RgbaImage {
        self.resampled.as_ref().unwrap_or(&*self.source)
    }
}

pub fn compose(live: &RgbaImage, state: &OverlayState) -> Composition {
    compose_fitted(live, state, None)
}

/// [`compose`] reusing `fitted` when it was built for the current reference and frame
/// size. A stale or missing `fitted` is rebuilt for this call.
pub fn compose_fitted(
    live: &RgbaImage,
    state: &OverlayState,
    fitted: Option<&FittedReference>,
) -> Composition {
    let mut frame = live.clone();

    if state.mode() == OverlayMode::Hidden {
        return Composition {
            frame,
            progress: false,
            split_x: None,
        };
    }

    let Some(reference) = state.resolved_image() else {
        // Failures show nothing in place of the reference; the error goes out through
        // the host's notification channel instead.
        return Composition {
            frame,
            progress: state.is_pending(),
            split_x: None,
        };
    };

    let (width, height) = frame.dimensions();
    let fresh;
    let fitted = match fitted {
        Some(f) if f.matches(reference, (width, height)) => f,
        _ => {
            fresh = FittedReference::new(reference, (width, height));
            &fresh
        }
    };
    let rect = fitted.rect();
    let scaled = fitted.image();

    let split_x = match state.mode() {
        OverlayMode::Compare => Some(state.split_x(width as f32)),
        _ => None,
    };
    // Left-aligned mask: only container columns left of the split show the reference
    let mask_right = split_x.unwrap_or(f32::INFINITY);

    for (sx, sy, pixel) in scaled.enumerate_pixels() {
        let x = rect.x + sx;
        let y = rect.y + sy;
        if x >= width || y >= height || (x as f32) >= mask_right {
            continue;
        }
        blend_pixel(frame.get_pixel_mut(x, y), pixel, state.opacity());
    }

    if let Some(split) = split_x {
        draw_split_indicator(&mut frame, split);
    }

    Composition {
        frame,
        progress: false,
        split_x,
    }
}

/// Source-over blend of `src` onto `dst`, with `src` alpha scaled by `opacity`.
fn blend_pixel(dst: &mut Rgba<u8>, src: &Rgba<u8>, opacity: f32) {
    let alpha = opacity * (src[3] as f32 / 255.0);
    if alpha <= 0.0 {
        return;
    }
    let inv = 1.0 - alpha;
    for c in 0..3 {
        dst[c] = (src[c] as f32 * alpha + dst[c] as f32 * inv).round() as u8;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    dst[3] = ((alpha + dst_alpha * inv) * 255.0).round() as u8;
}

fn draw_split_indicator(frame: &mut RgbaImage, split_x: f32) {
    let (width, height) = frame.dimensions();
    let column = split_x.floor();

    if column >= 0.0 && (column as u32) < width {
        let column = column as u32;
        for y in 0..height {
            frame.put_pixel(column, y, SPLIT_LINE_COLOR);
        }
    }

    // Translucent disc behind the drag affordance, vertically centered
    let radius = HANDLE_DIAMETER as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let x0 = (split_x - radius).floor().max(0.0) as u32;
    let x1 = ((split_x + radius).ceil().max(0.0) as u32).min(width);
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - split_x;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                blend_pixel(frame.get_pixel_mut(x, y), &SPLIT_LINE_COLOR, HANDLE_OPACITY);
            }
        }
    }
}
