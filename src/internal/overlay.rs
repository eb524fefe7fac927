use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::internal::models::Bitmap;
use crate::internal::resolver::ResolveError;

/// Opacity applied when entering [`OverlayMode::Layered`].
pub const LAYERED_DEFAULT_OPACITY: f32 = 0.5;
/// Opacity applied when entering [`OverlayMode::Compare`].
pub const COMPARE_OPACITY: f32 = 1.0;

/// How the reference image is presented. Declaration order is the picker order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize,
)]
pub enum OverlayMode {
    #[default]
    Hidden,
    Layered,
    Compare,
}

impl OverlayMode {
    pub fn next(self) -> Self {
        let all: Vec<Self> = Self::iter().collect();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(self) -> Self {
        let all: Vec<Self> = Self::iter().collect();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }

    /// Glyph shown in the picker segment.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Hidden => "◌",
            Self::Layered => "◫",
            Self::Compare => "◧",
        }
    }
}

/// Everything the renderer needs besides the live frame.
///
/// Created when the overlay is attached and dropped when it is detached.
#[derive(Debug, Clone)]
pub struct OverlayState {
    pub(crate) mode: OverlayMode,
    pub(crate) opacity: f32,
    pub(crate) split_position: f32,
    pub(crate) drag_offset: f32,
    resolved_image: Option<Bitmap>,
    resolution_error: Option<ResolveError>,
}

impl OverlayState {
    /// New state in `initial_mode`, with that mode's entry values applied.
    pub fn new(initial_mode: OverlayMode) -> Self {
        let mut state = Self {
            mode: OverlayMode::Hidden,
            opacity: LAYERED_DEFAULT_OPACITY,
            split_position: 0.0,
            drag_offset: 0.0,
            resolved_image: None,
            resolution_error: None,
        };
        state.set_mode(initial_mode);
        state
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn split_position(&self) -> f32 {
        self.split_position
    }

    pub fn drag_offset(&self) -> f32 {
        self.drag_offset
    }

    pub fn resolved_image(&self) -> Option<&Bitmap> {
        self.resolved_image.as_ref()
    }

    pub fn resolution_error(&self) -> Option<&ResolveError> {
        self.resolution_error.as_ref()
    }

    /// True until the resolution task has reported either outcome.
    pub fn is_pending(&self) -> bool {
        self.resolved_image.is_none() && self.resolution_error.is_none()
    }

    /// Switch modes. Re-selecting the current mode is not a transition.
    ///
    /// Returns whether a transition happened.
    pub fn set_mode(&mut self, mode: OverlayMode) -> bool {
        if mode == self.mode {
            return false;
        }
        tracing::debug!(from = %self.mode, to = %mode, "Overlay mode transition");
        // An uncommitted drag does not survive leaving compare mode
        self.drag_offset = 0.0;
        self.mode = mode;

        match mode {
            OverlayMode::Hidden => {}
            OverlayMode::Layered => {
                self.opacity = LAYERED_DEFAULT_OPACITY;
            }
            OverlayMode::Compare => {
                self.opacity = COMPARE_OPACITY;
                self.split_position = 0.0;
            }
        }
        true
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = match opacity.is_nan() {
            true => self.opacity,
            false => opacity.clamp(0.0, 1.0),
        };
    }

    /// Record the resolution outcome. Only the first outcome per mount is kept.
    ///
    /// Returns whether the outcome was applied.
    pub fn apply_resolution(&mut self, outcome: Result<Bitmap, ResolveError>) -> bool {
        if !self.is_pending() {
            tracing::warn!("Ignoring duplicate resolution outcome");
            return false;
        }
        match outcome {
            Ok(bitmap) => self.resolved_image = Some(bitmap),
            Err(e) => self.resolution_error = Some(e),
        }
        true
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new(OverlayMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::sync::Arc;

    #[test]
    fn test_mode_cycle_wraps() {
        assert_eq!(OverlayMode::Hidden.next(), OverlayMode::Layered);
        assert_eq!(OverlayMode::Layered.next(), OverlayMode::Compare);
        assert_eq!(OverlayMode::Compare.next(), OverlayMode::Hidden);
        assert_eq!(OverlayMode::Hidden.prev(), OverlayMode::Compare);
    }

    #[test]
    fn test_hidden_to_layered_resets_opacity() {
        let mut state = OverlayState::new(OverlayMode::Hidden);
        state.set_opacity(0.9);
        assert!(state.set_mode(OverlayMode::Layered));
        assert_eq!(state.opacity(), 0.5);
    }

    #[test]
    fn test_enter_compare_resets_split() {
        let mut state = OverlayState::new(OverlayMode::Layered);
        state.set_opacity(0.2);
        state.split_position = 37.0;
        state.drag_offset = -4.0;

        state.set_mode(OverlayMode::Compare);
        assert_eq!(state.opacity(), 1.0);
        assert_eq!(state.split_position(), 0.0);
        assert_eq!(state.drag_offset(), 0.0);
    }

    #[test]
    fn test_leaving_compare_clears_drag_offset() {
        let mut state = OverlayState::new(OverlayMode::Compare);
        state.drag_changed(12.0);

        state.set_mode(OverlayMode::Hidden);
        assert_eq!(state.drag_offset(), 0.0);
        assert_eq!(state.split_offset(), 0.0);
    }

    #[test]
    fn test_enter_hidden_keeps_values() {
        let mut state = OverlayState::new(OverlayMode::Layered);
        state.set_opacity(0.3);
        state.set_mode(OverlayMode::Hidden);
        assert_eq!(state.mode(), OverlayMode::Hidden);
        assert_eq!(state.opacity(), 0.3);
    }

    #[test]
    fn test_reselecting_mode_is_not_a_transition() {
        let mut state = OverlayState::new(OverlayMode::Layered);
        state.set_opacity(0.8);
        assert!(!state.set_mode(OverlayMode::Layered));
        assert_eq!(state.opacity(), 0.8);
    }

    #[test]
    fn test_initial_compare_applies_entry_values() {
        let state = OverlayState::new(OverlayMode::Compare);
        assert_eq!(state.mode(), OverlayMode::Compare);
        assert_eq!(state.opacity(), 1.0);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut state = OverlayState::new(OverlayMode::Layered);
        state.set_opacity(1.7);
        assert_eq!(state.opacity(), 1.0);
        state.set_opacity(-0.2);
        assert_eq!(state.opacity(), 0.0);
        state.set_opacity(f32::NAN);
        assert_eq!(state.opacity(), 0.0);
    }

    #[test]
    fn test_resolution_is_write_once() {
        let mut state = OverlayState::default();
        assert!(state.is_pending());

        let first = Arc::new(RgbaImage::new(2, 2));
        assert!(state.apply_resolution(Ok(first)));
        assert!(!state.apply_resolution(Ok(Arc::new(RgbaImage::new(5, 5)))));
        assert!(!state.apply_resolution(Err(ResolveError::Transport("late".into()))));

        assert_eq!(state.resolved_image().unwrap().dimensions(), (2, 2));
        assert!(state.resolution_error().is_none());
    }

    #[test]
    fn test_failed_resolution_leaves_image_empty() {
        let mut state = OverlayState::default();
        state.apply_resolution(Err(ResolveError::MalformedReference("x".into())));
        assert!(!state.is_pending());
        assert!(state.resolved_image().is_none());
        assert!(matches!(
            state.resolution_error(),
            Some(ResolveError::MalformedReference(_))
        ));
    }
}
