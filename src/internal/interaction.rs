//! Split-slider drag handling for compare mode.

use crate::internal::overlay::{OverlayMode, OverlayState};

impl OverlayState {
    /// Offset of the split line from the container center, including any drag in progress.
    pub fn split_offset(&self) -> f32 {
        self.split_position + self.drag_offset
    }

    /// Horizontal position of the split line inside a container `container_width` wide.
    pub fn split_x(&self, container_width: f32) -> f32 {
        container_width / 2.0 + self.split_offset()
    }

    /// Pointer moved; `delta` is measured from where the gesture started.
    ///
    /// Ignored outside compare mode. Returns whether the state changed.
    pub fn drag_changed(&mut self, delta: f32) -> bool {
        if self.mode != OverlayMode::Compare || !delta.is_finite() {
            return false;
        }
        self.drag_offset = delta;
        true
    }

    /// Pointer released; commits `delta` into the split position.
    pub fn drag_ended(&mut self, delta: f32) -> bool {
        if self.mode != OverlayMode::Compare || !delta.is_finite() {
            return false;
        }
        self.split_position += delta;
        self.drag_offset = 0.0;
        true
    }

    /// A complete gesture of `step`, as used by keyboard nudges.
    pub fn nudge_split(&mut self, step: f32) -> bool {
        self.drag_changed(step) && self.drag_ended(step)
    }
}

/// Pointer gesture on the split handle, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragGesture {
    start_x: Option<f32>,
}

impl DragGesture {
    /// Start a gesture if `pointer_x` lands within `tolerance` of `split_x`.
    pub fn begin(&mut self, pointer_x: f32, split_x: f32, tolerance: f32) -> bool {
        match (pointer_x - split_x).abs() <= tolerance {
            true => {
                self.start_x = Some(pointer_x);
                true
            }
            false => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.start_x.is_some()
    }

    /// Delta from the gesture start, or `None` when no gesture is active.
    pub fn delta(&self, pointer_x: f32) -> Option<f32> {
        self.start_x.map(|start| pointer_x - start)
    }

    /// Finish the gesture and return its final delta.
    pub fn end(&mut self, pointer_x: f32) -> Option<f32> {
        let delta = self.delta(pointer_x);
        self.start_x = None;
        delta
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_does_not_jump() {
        let mut state = OverlayState::new(OverlayMode::Compare);
        state.drag_ended(15.0);

        state.drag_changed(20.0);
        let before = state.split_x(400.0);
        state.drag_ended(20.0);
        let after = state.split_x(400.0);

        assert_eq!(before, 235.0);
        assert_eq!(before, after);
        assert_eq!(state.drag_offset(), 0.0);
    }

    #[test]
    fn test_drag_changed_is_idempotent() {
        let mut state = OverlayState::new(OverlayMode::Compare);
        for _ in 0..3 {
            state.drag_changed(-12.0);
        }
        assert_eq!(state.split_position(), 0.0);
        assert_eq!(state.drag_offset(), -12.0);
    }

    #[test]
    fn test_drag_ignored_outside_compare() {
        let mut state = OverlayState::new(OverlayMode::Layered);
        assert!(!state.drag_changed(10.0));
        assert!(!state.drag_ended(10.0));
        assert_eq!(state.split_offset(), 0.0);
    }

    #[test]
    fn test_nudge_commits() {
        let mut state = OverlayState::new(OverlayMode::Compare);
        assert!(state.nudge_split(-8.0));
        assert!(state.nudge_split(-8.0));
        assert_eq!(state.split_position(), -16.0);
        assert_eq!(state.drag_offset(), 0.0);
    }

    #[test]
    fn test_gesture_requires_handle_hit() {
        let mut gesture = DragGesture::default();
        assert!(!gesture.begin(10.0, 200.0, 4.0));
        assert!(!gesture.is_active());
        assert_eq!(gesture.delta(50.0), None);

        assert!(gesture.begin(202.0, 200.0, 4.0));
        assert_eq!(gesture.delta(232.0), Some(30.0));
        assert_eq!(gesture.end(240.0), Some(38.0));
        assert!(!gesture.is_active());
    }
}
