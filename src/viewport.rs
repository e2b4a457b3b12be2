//! Display scale
//!
//! The play field has a fixed size in physics units; resizing only changes
//! how large it is drawn.

use crate::consts::{BASE_HEIGHT, BASE_WIDTH};

/// Scale that fits the base layout into a `width` x `height` viewport,
/// never enlarging past 1.0
pub fn display_scale(width: f32, height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 1.0;
    }
    (width / BASE_WIDTH).min(height / BASE_HEIGHT).min(1.0)
}

/// CSS transform applied to the game container
pub fn css_transform(scale: f32) -> String {
    format!("scale({scale:.4})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_viewport_caps_at_one() {
        assert_eq!(display_scale(1920.0, 1600.0), 1.0);
    }

    #[test]
    fn test_limited_by_smaller_axis() {
        assert_eq!(display_scale(408.0, 1296.0), 0.5);
        assert_eq!(display_scale(816.0, 648.0), 0.5);
    }

    #[test]
    fn test_degenerate_viewport() {
        assert_eq!(display_scale(0.0, 900.0), 1.0);
    }

    #[test]
    fn test_css_transform() {
        assert_eq!(css_transform(0.5), "scale(0.5000)");
    }
}
