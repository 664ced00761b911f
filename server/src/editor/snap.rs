//! Snap-to-center while dragging

/// Centerline guides currently shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guides {
    /// Line at `x = width / 2`
    pub vertical: bool,
    /// Line at `y = height / 2`
    pub horizontal: bool,
}

impl Guides {
    pub fn any(&self) -> bool {
        self.vertical || self.horizontal
    }
}

/// Clamp `(x, y)` onto the canvas centerlines when within `threshold` px
pub fn snap_to_center(x: f64, y: f64, width: f64, height: f64, threshold: f64) -> (f64, f64, Guides) {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let mut guides = Guides::default();

    let x = if (x - cx).abs() <= threshold {
        guides.vertical = true;
        cx
    } else {
        x
    };
    let y = if (y - cy).abs() <= threshold {
        guides.horizontal = true;
        cy
    } else {
        y
    };

    (x, y, guides)
}
