use serde::{Deserialize, Serialize};

/// Size of a screen area in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    /// Creates a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Half of the width.
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Half of the height.
    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Returns true if the area is empty or its size is not a finite number.
    pub fn is_zero(&self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }
}
