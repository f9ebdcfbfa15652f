use notchpad_ipc::RectInfo;

/// A position in global display space. Origin is the top-left corner of the
/// primary display and y grows downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Grows both dimensions by `margin`. Negative margins shrink, never below zero.
    pub fn inflated(self, margin: f64) -> Self {
        Self {
            width: (self.width + margin).max(0.0),
            height: (self.height + margin).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Places `size` horizontally centered on `mid_x` with its top edge at `top`.
    pub fn centered_at_top(mid_x: f64, top: f64, size: Size) -> Self {
        Self::new(mid_x - size.width / 2.0, top, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// Moves every edge outwards by `by`; negative values move them inwards.
    /// A rect shrunk past zero collapses onto its center.
    pub fn expanded(&self, by: f64) -> Self {
        let width = (self.width + 2.0 * by).max(0.0);
        let height = (self.height + 2.0 * by).max(0.0);
        Self::new(
            self.mid_x() - width / 2.0,
            self.mid_y() - height / 2.0,
            width,
            height,
        )
    }
}

impl From<Rect> for RectInfo {
    fn from(rect: Rect) -> Self {
        RectInfo {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}
