//! Screen-space geometry shared by the pointer engine and the UI host.

/// A 2-D point. Used both for normalized camera coordinates (`[0,1]`) and
/// screen pixels; the owning type says which.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Component-wise `self - other`.
    pub fn delta(&self, other: Point) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }

    /// Move `t` of the way towards `target`.
    pub fn lerp(&self, target: Point, t: f32) -> Point {
        Point {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Size of the host window in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Parse a "WxH" resolution string.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.split_once('x')?;
        let w = w.trim().parse::<f32>().ok()?;
        let h = h.trim().parse::<f32>().ok()?;
        if w > 0.0 && h > 0.0 {
            Some(Self::new(w, h))
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on all edges, matching DOM hit-testing of a bounding rect.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_rect_center_and_contains() {
        let r = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(r.center(), Point::new(100.0, 100.0));
        assert!(r.contains(Point::new(50.0, 150.0)));
        assert!(!r.contains(Point::new(151.0, 100.0)));
    }

    #[test]
    fn test_viewport_parse() {
        assert_eq!(Viewport::parse("1920x1080"), Some(Viewport::new(1920.0, 1080.0)));
        assert_eq!(Viewport::parse("0x1080"), None);
        assert_eq!(Viewport::parse("1920"), None);
        assert_eq!(Viewport::parse("axb"), None);
    }
}
