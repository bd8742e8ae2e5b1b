//! Arc-length addressable polyline that a slider ball travels along.

use crate::types::{BoundingBox, Point};

/// An owned polyline with its length and bounds computed up front.
///
/// `cumulative[i]` is the distance travelled from the first point to point
/// `i`, which lets position queries binary search instead of walking the
/// polyline every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    points: Vec<Point>,
    cumulative: Vec<f32>,
    length: f32,
    bounds: BoundingBox,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Self {
        let mut path = Self::default();
        path.set_points(points);
        path
    }

    /// Takes ownership of a finished polyline and recomputes the cached
    /// length table and bounding box.
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.cumulative.clear();
        self.cumulative.reserve(self.points.len());

        let mut total = 0.0f32;
        if !self.points.is_empty() {
            self.cumulative.push(0.0);
        }
        for w in self.points.windows(2) {
            let distance = w[0].distance(w[1]);
            debug_assert!(distance >= 0.0, "invalid polyline segment {w:?}");
            total += distance;
            self.cumulative.push(total);
        }

        self.length = total;
        self.bounds = BoundingBox::from_points(&self.points);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    pub fn position_at_progress(&self, progress: f32) -> Point {
        self.position_at_length(self.length * progress)
    }

    /// Point reached after travelling `length` along the path, clamped to the
    /// first and last point. An empty path answers [`Point::ZERO`].
    pub fn position_at_length(&self, length: f32) -> Point {
        let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) else {
            return Point::ZERO;
        };

        if length.is_nan() || length <= 0.0 {
            return first;
        }
        if length >= self.length {
            return last;
        }

        // First point whose cumulative distance reaches `length`. Never 0
        // since cumulative[0] == 0 < length, never past the end since
        // length < self.length.
        let end = self.cumulative.partition_point(|&c| c < length);
        let start = end - 1;

        let segment = self.points[start].distance(self.points[end]);
        let blend = ((length - self.cumulative[start]) / segment).min(1.0);
        self.points[start].lerp(self.points[end], blend)
    }

    /// Ball position for a slider with `spans` repeats at overall `progress`.
    ///
    /// Even spans run head to tail, odd spans tail to head.
    pub fn position_at_span_progress(&self, progress: f32, spans: u32) -> Point {
        let spans = spans.max(1);
        let scaled = progress.clamp(0.0, 1.0) * spans as f32;
        let span = (scaled.floor() as u32).min(spans - 1);

        let mut span_progress = scaled - span as f32;
        if span % 2 == 1 {
            span_progress = 1.0 - span_progress;
        }

        self.position_at_progress(span_progress)
    }

    /// Cuts or extends the path so its length matches the slider's declared
    /// pixel length. A shorter path is extended along its last non-degenerate
    /// segment; non-positive or non-finite lengths leave it unchanged.
    pub fn fit_to_length(&mut self, expected: f32) {
        if !(expected.is_finite() && expected > 0.0) || self.points.len() < 2 {
            return;
        }

        if expected < self.length {
            let end = self.position_at_length(expected);
            let cut = self.cumulative.partition_point(|&c| c < expected);
            self.points.truncate(cut);
            self.points.push(end);
        } else if expected > self.length {
            let direction = self
                .points
                .windows(2)
                .rev()
                .map(|w| w[1] - w[0])
                .find(|d| *d != Point::ZERO);

            let Some(direction) = direction else {
                log::warn!("cannot extend a path with no direction to {expected}px");
                return;
            };

            let last = self.points[self.points.len() - 1];
            self.points
                .push(last + direction.normalize() * (expected - self.length));
        } else {
            return;
        }

        self.recalculate();
    }
}

impl From<Vec<Point>> for Path {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}
