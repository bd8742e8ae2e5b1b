use serde::{Deserialize, Serialize};

/// A position in osu! pixel space.
pub type Point = glam::Vec2;

/// The flattening algorithm a run of control points is approximated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveKind {
    Linear,        // L
    Bezier,        // B
    Catmull,       // C
    PerfectCircle, // P
}

impl CurveKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'L' => Some(CurveKind::Linear),
            'B' => Some(CurveKind::Bezier),
            'C' => Some(CurveKind::Catmull),
            'P' => Some(CurveKind::PerfectCircle),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            CurveKind::Linear => 'L',
            CurveKind::Bezier => 'B',
            CurveKind::Catmull => 'C',
            CurveKind::PerfectCircle => 'P',
        }
    }
}

/// Raw control points of a slider as authored in the beatmap.
///
/// A point that is bit-identical to its predecessor is a reset marker: it ends
/// the current run and starts the next one. Run `i` is flattened with
/// `kinds[i]`, or the last listed kind once the list runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderDefinition {
    pub kinds: Vec<CurveKind>,
    pub points: Vec<Point>,
}

impl SliderDefinition {
    pub fn new(kind: CurveKind, points: Vec<Point>) -> Self {
        Self {
            kinds: vec![kind],
            points,
        }
    }

    pub fn with_kinds(kinds: Vec<CurveKind>, points: Vec<Point>) -> Self {
        Self { kinds, points }
    }

    pub fn kind_for_run(&self, run: usize) -> CurveKind {
        self.kinds
            .get(run)
            .or_else(|| self.kinds.last())
            .copied()
            .unwrap_or(CurveKind::Bezier)
    }
}

/// Axis-aligned bounds of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Component-wise min/max over `points`; a zero box when empty.
    pub fn from_points(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let mut bounds = Self::new(*first, *first);
        for p in &points[1..] {
            bounds.include(*p);
        }
        bounds
    }

    /// Grows the box to cover `p`.
    pub fn include(&mut self, p: Point) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

pub const HIT_CIRCLE: u8 = 1;
pub const SLIDER: u8 = 1 << 1;
pub const SPINNER: u8 = 1 << 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitObject {
    pub position: Point,
    pub time: i32,
    pub object_type: u8,
    pub hit_sound: u8,
    pub end_time: Option<i32>,
    pub slider: Option<SliderData>,
}

impl HitObject {
    pub fn is_circle(&self) -> bool {
        self.object_type & HIT_CIRCLE != 0
    }

    pub fn is_slider(&self) -> bool {
        self.object_type & SLIDER != 0
    }

    pub fn is_spinner(&self) -> bool {
        self.object_type & SPINNER != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderData {
    /// Control points including the slider head.
    pub curve: SliderDefinition,
    pub repeat: u32,
    pub pixel_length: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingPoint {
    pub time: i32,
    pub beat_length: f64,
    pub meter: i32,
    pub uninherited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beatmap {
    pub hit_objects: Vec<HitObject>,
    pub timing_points: Vec<TimingPoint>,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
    pub audio_lead_in: i32,
}

impl Default for Beatmap {
    fn default() -> Self {
        Self {
            hit_objects: Vec::new(),
            timing_points: Vec::new(),
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
            audio_lead_in: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_kind_letters() {
        for kind in [
            CurveKind::Linear,
            CurveKind::Bezier,
            CurveKind::Catmull,
            CurveKind::PerfectCircle,
        ] {
            assert_eq!(CurveKind::from_char(kind.to_char()), Some(kind));
        }
        assert_eq!(CurveKind::from_char('X'), None);
    }

    #[test]
    fn later_runs_reuse_last_kind() {
        let def = SliderDefinition::with_kinds(
            vec![CurveKind::Linear, CurveKind::PerfectCircle],
            Vec::new(),
        );
        assert_eq!(def.kind_for_run(0), CurveKind::Linear);
        assert_eq!(def.kind_for_run(1), CurveKind::PerfectCircle);
        assert_eq!(def.kind_for_run(7), CurveKind::PerfectCircle);

        let bare = SliderDefinition::with_kinds(Vec::new(), Vec::new());
        assert_eq!(bare.kind_for_run(0), CurveKind::Bezier);
    }

    #[test]
    fn bounding_box_covers_negative_coordinates() {
        let bounds = BoundingBox::from_points(&[
            Point::new(-3.0, 4.0),
            Point::new(2.0, -1.0),
            Point::new(0.5, 0.5),
        ]);
        assert_eq!(bounds.min, Point::new(-3.0, -1.0));
        assert_eq!(bounds.max, Point::new(2.0, 4.0));
        assert_eq!(bounds.width(), 5.0);
        assert_eq!(bounds.height(), 5.0);
        assert!(bounds.contains(Point::ZERO));
    }

    #[test]
    fn bounding_box_of_nothing_is_zero() {
        assert_eq!(BoundingBox::from_points(&[]), BoundingBox::default());
    }
}
