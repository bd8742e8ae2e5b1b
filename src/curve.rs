//! Flattening of slider control points into polylines.
//!
//! Every function here is pure: it reads a run of control points and returns
//! (or fills) a polyline that approximates the curve they describe.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::types::{BoundingBox, CurveKind, Point};

pub const BEZIER_TOLERANCE: f32 = 0.25;
pub const CIRCULAR_ARC_TOLERANCE: f32 = 0.1;
pub const PRECISION_EPSILON: f32 = 1e-6;
/// Samples per Catmull-Rom segment.
pub const CATMULL_DETAIL: usize = 50;
pub const LAGRANGE_STEPS: usize = 51;

fn almost_equals(a: f32, b: f32) -> bool {
    (a - b).abs() < PRECISION_EPSILON
}

fn definitely_bigger(a: f64, b: f64) -> bool {
    a - b > PRECISION_EPSILON as f64
}

/// Circle through three control points, as used by perfect-circle sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArcProperties {
    pub theta_start: f64,
    /// Unsigned angle swept from start to end.
    pub theta_range: f64,
    /// `1.0` for counter-clockwise (increasing angle), `-1.0` otherwise.
    pub direction: f64,
    pub radius: f32,
    pub centre: Point,
}

impl CircularArcProperties {
    pub fn theta_end(&self) -> f64 {
        self.theta_start + self.theta_range * self.direction
    }

    fn point_at_angle(&self, theta: f64) -> Point {
        self.centre + Point::new(theta.cos() as f32, theta.sin() as f32) * self.radius
    }
}

/// Flattens `points` with the algorithm `kind` names.
///
/// A perfect-circle run that does not have exactly three points is
/// approximated as a Bézier curve instead.
pub fn approximate(kind: CurveKind, points: &[Point]) -> Vec<Point> {
    match kind {
        CurveKind::Linear => approximate_linear(points),
        CurveKind::Bezier => approximate_bezier(points),
        CurveKind::Catmull => approximate_catmull(points, CATMULL_DETAIL),
        CurveKind::PerfectCircle if points.len() == 3 => approximate_circular_arc(points),
        CurveKind::PerfectCircle => {
            log::trace!(
                "perfect circle run with {} points, approximating as bezier",
                points.len()
            );
            approximate_bezier(points)
        }
    }
}

pub fn approximate_linear(points: &[Point]) -> Vec<Point> {
    points.to_vec()
}

pub fn approximate_bezier(points: &[Point]) -> Vec<Point> {
    approximate_bspline(points, 0)
}

/// Buffers reused across the subdivision steps of one flattening call.
#[derive(Default)]
struct SubdivisionScratch {
    midpoints: Vec<Point>,
    left: Vec<Point>,
    right: Vec<Point>,
}

/// Flattens a B-spline of the given `degree` through `points`.
///
/// A degree of `0` (or one not below the point count minus one) treats the
/// whole run as a single Bézier curve. Otherwise the spline is cut into Bézier
/// segments of that degree by knot insertion before flattening.
pub fn approximate_bspline(points: &[Point], degree: usize) -> Vec<Point> {
    let mut output = Vec::new();
    let Some(&last) = points.last() else {
        return output;
    };

    let n = points.len() - 1;
    let mut to_flatten: Vec<Vec<Point>> = Vec::new();

    if degree > 0 && degree < n {
        let p = degree;
        let mut spline = points.to_vec();

        // Boehm's knot insertion, one Bézier segment per iteration.
        for i in 0..n - p {
            let mut segment = vec![Point::ZERO; p + 1];
            segment[0] = spline[i];

            for j in 0..p - 1 {
                segment[j + 1] = spline[i + 1];

                for k in 1..p - j {
                    let l = k.min(n - p - i) as f32;
                    spline[i + k] = (l * spline[i + k] + spline[i + k + 1]) / (l + 1.0);
                }
            }

            segment[p] = spline[i + 1];
            to_flatten.push(segment);
        }

        to_flatten.push(spline[n - p..].to_vec());
        // Work stack pops from the back; leftmost segment must come out first.
        to_flatten.reverse();
    } else {
        to_flatten.push(points.to_vec());
    }

    let mut scratch = SubdivisionScratch::default();

    while let Some(parent) = to_flatten.pop() {
        if is_bezier_flat_enough(&parent) {
            bezier_approximate(&parent, &mut output, &mut scratch);
            continue;
        }

        let mut left = vec![Point::ZERO; parent.len()];
        let mut right = vec![Point::ZERO; parent.len()];
        bezier_subdivide(&parent, &mut left, &mut right, &mut scratch.midpoints);

        to_flatten.push(right);
        to_flatten.push(left);
    }

    output.push(last);
    output
}

fn is_bezier_flat_enough(control_points: &[Point]) -> bool {
    const TOLERANCE_SQUARED: f32 = BEZIER_TOLERANCE * BEZIER_TOLERANCE * 4.0;

    // Written as "no window exceeds" so NaN input counts as flat and terminates.
    !control_points.windows(3).any(|w| {
        let second_derivative = w[0] - 2.0 * w[1] + w[2];
        second_derivative.length_squared() > TOLERANCE_SQUARED
    })
}

/// De Casteljau split at `t = 0.5`.
fn bezier_subdivide(
    control_points: &[Point],
    left: &mut [Point],
    right: &mut [Point],
    midpoints: &mut Vec<Point>,
) {
    let count = control_points.len();
    midpoints.clear();
    midpoints.extend_from_slice(control_points);

    for i in 0..count {
        left[i] = midpoints[0];
        right[count - i - 1] = midpoints[count - i - 1];

        for j in 0..count - i - 1 {
            midpoints[j] = (midpoints[j] + midpoints[j + 1]) * 0.5;
        }
    }
}

/// Emits a flat-enough segment: its start point followed by the smoothed
/// interior of one further subdivision. The end point is left to the next
/// segment (or the caller).
fn bezier_approximate(
    control_points: &[Point],
    output: &mut Vec<Point>,
    scratch: &mut SubdivisionScratch,
) {
    let count = control_points.len();
    scratch.left.resize(count, Point::ZERO);
    scratch.right.resize(count, Point::ZERO);
    bezier_subdivide(
        control_points,
        &mut scratch.left,
        &mut scratch.right,
        &mut scratch.midpoints,
    );

    // left[..count] followed by right[1..], shared midpoint counted once.
    let merged = |index: usize| {
        if index < count {
            scratch.left[index]
        } else {
            scratch.right[index - count + 1]
        }
    };

    output.push(control_points[0]);

    for i in 1..count - 1 {
        let index = 2 * i;
        output.push(0.25 * (merged(index - 1) + 2.0 * merged(index) + merged(index + 1)));
    }
}

fn catmull_find_point(v1: Point, v2: Point, v3: Point, v4: Point, t: f32) -> Point {
    let t2 = t * t;
    let t3 = t * t2;

    0.5 * (2.0 * v2
        + (-v1 + v3) * t
        + (2.0 * v1 - 5.0 * v2 + 4.0 * v3 - v4) * t2
        + (-v1 + 3.0 * v2 - 3.0 * v3 + v4) * t3)
}

pub fn approximate_catmull(points: &[Point], detail: usize) -> Vec<Point> {
    let mut output = Vec::new();
    approximate_catmull_into(points, detail, &mut output);
    output
}

/// Catmull-Rom sampling into a caller-owned buffer, which is cleared first.
///
/// Each of the `detail` steps of a segment emits both its start and its end,
/// so consecutive steps share a duplicated point. Consumers rely on this
/// density, keep it.
pub fn approximate_catmull_into(points: &[Point], detail: usize, output: &mut Vec<Point>) {
    output.clear();
    if points.len() < 2 || detail == 0 {
        return;
    }

    output.reserve((points.len() - 1) * detail * 2);

    for i in 0..points.len() - 1 {
        let v1 = if i > 0 { points[i - 1] } else { points[i] };
        let v2 = points[i];
        let v3 = points[i + 1];
        let v4 = if i + 2 < points.len() {
            points[i + 2]
        } else {
            v3 + v3 - v2
        };

        for c in 0..detail {
            let t1 = c as f32 / detail as f32;
            let t2 = (c + 1) as f32 / detail as f32;
            output.push(catmull_find_point(v1, v2, v3, v4, t1));
            output.push(catmull_find_point(v1, v2, v3, v4, t2));
        }
    }
}

/// Circumcircle of exactly three points, `None` when they are collinear.
pub fn circular_arc_properties(points: &[Point]) -> Option<CircularArcProperties> {
    let &[a, b, c] = points else {
        return None;
    };

    let determinant = (b.y - a.y) * (c.x - a.x) - (b.x - a.x) * (c.y - a.y);
    if almost_equals(determinant, 0.0) {
        return None;
    }

    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let a_sq = a.length_squared();
    let b_sq = b.length_squared();
    let c_sq = c.length_squared();

    let centre = Point::new(
        a_sq * (b.y - c.y) + b_sq * (c.y - a.y) + c_sq * (a.y - b.y),
        a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x),
    ) / d;

    let da = a - centre;
    let dc = c - centre;
    let radius = da.length();

    let theta_start = (da.y as f64).atan2(da.x as f64);
    let mut theta_end = (dc.y as f64).atan2(dc.x as f64);
    while theta_end < theta_start {
        theta_end += TAU;
    }

    let mut direction = 1.0;
    let mut theta_range = theta_end - theta_start;

    // Which side of chord AC the middle point lies on decides the winding.
    let ortho_ac = Point::new(c.y - a.y, a.x - c.x);
    if ortho_ac.dot(b - a) < 0.0 {
        direction = -1.0;
        theta_range = TAU - theta_range;
    }

    Some(CircularArcProperties {
        theta_start,
        theta_range,
        direction,
        radius,
        centre,
    })
}

/// Samples the arc through three points, or falls back to a Bézier
/// approximation when no circle passes through them.
pub fn approximate_circular_arc(points: &[Point]) -> Vec<Point> {
    let Some(props) = circular_arc_properties(points) else {
        log::trace!("degenerate circular arc, approximating as bezier");
        return approximate_bezier(points);
    };

    let amount_points = if 2.0 * props.radius <= CIRCULAR_ARC_TOLERANCE {
        2
    } else {
        let max_step = 2.0 * (1.0 - (CIRCULAR_ARC_TOLERANCE / props.radius) as f64).acos();
        ((props.theta_range / max_step).ceil() as usize).max(2)
    };

    (0..amount_points)
        .map(|i| {
            let fract = i as f64 / (amount_points - 1) as f64;
            props.point_at_angle(props.theta_start + props.direction * fract * props.theta_range)
        })
        .collect()
}

/// Tight bounds of the arc through three points, including the extreme
/// points where it crosses an axis. `None` when the points are collinear.
pub fn circular_arc_bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let props = circular_arc_properties(points)?;

    let mut bounds = BoundingBox::from_points(&[points[0], points[2]]);

    let step = FRAC_PI_2 * props.direction;
    let quotient = props.theta_start / FRAC_PI_2;
    let closest_right_angle = FRAC_PI_2
        * if props.direction > 0.0 {
            quotient.ceil()
        } else {
            quotient.floor()
        };

    for i in 0..4 {
        let angle = closest_right_angle + step * i as f64;
        if definitely_bigger((angle - props.theta_end()) * props.direction, 0.0) {
            break;
        }
        bounds.include(props.point_at_angle(angle));
    }

    Some(bounds)
}

fn barycentric_weights(points: &[Point]) -> Vec<f64> {
    points
        .iter()
        .enumerate()
        .map(|(i, pi)| {
            let product = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(1.0f64, |acc, (_, pj)| acc * (pi.x - pj.x) as f64);
            1.0 / product
        })
        .collect()
}

fn barycentric_lagrange(points: &[Point], weights: &[f64], time: f64) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (p, w) in points.iter().zip(weights) {
        if almost_equals(time as f32, p.x) {
            return p.y as f64;
        }

        let li = w / (time - p.x as f64);
        numerator += li * p.y as f64;
        denominator += li;
    }

    numerator / denominator
}

/// Interpolating polynomial through `points`, sampled across their x-range.
///
/// Two points sharing an x-coordinate make the fit singular; such input is not
/// supported and yields non-finite samples.
pub fn approximate_lagrange_polynomial(points: &[Point]) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let weights = barycentric_weights(points);
    let (min_x, max_x) = points
        .iter()
        .fold((first.x, first.x), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
    let dx = max_x - min_x;

    (0..LAGRANGE_STEPS)
        .map(|i| {
            let x = min_x + dx / (LAGRANGE_STEPS - 1) as f32 * i as f32;
            let y = barycentric_lagrange(points, &weights, x as f64) as f32;
            Point::new(x, y)
        })
        .collect()
}
