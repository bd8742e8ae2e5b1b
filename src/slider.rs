//! Turns a slider's raw control points into one continuous polyline.

use crate::curve::{
    approximate_bezier, approximate_catmull_into, approximate_circular_arc, CATMULL_DETAIL,
};
use crate::types::{CurveKind, Point, SliderDefinition};

/// A point bit-identical to its predecessor marks the start of a new run.
fn is_reset_marker(previous: Point, point: Point) -> bool {
    previous.x.to_bits() == point.x.to_bits() && previous.y.to_bits() == point.y.to_bits()
}

/// Builds slider polylines, keeping its run and Catmull buffers between
/// builds so repeated use does not reallocate them.
#[derive(Debug, Default)]
pub struct SliderPathBuilder {
    run: Vec<Point>,
    scratch: Vec<Point>,
}

impl SliderPathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, definition: &SliderDefinition) -> Vec<Point> {
        let mut output = Vec::with_capacity(64);
        self.build_into(definition, &mut output);
        output
    }

    /// Flattens `definition` into `output`, replacing its contents.
    pub fn build_into(&mut self, definition: &SliderDefinition, output: &mut Vec<Point>) {
        output.clear();
        self.run.clear();

        let points = &definition.points;
        let mut run_index = 0;

        for (i, &now) in points.iter().enumerate() {
            self.run.push(now);

            // Past the end the lookahead sees the last point again, which
            // compiles the final run.
            let next = points[(i + 1).min(points.len() - 1)];
            if is_reset_marker(now, next) {
                self.compile_run(definition.kind_for_run(run_index), output);
                run_index += 1;
            }
        }

        log::debug!(
            "built slider path: {} control points, {} runs, {} polyline points",
            points.len(),
            run_index,
            output.len()
        );
    }

    fn compile_run(&mut self, kind: CurveKind, output: &mut Vec<Point>) {
        match self.run.len() {
            0 => {}
            1 => {
                if output.is_empty() {
                    output.push(self.run[0]);
                }
            }
            // Two points never curve, whatever the declared kind.
            2 => append_run(output, &self.run),
            len => match kind {
                CurveKind::Linear => append_run(output, &self.run),
                CurveKind::Catmull => {
                    approximate_catmull_into(&self.run, CATMULL_DETAIL, &mut self.scratch);
                    append_run(output, &self.scratch);
                }
                CurveKind::Bezier => append_run(output, &approximate_bezier(&self.run)),
                CurveKind::PerfectCircle if len == 3 => {
                    append_run(output, &approximate_circular_arc(&self.run))
                }
                CurveKind::PerfectCircle => {
                    log::trace!("perfect circle run of {len} points, approximating as bezier");
                    append_run(output, &approximate_bezier(&self.run));
                }
            },
        }

        log::trace!(
            "compiled {:?} run of {} points, polyline now {} points",
            kind,
            self.run.len(),
            output.len()
        );
        self.run.clear();
    }
}

/// Appends a compiled run, dropping its first point when the polyline already
/// ends there so shared boundary points appear once.
fn append_run(output: &mut Vec<Point>, curve: &[Point]) {
    let skip = match (output.last(), curve.first()) {
        (Some(last), Some(first)) => usize::from(last == first),
        _ => 0,
    };
    output.extend_from_slice(&curve[skip..]);
}

/// Flattens a slider definition with a one-off builder.
pub fn build_polyline(definition: &SliderDefinition) -> Vec<Point> {
    SliderPathBuilder::new().build(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{approximate_bezier, approximate_catmull, approximate_circular_arc};

    fn pts(coords: &[(f32, f32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn polyline_length(points: &[Point]) -> f32 {
        points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    #[test]
    fn empty_definition_gives_empty_polyline() {
        let definition = SliderDefinition::new(CurveKind::Bezier, Vec::new());
        assert!(build_polyline(&definition).is_empty());
    }

    #[test]
    fn single_point_definition() {
        let definition = SliderDefinition::new(CurveKind::Catmull, pts(&[(3.0, 4.0)]));
        assert_eq!(build_polyline(&definition), pts(&[(3.0, 4.0)]));
    }

    #[test]
    fn shared_boundary_point_appears_once() {
        let definition = SliderDefinition::with_kinds(
            vec![CurveKind::Linear, CurveKind::Linear],
            pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 0.0), (5.0, 5.0)]),
        );
        let polyline = build_polyline(&definition);

        assert_eq!(polyline, pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]));
        assert_eq!(polyline_length(&polyline), 10.0);
    }

    #[test]
    fn two_point_run_is_straight_for_any_kind() {
        for kind in [CurveKind::Bezier, CurveKind::Catmull, CurveKind::PerfectCircle] {
            let definition = SliderDefinition::new(kind, pts(&[(0.0, 0.0), (100.0, 0.0)]));
            assert_eq!(
                build_polyline(&definition),
                pts(&[(0.0, 0.0), (100.0, 0.0)])
            );
        }
    }

    #[test]
    fn runs_dispatch_on_their_own_kind() {
        let arc = pts(&[(0.0, 0.0), (50.0, 50.0), (100.0, 0.0)]);
        let tail = pts(&[(100.0, 0.0), (150.0, -80.0), (200.0, 0.0)]);

        let mut points = arc.clone();
        points.extend_from_slice(&tail);
        let definition = SliderDefinition::with_kinds(
            vec![CurveKind::PerfectCircle, CurveKind::Bezier],
            points,
        );
        let polyline = build_polyline(&definition);

        let mut expected = approximate_circular_arc(&arc);
        let bezier = approximate_bezier(&tail);
        if expected.last() == bezier.first() {
            expected.extend_from_slice(&bezier[1..]);
        } else {
            expected.extend_from_slice(&bezier);
        }
        assert_eq!(polyline, expected);
    }

    #[test]
    fn perfect_circle_with_four_points_uses_bezier() {
        let points = pts(&[(0.0, 0.0), (30.0, 60.0), (90.0, 60.0), (120.0, 0.0)]);
        let definition = SliderDefinition::new(CurveKind::PerfectCircle, points.clone());
        assert_eq!(build_polyline(&definition), approximate_bezier(&points));
    }

    #[test]
    fn catmull_run_keeps_pair_density() {
        let points = pts(&[(0.0, 0.0), (40.0, 40.0), (80.0, 0.0)]);
        let definition = SliderDefinition::new(CurveKind::Catmull, points.clone());
        assert_eq!(
            build_polyline(&definition),
            approximate_catmull(&points, CATMULL_DETAIL)
        );
    }

    #[test]
    fn trailing_reset_marker_adds_nothing() {
        let definition = SliderDefinition::new(
            CurveKind::Linear,
            pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0), (20.0, 5.0)]),
        );
        assert_eq!(
            build_polyline(&definition),
            pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0)])
        );
    }

    #[test]
    fn builder_reuse_gives_identical_output() {
        let first = SliderDefinition::new(
            CurveKind::Bezier,
            pts(&[(0.0, 0.0), (60.0, 120.0), (140.0, 0.0)]),
        );
        let second = SliderDefinition::new(
            CurveKind::Catmull,
            pts(&[(0.0, 0.0), (20.0, 20.0), (40.0, 0.0), (60.0, 20.0)]),
        );

        let mut builder = SliderPathBuilder::new();
        let mut output = Vec::new();
        builder.build_into(&first, &mut output);
        builder.build_into(&second, &mut output);

        assert_eq!(output, build_polyline(&second));
    }
}
