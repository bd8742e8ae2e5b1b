use numpy::{PyArray1, PyArray2};
use pyo3::prelude::*;

use crate::beatmap;
use crate::curve;
use crate::slider::{build_polyline, SliderPathBuilder};
use crate::types::{CurveKind, Point, SliderDefinition};

fn curve_kind(kind: char) -> PyResult<CurveKind> {
    CurveKind::from_char(kind).ok_or_else(|| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Unknown curve type: {}", kind))
    })
}

fn to_points(points: Vec<(f32, f32)>) -> Vec<Point> {
    points.into_iter().map(|(x, y)| Point::new(x, y)).collect()
}

/// Polyline as an `N x 2` float32 array.
fn to_numpy(py: Python<'_>, points: &[Point]) -> PyResult<Py<PyArray2<f32>>> {
    let flat: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let array = PyArray1::from_vec(py, flat).reshape([points.len(), 2])?;
    Ok(array.to_owned())
}

/// Flatten one run of control points with the given curve type letter
#[pyfunction]
fn approximate_curve(kind: char, points: Vec<(f32, f32)>) -> PyResult<Vec<(f32, f32)>> {
    let kind = curve_kind(kind)?;
    let output = curve::approximate(kind, &to_points(points));
    Ok(output.into_iter().map(|p| (p.x, p.y)).collect())
}

/// Build the full slider polyline, repeated points splitting sub-paths
#[pyfunction]
fn build_slider_path(
    py: Python<'_>,
    kind: char,
    points: Vec<(f32, f32)>,
) -> PyResult<Py<PyArray2<f32>>> {
    let definition = SliderDefinition::new(curve_kind(kind)?, to_points(points));
    to_numpy(py, &build_polyline(&definition))
}

/// Polylines of every slider in a beatmap, fitted to their pixel length
#[pyfunction]
fn slider_paths_fast(py: Python<'_>, file_path: String) -> PyResult<Vec<Py<PyArray2<f32>>>> {
    let beatmap = beatmap::parse_beatmap(&file_path)?;
    let mut builder = SliderPathBuilder::new();

    beatmap
        .hit_objects
        .iter()
        .filter_map(|obj| obj.slider.as_ref())
        .map(|slider| {
            let mut path = crate::path::Path::new(builder.build(&slider.curve));
            path.fit_to_length(slider.pixel_length);
            to_numpy(py, path.points())
        })
        .collect()
}

/// Slider ball frames normalized to the screen, one row per step
#[pyfunction]
fn generate_slider_ball_frames_exact(
    file_path: String,
    start_time: i32,
    end_time: i32,
    frame_rate: i32,
    screen_width: f32,
    screen_height: f32,
) -> PyResult<Vec<Vec<f32>>> {
    let beatmap = beatmap::parse_beatmap(&file_path)?;
    let frames = beatmap::generate_slider_ball_frames(&beatmap, start_time, end_time, frame_rate);

    Ok(frames
        .into_iter()
        .map(|[x, y, active]| {
            vec![
                (x / screen_width).clamp(0.0, 1.0) - 0.5,
                (y / screen_height).clamp(0.0, 1.0) - 0.5,
                active,
            ]
        })
        .collect())
}

/// A Python module implemented in Rust.
#[pymodule]
fn osu_slider(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(approximate_curve, m)?)?;
    m.add_function(wrap_pyfunction!(build_slider_path, m)?)?;
    m.add_function(wrap_pyfunction!(slider_paths_fast, m)?)?;
    m.add_function(wrap_pyfunction!(generate_slider_ball_frames_exact, m)?)?;
    Ok(())
}
