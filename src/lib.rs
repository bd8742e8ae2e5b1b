//! osu! slider geometry: curve flattening, sub-path stitching and
//! arc-length addressed paths.
//!
//! Build with the `python` feature to get the `osu_slider` extension module.

pub mod beatmap;
pub mod curve;
pub mod error;
pub mod path;
pub mod slider;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use beatmap::{generate_slider_ball_frames, parse_beatmap, parse_beatmap_str, SliderTrack};
pub use error::{BeatmapError, BeatmapResult};
pub use path::Path;
pub use slider::{build_polyline, SliderPathBuilder};
pub use types::*;
