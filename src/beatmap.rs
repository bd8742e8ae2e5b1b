//! Reading slider definitions and timing out of `.osu` beatmaps.

use std::collections::HashMap;
use std::fs;

use crate::error::{BeatmapError, BeatmapResult};
use crate::path::Path;
use crate::slider::SliderPathBuilder;
use crate::types::*;

/// Beat length (ms) assumed when a map has no usable uninherited timing point.
const DEFAULT_BEAT_LENGTH: f64 = 500.0;

pub fn parse_beatmap(file_path: impl AsRef<std::path::Path>) -> BeatmapResult<Beatmap> {
    let contents = fs::read_to_string(file_path)?;
    parse_beatmap_str(&contents)
}

pub fn parse_beatmap_str(contents: &str) -> BeatmapResult<Beatmap> {
    let mut sections: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut current_section: Option<&str> = None;

    // The version line sits before any section and is ignored with them.
    for line in contents.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = &line[1..line.len() - 1];
            sections.entry(name).or_default();
            current_section = Some(name);
        } else if let Some(section) = current_section {
            sections.entry(section).or_default().push(line);
        }
    }

    let mut beatmap = Beatmap::default();

    for (key, value) in key_values(sections.get("Difficulty")) {
        match key {
            "SliderMultiplier" => {
                beatmap.slider_multiplier = value.parse().unwrap_or(beatmap.slider_multiplier)
            }
            "SliderTickRate" => {
                beatmap.slider_tick_rate = value.parse().unwrap_or(beatmap.slider_tick_rate)
            }
            _ => {}
        }
    }

    for (key, value) in key_values(sections.get("General")) {
        if key == "AudioLeadIn" {
            beatmap.audio_lead_in = value.parse().unwrap_or(0);
        }
    }

    for line in sections.get("TimingPoints").into_iter().flatten() {
        match parse_timing_point(line) {
            Ok(timing_point) => beatmap.timing_points.push(timing_point),
            Err(e) => log::warn!("skipping timing point `{line}`: {e}"),
        }
    }
    beatmap.timing_points.sort_by_key(|tp| tp.time);

    let hit_object_lines = sections
        .get("HitObjects")
        .ok_or(BeatmapError::MissingSection("HitObjects"))?;

    for line in hit_object_lines {
        // One broken object should not cost the rest of the map.
        match parse_hit_object(line) {
            Ok(hit_object) => beatmap.hit_objects.push(hit_object),
            Err(e) => log::warn!("skipping hit object `{line}`: {e}"),
        }
    }

    log::debug!(
        "parsed beatmap: {} hit objects ({} sliders), {} timing points",
        beatmap.hit_objects.len(),
        beatmap.hit_objects.iter().filter(|o| o.is_slider()).count(),
        beatmap.timing_points.len()
    );

    Ok(beatmap)
}

fn key_values<'a>(lines: Option<&'a Vec<&'a str>>) -> impl Iterator<Item = (&'a str, &'a str)> {
    lines
        .into_iter()
        .flatten()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
}

pub fn parse_timing_point(line: &str) -> BeatmapResult<TimingPoint> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(BeatmapError::MissingField {
            expected: 2,
            found: parts.len(),
        });
    }

    let time = parts[0].parse::<f64>()? as i32;
    let beat_length = parts[1].parse::<f64>()?;
    let meter = parts.get(2).and_then(|m| m.parse().ok()).unwrap_or(4);
    let uninherited = parts.get(6).map_or(true, |u| *u == "1");

    Ok(TimingPoint {
        time,
        beat_length,
        meter,
        uninherited,
    })
}

pub fn parse_hit_object(line: &str) -> BeatmapResult<HitObject> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(BeatmapError::MissingField {
            expected: 4,
            found: parts.len(),
        });
    }

    let position = Point::new(parts[0].parse()?, parts[1].parse()?);
    let time = parts[2].parse::<i32>()?;
    let object_type = parts[3].parse::<u8>()?;
    let hit_sound = parts.get(4).and_then(|h| h.parse().ok()).unwrap_or(0);

    let mut end_time = None;
    let mut slider = None;

    if object_type & SLIDER != 0 && parts.len() > 5 {
        let curve = parse_curve(position, parts[5])?;
        let repeat = parts
            .get(6)
            .and_then(|r| r.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        let pixel_length = parts
            .get(7)
            .and_then(|l| l.parse().ok())
            .unwrap_or(100.0);

        slider = Some(SliderData {
            curve,
            repeat,
            pixel_length,
        });
    }

    if object_type & SPINNER != 0 && parts.len() > 5 {
        end_time = parts[5].parse().ok();
    }

    Ok(HitObject {
        position,
        time,
        object_type,
        hit_sound,
        end_time,
        slider,
    })
}

/// Parses a slider curve field such as `B|100:200|150:200|150:200|200:120`.
///
/// The slider head becomes the first control point. A curve-type letter after
/// the first switches the kind of the following run, duplicating the previous
/// point as its reset marker when the map does not already do so.
pub fn parse_curve(head: Point, field: &str) -> BeatmapResult<SliderDefinition> {
    let mut kinds = Vec::new();
    let mut points = vec![head];

    for token in field.split('|').map(str::trim) {
        if let Some((x, y)) = token.split_once(':') {
            let invalid = || BeatmapError::InvalidCurve(token.to_owned());
            let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
            let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
            let point = Point::new(x, y);

            // An explicit first point on top of the head is not a reset.
            if points.len() == 1 && point == head {
                continue;
            }
            points.push(point);
        } else if let Some(letter) = curve_letter(token) {
            let kind = CurveKind::from_char(letter).unwrap_or_else(|| {
                log::warn!("unknown curve type `{letter}`, using bezier");
                CurveKind::Bezier
            });
            start_run(&mut kinds, &mut points, kind);
        } else {
            return Err(BeatmapError::InvalidCurve(token.to_owned()));
        }
    }

    if kinds.is_empty() {
        log::warn!("curve `{field}` has no type, using bezier");
        kinds.push(CurveKind::Bezier);
    }

    Ok(SliderDefinition::with_kinds(kinds, points))
}

fn curve_letter(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

fn start_run(kinds: &mut Vec<CurveKind>, points: &mut Vec<Point>, kind: CurveKind) {
    let n = points.len();
    if n >= 2 && points[n - 1] != points[n - 2] {
        points.push(points[n - 1]);
    }

    // One kind per completed run so far, then the new one.
    let completed = points.windows(2).filter(|w| w[0] == w[1]).count();
    let fill = kinds.last().copied().unwrap_or(CurveKind::Bezier);
    kinds.resize(completed, fill);
    kinds.push(kind);
}

/// A slider's fitted path together with the timing needed to move its ball.
#[derive(Debug, Clone)]
pub struct SliderTrack {
    pub start_time: i32,
    /// Total duration over all spans, in milliseconds.
    pub duration: f64,
    pub spans: u32,
    pub path: Path,
}

impl SliderTrack {
    pub fn end_time(&self) -> f64 {
        self.start_time as f64 + self.duration
    }

    pub fn is_active(&self, time: i32) -> bool {
        time >= self.start_time && time as f64 <= self.end_time()
    }

    /// Ball position at `time`: the head before the slider starts, the end of
    /// the final span once it is over.
    pub fn position_at(&self, time: i32) -> Point {
        let elapsed = (time - self.start_time) as f64;
        if elapsed <= 0.0 {
            return self.path.position_at_length(0.0);
        }

        let progress = if self.duration > 0.0 {
            (elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        self.path.position_at_span_progress(progress as f32, self.spans)
    }
}

impl Beatmap {
    /// Beat length of the uninherited timing point in effect at `time`.
    pub fn beat_length_at(&self, time: i32) -> f64 {
        let uninherited = self
            .timing_points
            .iter()
            .filter(|tp| tp.uninherited && tp.beat_length > 0.0);
        let first = uninherited.clone().next();

        uninherited
            .filter(|tp| tp.time <= time)
            .last()
            .or(first)
            .map_or(DEFAULT_BEAT_LENGTH, |tp| tp.beat_length)
    }

    /// Slider velocity multiplier from the inherited timing point in effect at
    /// `time`; an uninherited point resets it to 1.
    pub fn slider_velocity_at(&self, time: i32) -> f64 {
        match self.timing_points.iter().filter(|tp| tp.time <= time).last() {
            Some(tp) if !tp.uninherited && tp.beat_length < 0.0 => {
                (-100.0 / tp.beat_length).clamp(0.1, 10.0)
            }
            _ => 1.0,
        }
    }

    pub fn slider_duration(&self, obj: &HitObject) -> f64 {
        let Some(slider) = &obj.slider else {
            return 0.0;
        };

        let beat_length = self.beat_length_at(obj.time);
        let velocity = self.slider_multiplier * self.slider_velocity_at(obj.time);
        beat_length * slider.pixel_length as f64 / (100.0 * velocity) * slider.repeat as f64
    }

    pub fn slider_track(&self, obj: &HitObject) -> Option<SliderTrack> {
        self.slider_track_with(&mut SliderPathBuilder::new(), obj)
    }

    fn slider_track_with(
        &self,
        builder: &mut SliderPathBuilder,
        obj: &HitObject,
    ) -> Option<SliderTrack> {
        let slider = obj.slider.as_ref()?;

        let mut path = Path::new(builder.build(&slider.curve));
        path.fit_to_length(slider.pixel_length);

        Some(SliderTrack {
            start_time: obj.time,
            duration: self.slider_duration(obj),
            spans: slider.repeat,
            path,
        })
    }

    /// Tracks for every slider in the map, ordered by start time.
    pub fn slider_tracks(&self) -> Vec<SliderTrack> {
        let mut builder = SliderPathBuilder::new();
        let mut tracks: Vec<SliderTrack> = self
            .hit_objects
            .iter()
            .filter_map(|obj| self.slider_track_with(&mut builder, obj))
            .collect();
        tracks.sort_by_key(|track| track.start_time);
        tracks
    }

    pub fn slider_ball_position(&self, obj: &HitObject, time: i32) -> Point {
        self.slider_track(obj)
            .map_or(obj.position, |track| track.position_at(time))
    }
}

/// Samples the ball of whichever slider is active every `step` ms in
/// `[start_time, end_time)`. Each row is `[x, y, active]`, zeros when no
/// slider is running.
pub fn generate_slider_ball_frames(
    beatmap: &Beatmap,
    start_time: i32,
    end_time: i32,
    step: i32,
) -> Vec<[f32; 3]> {
    let tracks = beatmap.slider_tracks();
    let step = step.max(1) as usize;
    let mut first_live = 0;

    (start_time..end_time)
        .step_by(step)
        .map(|time| {
            while first_live < tracks.len() && tracks[first_live].end_time() < time as f64 {
                first_live += 1;
            }

            tracks[first_live..]
                .iter()
                .take_while(|track| track.start_time <= time)
                .find(|track| track.is_active(time))
                .map_or([0.0, 0.0, 0.0], |track| {
                    let p = track.position_at(time);
                    [p.x, p.y, 1.0]
                })
        })
        .collect()
}
