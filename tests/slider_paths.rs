use approx::assert_abs_diff_eq;
use osu_slider::curve::{circular_arc_bounding_box, CIRCULAR_ARC_TOLERANCE};
use osu_slider::{generate_slider_ball_frames, parse_beatmap_str, Beatmap, CurveKind, Point};

const MAP: &str = "osu file format v14

[General]
AudioLeadIn: 250

[Difficulty]
SliderMultiplier:1
SliderTickRate:2

[TimingPoints]
0,500,4,2,0,60,1,0

[HitObjects]
0,0,1000,2,0,L|100:0|100:0|100:100,1,200
256,192,3000,1,0
0,0,4000,2,0,P|50:50|100:0,1,150
this,is,not,a,hit,object
300,300,5000,2,0,C|350:350|400:300|450:350,2,160
";

fn beatmap() -> Beatmap {
    parse_beatmap_str(MAP).unwrap()
}

#[test]
fn parses_settings_and_skips_broken_objects() {
    let beatmap = beatmap();

    assert_eq!(beatmap.audio_lead_in, 250);
    assert_eq!(beatmap.slider_multiplier, 1.0);
    assert_eq!(beatmap.slider_tick_rate, 2.0);
    assert_eq!(beatmap.timing_points.len(), 1);
    assert_eq!(beatmap.hit_objects.len(), 4);
    assert_eq!(beatmap.hit_objects.iter().filter(|o| o.is_slider()).count(), 3);
    assert!(beatmap.hit_objects[1].is_circle());
}

#[test]
fn linear_slider_is_stitched_at_its_reset_point() {
    let beatmap = beatmap();
    let track = beatmap.slider_track(&beatmap.hit_objects[0]).unwrap();

    assert_eq!(
        track.path.points(),
        &[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0)
        ]
    );
    assert_eq!(track.path.length(), 200.0);
    assert_abs_diff_eq!(track.duration, 1000.0);
    assert_eq!(track.position_at(1500), Point::new(100.0, 0.0));
}

#[test]
fn perfect_circle_slider_stays_on_its_circle() {
    let beatmap = beatmap();
    let obj = &beatmap.hit_objects[2];
    let slider = obj.slider.as_ref().unwrap();
    assert_eq!(slider.curve.kinds, vec![CurveKind::PerfectCircle]);

    let track = beatmap.slider_track(obj).unwrap();
    let centre = Point::new(50.0, 0.0);
    for p in track.path.points() {
        assert_abs_diff_eq!(p.distance(centre), 50.0, epsilon = CIRCULAR_ARC_TOLERANCE + 1e-3);
    }
    assert_abs_diff_eq!(track.path.length(), 150.0, epsilon = 1e-3);

    let arc_bounds = circular_arc_bounding_box(&slider.curve.points).unwrap();
    assert_abs_diff_eq!(arc_bounds.max.y, 50.0, epsilon = 1e-3);
    assert!(track.path.bounding_box().max.y <= arc_bounds.max.y + 1e-3);
}

#[test]
fn catmull_slider_bounces_over_repeats() {
    let beatmap = beatmap();
    let obj = &beatmap.hit_objects[3];
    let track = beatmap.slider_track(obj).unwrap();

    assert_eq!(track.spans, 2);
    assert_abs_diff_eq!(track.path.length(), 160.0, epsilon = 1e-3);

    let head = track.position_at(obj.time);
    let turn = track.position_at(obj.time + (track.duration / 2.0) as i32);
    let back = track.position_at(obj.time + track.duration as i32);

    assert_eq!(head, Point::new(300.0, 300.0));
    assert!(turn.distance(head) > 100.0);
    assert!(back.abs_diff_eq(head, 1e-3));
}

#[test]
fn ball_frames_follow_active_slider() {
    let beatmap = beatmap();
    let frames = generate_slider_ball_frames(&beatmap, 900, 2100, 100);

    assert_eq!(frames.len(), 12);
    assert_eq!(frames[0], [0.0, 0.0, 0.0]);
    assert_eq!(frames[1], [0.0, 0.0, 1.0]);
    assert_eq!(frames[6], [100.0, 0.0, 1.0]);
    assert_eq!(frames[11], [100.0, 100.0, 1.0]);
}
