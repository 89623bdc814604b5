use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use motrack_rs::{CameraWarp, Detection, Rect, Tracker, TrackerConfig};

const NUM_FRAMES: usize = 200;
const NUM_OBJECTS: usize = 40;

/// Objects walking on a grid with a slowly panning camera.
/// Every seventh object drops to a low score on odd frames.
fn synthetic_scene() -> Vec<Vec<Detection>> {
    (0..NUM_FRAMES)
        .map(|frame| {
            let pan = frame as f32 * 0.5;
            (0..NUM_OBJECTS)
                .map(|obj| {
                    let col = (obj % 8) as f32;
                    let row = (obj / 8) as f32;
                    let vx = 1.0 + (obj % 3) as f32;
                    let x = col * 160.0 + vx * frame as f32 - pan;
                    let y = row * 200.0 + (obj % 5) as f32 * frame as f32 * 0.3;
                    let score = if obj % 7 == 0 && frame % 2 == 1 {
                        0.3
                    } else {
                        0.9
                    };
                    let feature = vec![(obj % 4) as f32 + 1.0, (obj / 4) as f32 + 1.0, 1.0];
                    Detection::from_rect(Rect::new(x, y, 60.0, 150.0), score)
                        .with_class((obj % 2) as u32)
                        .with_feature(feature)
                })
                .collect()
        })
        .collect()
}

fn bench_trackers(c: &mut Criterion) {
    let scene = synthetic_scene();
    let warp = CameraWarp::translation(-0.5, 0.0);
    let configs = [
        ("sort", TrackerConfig::sort(1, 3, 0.3)),
        ("bytetrack", TrackerConfig::bytetrack(30, 0.5, 0.6, 0.8)),
        ("botsort", TrackerConfig::botsort()),
    ];

    let mut group = c.benchmark_group("tracker_update");
    for (name, config) in configs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let mut tracker = Tracker::new(config.clone()).unwrap();
                for dets in scene.iter() {
                    let _ = tracker.update_with_warp(dets, &warp).unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_trackers
}
criterion_main!(benches);
