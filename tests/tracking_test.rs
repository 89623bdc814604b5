use motrack_rs::tracker::linear_assignment;
use motrack_rs::{
    AssociationKind, Detection, Rect, TrackError, TrackState, Tracker, TrackerConfig,
};
use ndarray::array;

fn tlwh(x: f32, y: f32, w: f32, h: f32, score: f32) -> Detection {
    Detection::from_rect(Rect::new(x, y, w, h), score)
}

#[test]
fn test_sort_lifecycle() {
    let mut tracker = Tracker::new(TrackerConfig::sort(1, 3, 0.3)).unwrap();

    // Frame 1: new track, tentative
    let tracks1 = tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap();
    assert!(tracks1.is_empty());
    assert_eq!(tracker.tracks().len(), 1);
    assert_eq!(tracker.tracks()[0].state(), TrackState::Tentative);

    // Frame 2: IoU with the prediction is about 0.68
    let tracks2 = tracker.update(&[tlwh(1.0, 1.0, 10.0, 10.0, 0.9)]).unwrap();
    assert!(tracks2.is_empty());
    assert_eq!(tracker.tracks()[0].hits(), 2);
    assert_eq!(tracker.tracks()[0].state(), TrackState::Tentative);

    // Frame 3: third hit confirms the track
    let tracks3 = tracker.update(&[tlwh(2.0, 2.0, 10.0, 10.0, 0.9)]).unwrap();
    assert_eq!(tracks3.len(), 1);
    let id = tracks3[0].track_id;
    assert!((tracks3[0].rect.x - 2.0).abs() < 1.0);
    assert!((tracks3[0].rect.width - 10.0).abs() < 1.0);

    // Frame 4: missed once, still alive but not reported
    let tracks4 = tracker.update(&[]).unwrap();
    assert!(tracks4.is_empty());
    assert_eq!(tracker.tracks().len(), 1);
    assert_eq!(tracker.tracks()[0].track_id(), id);
    assert_eq!(tracker.tracks()[0].time_since_update(), 1);
    assert_eq!(tracker.tracks()[0].state(), TrackState::Lost);

    // Frame 5: max_age exceeded
    let tracks5 = tracker.update(&[]).unwrap();
    assert!(tracks5.is_empty());
    assert!(tracker.tracks().is_empty());
}

#[test]
fn test_empty_updates_are_idempotent() {
    let mut tracker = Tracker::new(TrackerConfig {
        min_hits: 1,
        ..TrackerConfig::default()
    })
    .unwrap();
    tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap();

    for _ in 0..10 {
        assert!(tracker.update(&[]).unwrap().is_empty());
    }
    assert!(tracker.tracks().is_empty());
    assert_eq!(tracker.frame_id(), 11);
}

#[test]
fn test_bytetrack_low_score_recovery() {
    let config = TrackerConfig {
        min_hits: 1,
        ..TrackerConfig::bytetrack(30, 0.5, 0.6, 0.8)
    };
    let mut tracker = Tracker::new(config).unwrap();
    assert_eq!(tracker.strategy().name(), "ByteTrack");

    let tracks1 = tracker
        .update(&[Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)])
        .unwrap();
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].track_id;

    let tracks2 = tracker
        .update(&[Detection::new(105.0, 105.0, 205.0, 205.0, 0.9)])
        .unwrap();
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].track_id, id1);

    // Occluded: only the second pass can pick this one up
    let tracks3 = tracker
        .update(&[Detection::new(110.0, 110.0, 210.0, 210.0, 0.2)])
        .unwrap();
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].track_id, id1);
    assert_eq!(tracks3[0].score, 0.2);

    let tracks4 = tracker.update(&[]).unwrap();
    assert!(tracks4.is_empty());
    assert_eq!(tracker.tracks()[0].state(), TrackState::Lost);

    // Within the track buffer the lost track is found again
    let tracks5 = tracker
        .update(&[Detection::new(115.0, 115.0, 215.0, 215.0, 0.9)])
        .unwrap();
    assert_eq!(tracks5.len(), 1);
    assert_eq!(tracks5[0].track_id, id1);
}

#[test]
fn test_bytetrack_low_score_never_spawns() {
    let config = TrackerConfig {
        min_hits: 1,
        ..TrackerConfig::bytetrack(30, 0.5, 0.6, 0.8)
    };
    let mut tracker = Tracker::new(config).unwrap();
    let tracks = tracker
        .update(&[
            Detection::new(0.0, 0.0, 10.0, 10.0, 0.3),
            Detection::new(50.0, 50.0, 60.0, 60.0, 0.55),
        ])
        .unwrap();
    assert!(tracks.is_empty());
    assert!(tracker.tracks().is_empty());
}

#[test]
fn test_gate_selects_only_feasible_pairing() {
    // Two tracks, two detections: only (0, 1) clears the 0.7 gate.
    let cost = array![[0.71_f32, 0.69], [0.99, 0.72]];
    let result = linear_assignment(&cost, 0.7);
    assert_eq!(result.matches, vec![(0, 1)]);
    assert_eq!(result.unmatched_tracks, vec![1]);
    assert_eq!(result.unmatched_detections, vec![0]);
}

#[test]
fn test_separate_objects_keep_identities() {
    let mut tracker = Tracker::new(TrackerConfig::sort(1, 1, 0.3)).unwrap();
    let mut ids = Vec::new();
    for frame in 0..5 {
        let step = frame as f32 * 3.0;
        let tracks = tracker
            .update(&[
                tlwh(200.0 - step, 0.0, 40.0, 80.0, 0.9),
                tlwh(step, 0.0, 40.0, 80.0, 0.9),
            ])
            .unwrap();
        assert_eq!(tracks.len(), 2);
        let mut by_x: Vec<_> = tracks.iter().map(|t| (t.rect.x, t.track_id)).collect();
        by_x.sort_by(|a, b| a.0.total_cmp(&b.0));
        ids.push((by_x[0].1, by_x[1].1));
    }
    // Spawned in detection order from one contiguous block of ids
    let (left, right) = ids[0];
    assert_eq!(left.0, right.0 + 1);
    assert!(ids.iter().all(|&pair| pair == (left, right)));
}

#[test]
fn test_identities_never_reused() {
    let mut tracker = Tracker::new(TrackerConfig::sort(0, 1, 0.3)).unwrap();
    let first = tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap()[0].track_id;

    tracker.update(&[]).unwrap();
    assert!(tracker.tracks().is_empty());

    let second = tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap()[0].track_id;
    assert!(second > first);

    tracker.reset();
    assert_eq!(tracker.frame_id(), 0);
    let third = tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap()[0].track_id;
    assert!(third > second);
}

#[test]
fn test_identities_unique_across_trackers() {
    let config = TrackerConfig::sort(1, 1, 0.3);
    let mut a = Tracker::new(config.clone()).unwrap();
    let mut b = Tracker::new(config).unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        for tracker in [&mut a, &mut b] {
            let out = tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap();
            seen.push(out[0].track_id);
        }
    }
    // Each tracker keeps its own identity across frames, and the two differ.
    assert!(seen.chunks(2).all(|frame| frame == &seen[..2]));
    assert_ne!(seen[0], seen[1]);
}

#[test]
fn test_tentative_track_removed_after_max_age() {
    let mut tracker = Tracker::new(TrackerConfig::sort(1, 3, 0.3)).unwrap();
    tracker.update(&[tlwh(0.0, 0.0, 10.0, 10.0, 0.9)]).unwrap();

    assert!(tracker.update(&[]).unwrap().is_empty());
    assert_eq!(tracker.tracks().len(), 1);
    assert_eq!(tracker.tracks()[0].state(), TrackState::Tentative);
    assert_eq!(tracker.tracks()[0].time_since_update(), 1);

    assert!(tracker.update(&[]).unwrap().is_empty());
    assert!(tracker.tracks().is_empty());
}

#[test]
fn test_class_filter_and_invalid_boxes() {
    let config = TrackerConfig {
        min_hits: 1,
        ..TrackerConfig::default()
    }
    .with_classes([0]);
    let mut tracker = Tracker::new(config).unwrap();
    let tracks = tracker
        .update(&[
            tlwh(0.0, 0.0, 10.0, 10.0, 0.9).with_class(0),
            tlwh(50.0, 0.0, 10.0, 10.0, 0.9).with_class(2),
            tlwh(100.0, 0.0, 0.0, 10.0, 0.9),
            tlwh(f32::NAN, 0.0, 10.0, 10.0, 0.9),
        ])
        .unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].class_id, 0);
    assert_eq!(tracker.tracks().len(), 1);
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "tracker": "ByteTrack",
        "classes_to_track": [0, 2],
        "track_buffer": 60,
        "min_hits": 1
    }"#;
    let config = TrackerConfig::from_json_str(json).unwrap();
    assert_eq!(config.tracker, AssociationKind::ByteTrack);
    assert_eq!(config.track_buffer, 60);
    assert_eq!(config.effective_max_age(), 60);
    assert!(config.accepts_class(2));
    assert!(!config.accepts_class(1));

    let tracker = Tracker::new(config.clone()).unwrap();
    assert_eq!(tracker.config(), &config);
}

#[test]
fn test_invalid_config_rejected() {
    let config = TrackerConfig {
        iou_threshold: 1.5,
        ..TrackerConfig::default()
    };
    assert!(matches!(Tracker::new(config), Err(TrackError::Config(_))));
}
