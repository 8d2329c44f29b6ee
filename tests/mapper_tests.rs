use approx::assert_relative_eq;
use pointcloud_sequencer::{cycle_length, map_global_index, FrameRef, PlaybackMode};

#[test]
fn test_cycle_length_per_mode() {
    assert_eq!(cycle_length(5, PlaybackMode::Normal), 5);
    assert_eq!(cycle_length(5, PlaybackMode::Slow), 9);
    assert_eq!(cycle_length(1, PlaybackMode::Normal), 1);
    assert_eq!(cycle_length(1, PlaybackMode::Slow), 1);
    assert_eq!(cycle_length(0, PlaybackMode::Slow), 0);
}

#[test]
fn test_normal_mode_maps_every_index_to_original() {
    // F = 5, normal: G = 5 and no interpolation is ever produced
    for g in 0..5 {
        assert_eq!(
            map_global_index(g, 5, PlaybackMode::Normal),
            FrameRef::Original { index: g }
        );
    }
}

#[test]
fn test_slow_mode_even_indices_are_originals() {
    for g in (0..cycle_length(5, PlaybackMode::Slow)).step_by(2) {
        assert_eq!(
            map_global_index(g, 5, PlaybackMode::Slow),
            FrameRef::Original { index: g / 2 }
        );
    }
}

#[test]
fn test_slow_mode_odd_indices_interpolate_adjacent_slots() {
    // F = 5, slow: G = 9
    let cases = [(1, 0, 1), (3, 1, 2), (5, 2, 3), (7, 3, 4)];
    for (g, lower, upper) in cases {
        match map_global_index(g, 5, PlaybackMode::Slow) {
            FrameRef::Interpolated {
                lower: l,
                upper: u,
                alpha,
            } => {
                assert_eq!((l, u), (lower, upper));
                assert_relative_eq!(alpha, 0.5);
            }
            other => panic!("expected interpolated frame at g={g}, got {other:?}"),
        }
    }
    // terminal index is the last original, not an overrun pair
    assert_eq!(
        map_global_index(8, 5, PlaybackMode::Slow),
        FrameRef::Original { index: 4 }
    );
}

#[test]
fn test_upper_index_clamps_at_last_frame() {
    // the pair at g = 7 is (3, 4); a hypothetical g = 9 would clamp to (4, 4)
    match map_global_index(9, 5, PlaybackMode::Slow) {
        FrameRef::Interpolated { lower, upper, .. } => {
            assert_eq!(lower, 4);
            assert_eq!(upper, 4);
        }
        other => panic!("expected interpolated frame, got {other:?}"),
    }
    // F = 1 degenerates to interpolating the only frame with itself
    match map_global_index(1, 1, PlaybackMode::Slow) {
        FrameRef::Interpolated { lower, upper, .. } => {
            assert_eq!((lower, upper), (0, 0));
        }
        other => panic!("expected interpolated frame, got {other:?}"),
    }
}

#[test]
fn test_mapping_is_idempotent() {
    for g in 0..9 {
        assert_eq!(
            map_global_index(g, 5, PlaybackMode::Slow),
            map_global_index(g, 5, PlaybackMode::Slow)
        );
    }
}

#[test]
fn test_advancing_a_full_cycle_returns_to_the_same_slot() {
    for mode in [PlaybackMode::Normal, PlaybackMode::Slow] {
        let cycle = cycle_length(5, mode);
        let mut g = 0usize;
        let origin = map_global_index(g, 5, mode);
        for _ in 0..cycle {
            g = (g + 1) % cycle;
        }
        assert_eq!(g, 0);
        assert_eq!(map_global_index(g, 5, mode), origin);
    }
}
