// Host-side tests for the curve field and the packed texture it maintains.

use glam::Vec2;
use rand::prelude::*;
use viz_core::{
    ControlPointMap, CurveField, State, VizConfig, VizError, SCATTER_POINTS_PER_PAIR,
    SCATTER_SPREAD,
};

fn triangle_state() -> State {
    let mut state = State::ring(3);
    let positions = [Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(-1.0, 0.0)];
    for (inst, pos) in state.instruments.iter_mut().zip(positions) {
        inst.pos = pos;
    }
    state
}

fn make_field(n: usize) -> CurveField {
    CurveField::new(VizConfig::with_instruments(n))
}

fn spiral_points(len: usize, phase: f32) -> Vec<Vec2> {
    (0..len)
        .map(|k| {
            let a = phase + k as f32 * 0.7;
            Vec2::new(a.cos(), a.sin()) * (0.2 + 0.05 * k as f32)
        })
        .collect()
}

#[test]
fn triangle_scenario() {
    let mut field = make_field(3);
    field.set_state(&triangle_state()).unwrap();
    let mut points = ControlPointMap::new(3);
    points.push(0, 1, Vec2::new(0.5, 0.5)).unwrap();
    field.set_control_points(points);

    let calc = field.calculated(0, 1).unwrap();
    assert_eq!(
        calc,
        &[Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.5), Vec2::new(0.0, 1.0)]
    );
    let p = field.interpolate(0, 1, 0.25).unwrap();
    assert!(p.abs_diff_eq(Vec2::new(0.8125, 0.1875), 1e-6), "got {p}");

    // column 0 * 3 + 1
    let tex = field.texture();
    assert_eq!(tex.count(1), 3);
    let row1 = tex.texel(1, 1).unwrap();
    assert_eq!(row1.point(), Vec2::new(1.0, 0.0));
    assert_eq!(row1.tangent(), Vec2::new(-0.5, 0.5));
    let last = tex.texel(1, 3).unwrap();
    assert_eq!(last.point(), Vec2::new(0.0, 1.0));
    assert_eq!(last.tangent(), Vec2::ZERO);
}

#[test]
fn calculated_sequences_wrap_control_points_with_positions() {
    let n = 4;
    let mut field = make_field(n);
    let mut state = State::ring(n);
    state.instruments[2].pos = Vec2::new(0.3, -0.7);
    field.set_state(&state).unwrap();

    let mut points = ControlPointMap::new(n);
    for from in 0..n {
        for to in 0..n {
            points.set(from, to, spiral_points(from + to, 0.1)).unwrap();
        }
    }
    field.set_control_points(points.clone());

    for from in 0..n {
        for to in 0..n {
            let raw = points.get(from, to).unwrap();
            let calc = field.calculated(from, to).unwrap();
            assert_eq!(calc.len(), raw.len() + 2);
            assert_eq!(calc[0], state.instruments[from].pos);
            assert_eq!(calc[calc.len() - 1], state.instruments[to].pos);
            assert_eq!(&calc[1..calc.len() - 1], raw);
        }
    }
}

#[test]
fn moving_instruments_refreshes_endpoints() {
    let mut field = make_field(3);
    field.set_state(&triangle_state()).unwrap();
    let mut moved = triangle_state();
    moved.instruments[1].pos = Vec2::new(0.2, 0.9);
    field.set_state(&moved).unwrap();

    assert_eq!(field.calculated(0, 1).unwrap()[1], Vec2::new(0.2, 0.9));
    assert_eq!(field.texture().texel(1, 2).unwrap().point(), Vec2::new(0.2, 0.9));
    assert_eq!(field.interpolate(0, 1, 1.0).unwrap(), Vec2::new(0.2, 0.9));
}

#[test]
fn oversized_sequences_are_truncated_from_the_tail() {
    let mut field = make_field(6);
    let max = field.config().max_control_points;
    assert_eq!(max, 50);

    let authored = spiral_points(60, 0.0);
    let mut points = ControlPointMap::new(6);
    points.set(2, 5, authored.clone()).unwrap();
    field.set_control_points(points);

    let stored = field.control_points().get(2, 5).unwrap();
    assert_eq!(stored.len(), max - 1);
    assert_eq!(stored, &authored[..max - 1]);
    assert_eq!(field.calculated(2, 5).unwrap().len(), max + 1);
    assert_eq!(field.texture().count(2 * 6 + 5), max + 1);
}

#[test]
fn sequence_exactly_at_capacity_loses_one_point() {
    let mut field = make_field(2);
    let max = field.config().max_control_points;
    let mut points = ControlPointMap::new(2);
    points.set(0, 1, spiral_points(max, 0.3)).unwrap();
    field.set_control_points(points);
    assert_eq!(field.control_points().get(0, 1).unwrap().len(), max - 1);
}

#[test]
fn packed_texture_reproduces_live_evaluation() {
    let n = 3;
    let mut field = make_field(n);
    field.set_state(&triangle_state()).unwrap();
    let mut points = ControlPointMap::new(n);
    points.set(0, 2, spiral_points(5, 0.4)).unwrap();
    points.set(2, 1, spiral_points(1, 1.1)).unwrap();
    points.set(1, 0, spiral_points(12, 2.0)).unwrap();
    field.set_control_points(points);

    for from in 0..n {
        for to in 0..n {
            for i in 0..=64 {
                let t = i as f32 / 64.0;
                let live = field.interpolate(from, to, t).unwrap();
                let packed = field.texture().sample(from * n + to, t).unwrap();
                assert!(
                    live.abs_diff_eq(packed, 1e-5),
                    "({from},{to}) t={t}: live {live} packed {packed}"
                );
            }
        }
    }
}

#[test]
fn shorter_update_leaves_no_stale_rows() {
    let mut field = make_field(2);
    let mut points = ControlPointMap::new(2);
    points.set(0, 1, spiral_points(10, 0.0)).unwrap();
    field.set_control_points(points);
    assert_eq!(field.texture().count(1), 12);

    let mut points = ControlPointMap::new(2);
    points.set(0, 1, spiral_points(1, 0.0)).unwrap();
    field.set_control_points(points);
    let tex = field.texture();
    assert_eq!(tex.count(1), 3);
    for row in 4..tex.height() {
        assert_eq!(tex.texel(1, row).unwrap().0, [0.0; 4], "row {row}");
    }
    assert_eq!(tex.column_points(1), field.calculated(0, 1).unwrap());
}

#[test]
fn texture_has_fixed_dimensions() {
    let field = make_field(5);
    let tex = field.texture();
    assert_eq!(tex.width(), 25);
    assert_eq!(tex.height(), 2 + field.config().max_control_points);
    assert_eq!(tex.size(), [25.0, 52.0]);
    assert_eq!(tex.as_bytes().len(), 25 * 52 * 16);
    assert_eq!(tex.bytes_per_row(), 25 * 16);
    // every column, self-pairs included, holds at least the two endpoints
    for col in 0..tex.width() {
        assert_eq!(tex.count(col), 2);
    }
}

#[test]
fn absent_pairs_are_empty() {
    let field = make_field(4);
    for from in 0..4 {
        for to in 0..4 {
            assert_eq!(field.calculated(from, to).unwrap().len(), 2);
            assert!(field.control_points().get(from, to).unwrap().is_empty());
        }
    }
}

#[test]
fn out_of_range_pairs_are_errors() {
    let field = make_field(3);
    assert_eq!(
        field.interpolate(3, 0, 0.5),
        Err(VizError::PairOutOfRange {
            from: 3,
            to: 0,
            count: 3
        })
    );
    assert!(field.calculated(0, 7).is_err());
}

#[test]
fn mismatched_state_is_rejected() {
    let mut field = make_field(3);
    let before = field.positions().to_vec();
    let err = field.set_state(&State::ring(4)).unwrap_err();
    assert_eq!(
        err,
        VizError::InstrumentCountMismatch {
            expected: 3,
            actual: 4
        }
    );
    assert_eq!(field.positions(), before.as_slice());
}

#[test]
fn control_points_for_another_ensemble_are_resized() {
    let mut field = make_field(2);
    let mut points = ControlPointMap::new(3);
    points.push(0, 1, Vec2::new(0.1, 0.2)).unwrap();
    points.push(2, 0, Vec2::new(0.3, 0.4)).unwrap();
    field.set_control_points(points);

    assert_eq!(field.control_points().num_instruments(), 2);
    assert_eq!(field.control_points().get(0, 1).unwrap(), &[Vec2::new(0.1, 0.2)]);
}

#[test]
fn single_point_cap_keeps_only_endpoints() {
    let config = VizConfig {
        max_control_points: 1,
        ..VizConfig::with_instruments(3)
    };
    let mut field = CurveField::new(config);
    assert_eq!(field.texture().height(), 3);

    let mut points = ControlPointMap::new(3);
    points.push(0, 1, Vec2::new(0.5, 0.5)).unwrap();
    points.push(0, 1, Vec2::new(0.2, 0.9)).unwrap();
    field.set_control_points(points);

    assert!(field.control_points().get(0, 1).unwrap().is_empty());
    let positions = field.positions().to_vec();
    assert_eq!(field.calculated(0, 1).unwrap(), &[positions[0], positions[1]]);
    let tex = field.texture();
    assert_eq!(tex.count(1), 2);
    assert_eq!(tex.texel(1, 2).unwrap().point(), positions[1]);
    assert_eq!(tex.texel(1, 3), None);
}

#[test]
fn zero_cap_is_raised_to_one() {
    let config = VizConfig {
        max_control_points: 0,
        ..VizConfig::with_instruments(2)
    };
    let field = CurveField::new(config);
    assert_eq!(field.config().max_control_points, 1);
    assert_eq!(field.texture().height(), 3);
    assert_eq!(field.texture().count(1), 2);
}

#[test]
fn packed_texture_matches_live_evaluation_exactly_on_a_grid() {
    // integer coordinates make the summed tangents exact
    let mut field = make_field(2);
    let mut state = State::ring(2);
    state.instruments[0].pos = Vec2::new(-4.0, 0.0);
    state.instruments[1].pos = Vec2::new(4.0, 2.0);
    field.set_state(&state).unwrap();
    let mut points = ControlPointMap::new(2);
    for p in [Vec2::new(-2.0, 3.0), Vec2::new(1.0, -1.0), Vec2::new(3.0, 5.0)] {
        points.push(0, 1, p).unwrap();
    }
    field.set_control_points(points);

    for step in 0..=16 {
        let t = step as f32 / 16.0;
        let live = field.interpolate(0, 1, t).unwrap();
        let packed = field.texture().sample(1, t).unwrap();
        assert_eq!(live, packed, "t = {t}");
    }
}

#[test]
fn scattered_points_respect_the_configured_cap() {
    let config = VizConfig {
        max_control_points: 3,
        ..VizConfig::with_instruments(4)
    };
    let mut field = CurveField::new(config);
    let mut rng = StdRng::seed_from_u64(3);
    field.scatter_control_points(&mut rng);

    let positions = field.positions().to_vec();
    for (from, to, pts) in field.control_points().iter() {
        if from == to {
            assert!(pts.is_empty());
            continue;
        }
        assert_eq!(pts.len(), 2);
        let (a, b) = (positions[from], positions[to]);
        let dir = (b - a).normalize();
        for p in pts {
            let offset = (*p - a).perp_dot(dir).abs();
            assert!(offset <= SCATTER_SPREAD + 1e-5, "offset {offset}");
        }
    }
}

#[test]
fn default_scatter_uses_every_slot() {
    let mut field = make_field(3);
    let mut rng = StdRng::seed_from_u64(9);
    field.scatter_control_points(&mut rng);
    assert_eq!(
        field.control_points().get(2, 0).unwrap().len(),
        SCATTER_POINTS_PER_PAIR
    );
    assert_eq!(field.texture().count(2 * 3), SCATTER_POINTS_PER_PAIR + 2);
}
