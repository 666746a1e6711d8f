// tests/engine_contract.rs
//
// Output shape, broadcasting and error contracts of the evaluation entry point.
// Run with: cargo test --test engine_contract

use approx::assert_relative_eq;
use ndarray::Axis;

use magstat::config::{EngineConfig, RunConfig};
use magstat::{
    compute_field, get_b, Engine, EvalOptions, Family, FieldError, FieldEvaluator, FieldKind,
    FormulaBatch, Member, Observer, Path, PixelGrid, Rotation, Scene, Sensor, Source,
};

fn two_magnets() -> (Scene, Member, Member) {
    let mut scene = Scene::new();
    let a = scene.add_source(Source::cuboid([0.0, 0.0, 1000.0], [1.0, 1.0, 1.0]));
    let b = scene.add_source(Source::sphere([500.0, 0.0, 0.0], 1.0).at([0.0, 3.0, 0.0]));
    (scene, a.into(), b.into())
}

#[test]
fn full_shape_is_entries_steps_observers_pixels_xyz() {
    let (mut scene, a, b) = two_magnets();
    let path = Path::from_positions(vec![[0.0, 0.0, 2.0], [0.0, 0.0, 3.0], [0.0, 0.0, 4.0]]).unwrap();
    let grid = PixelGrid::regular([-1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [2, 4, 1]);
    let s1 = scene.add_sensor(Sensor::default().with_path(path).with_pixels(grid.clone()));
    let s2 = scene.add_sensor(Sensor::new([5.0, 0.0, 0.0]).with_pixels(grid));

    let out = compute_field(
        &scene,
        FieldKind::B,
        &[a, b],
        &[s1.into(), s2.into()],
        EvalOptions::raw(),
    )
    .unwrap();
    assert_eq!(out.shape(), &[2, 3, 2, 2, 4, 1, 3]);

    let squeezed = compute_field(&scene, FieldKind::B, &[a, b], &[s1.into(), s2.into()], EvalOptions::default())
        .unwrap();
    assert_eq!(squeezed.shape(), &[2, 3, 2, 2, 4, 3]);

    let summed = compute_field(
        &scene,
        FieldKind::B,
        &[a, b],
        &[s1.into(), s2.into()],
        EvalOptions {
            sum_over_sources: true,
            squeeze: false,
        },
    )
    .unwrap();
    assert_eq!(summed.shape(), &[3, 2, 2, 4, 1, 3]);
    let idx: [usize; 6] = [1, 0, 1, 2, 0, 2];
    let total = out[&[0, 1, 0, 1, 2, 0, 2][..]] + out[&[1, 1, 0, 1, 2, 0, 2][..]];
    assert_relative_eq!(summed[&idx[..]], total, epsilon = 1e-12);
}

#[test]
fn single_source_single_point_squeezes_to_a_vector() {
    let (scene, a, _) = two_magnets();
    let out = get_b(&scene, &[a], &[Observer::point([1.0, 0.0, 1.0])]).unwrap();
    assert_eq!(out.shape(), &[3]);
}

#[test]
fn static_path_equals_explicitly_repeated_path() {
    let (mut scene, a, b) = two_magnets();
    let moving = Path::from_positions(vec![[0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [2.0, 0.0, 2.0], [3.0, 0.0, 2.0]])
        .unwrap();
    let s = scene.add_sensor(Sensor::default().with_path(moving));
    let broadcast = get_b(&scene, &[a, b], &[s.into()]).unwrap();

    let Member::Source(ia) = a else { unreachable!() };
    let state = scene.source(ia).unwrap().path.clone();
    let tiled = Path::from_steps(
        vec![state.current_position(); 4],
        vec![state.current_orientation(); 4],
    )
    .unwrap();
    scene.source_mut(ia).unwrap().path = tiled;
    let explicit = get_b(&scene, &[a, b], &[s.into()]).unwrap();

    assert_eq!(broadcast.shape(), &[2, 4, 3]);
    assert_eq!(broadcast, explicit);
}

#[test]
fn incompatible_path_lengths_are_rejected() {
    let (mut scene, a, _) = two_magnets();
    let Member::Source(ia) = a else { unreachable!() };
    scene.move_by(a, [1.0, 0.0, 0.0], 2).unwrap();
    assert_eq!(scene.source(ia).unwrap().path.len(), 3);

    let five = Path::from_positions(vec![[0.0, 0.0, 5.0]; 5]).unwrap();
    let s = scene.add_sensor(Sensor::default().with_path(five));
    let err = get_b(&scene, &[a], &[s.into()]).unwrap_err();
    assert!(matches!(err, FieldError::BadInputShape(_)), "{err}");
}

#[test]
fn mismatched_pixel_shapes_are_rejected() {
    let (scene, a, _) = two_magnets();
    let obs = [
        Observer::points(vec![[1.0, 0.0, 1.0], [2.0, 0.0, 1.0]]),
        Observer::point([3.0, 0.0, 1.0]),
    ];
    let err = get_b(&scene, &[a], &obs).unwrap_err();
    assert!(matches!(err, FieldError::BadInputShape(_)), "{err}");
}

#[test]
fn empty_inputs_are_rejected() {
    let (scene, a, _) = two_magnets();
    assert!(matches!(
        get_b(&scene, &[], &[Observer::point([1.0; 3])]),
        Err(FieldError::BadInputShape(_))
    ));
    assert!(matches!(get_b(&scene, &[a], &[]), Err(FieldError::BadInputShape(_))));
}

struct MagnetsOnly;

impl FieldEvaluator for MagnetsOnly {
    fn supports(&self, family: Family) -> bool {
        family.is_magnet()
    }

    fn evaluate(&self, _kind: FieldKind, batch: &FormulaBatch<'_>) -> magstat::Result<Vec<[f64; 3]>> {
        Ok(vec![[0.0, 0.0, 1.0]; batch.len()])
    }
}

struct ShortEvaluator;

impl FieldEvaluator for ShortEvaluator {
    fn supports(&self, _family: Family) -> bool {
        true
    }

    fn evaluate(&self, _kind: FieldKind, batch: &FormulaBatch<'_>) -> magstat::Result<Vec<[f64; 3]>> {
        Ok(vec![[0.0; 3]; batch.len().saturating_sub(1)])
    }
}

#[test]
fn unsupported_family_reports_unrecognized_source_type() {
    let (mut scene, a, _) = two_magnets();
    let coil = scene.add_source(Source::current_loop(1.0, 2.0));
    let engine = Engine::with_evaluator(MagnetsOnly, EngineConfig::default());
    let err = engine
        .get_b(&scene, &[a, coil.into()], &[Observer::point([0.0, 0.0, 5.0])])
        .unwrap_err();
    assert_eq!(err, FieldError::UnrecognizedSourceType("loop".to_string()));

    let ok = engine.get_b(&scene, &[a], &[Observer::point([0.0, 0.0, 5.0])]).unwrap();
    assert_eq!(ok[&[2][..]], 1.0);
}

#[test]
fn evaluator_row_count_mismatch_is_a_shape_error() {
    let (scene, a, _) = two_magnets();
    let engine = Engine::with_evaluator(ShortEvaluator, EngineConfig::default());
    let err = engine
        .get_b(&scene, &[a], &[Observer::points(vec![[0.0, 0.0, 5.0]; 3])])
        .unwrap_err();
    assert!(matches!(err, FieldError::BadInputShape(_)), "{err}");
}

#[test]
fn rotated_sensor_reports_in_its_own_frame() {
    let (mut scene, a, _) = two_magnets();
    let p = [0.8, -0.4, 1.7];
    let world = get_b(&scene, &[a], &[Observer::point(p)]).unwrap();

    let r = Rotation::from_rotvec([0.3, 1.2, -0.5]);
    let s = scene.add_sensor(Sensor::new(p).oriented(r));
    let local = get_b(&scene, &[a], &[s.into()]).unwrap();

    let expected = r.apply_inverse([world[&[0][..]], world[&[1][..]], world[&[2][..]]]);
    for i in 0..3 {
        assert_relative_eq!(local[&[i][..]], expected[i], epsilon = 1e-10);
    }
}

#[test]
fn sensor_rotating_along_its_path_is_rotated_per_step() {
    let (mut scene, a, _) = two_magnets();
    let p = [0.0, 0.0, 2.0];
    let world = get_b(&scene, &[a], &[Observer::point(p)]).unwrap();

    let s = scene.add_sensor(Sensor::new(p));
    scene
        .sensor_mut(s)
        .unwrap()
        .path
        .rotate_from_angax(180.0, [1.0, 0.0, 0.0], None, 2, true)
        .unwrap();
    let out = get_b(&scene, &[a], &[s.into()]).unwrap();
    assert_eq!(out.shape(), &[3, 3]);
    // step 1: after 90 deg about x, world z reads as local +y
    assert_relative_eq!(out[&[1, 1][..]], world[&[2][..]], epsilon = 1e-9);
    // step 2: 180 deg about x flips z
    assert_relative_eq!(out[&[2, 2][..]], -world[&[2][..]], epsilon = 1e-9);
    assert_relative_eq!(out[&[0, 2][..]], world[&[2][..]], epsilon = 1e-12);
}

#[test]
fn evaluation_does_not_mutate_the_scene() {
    let (mut scene, a, b) = two_magnets();
    scene.move_by(b, [0.0, 1.0, 0.0], 3).unwrap();
    let s = scene.add_sensor(Sensor::new([0.0, 0.0, 4.0]));
    let before = scene.clone();
    get_b(&scene, &[a, b], &[s.into()]).unwrap();
    assert_eq!(scene, before);
}

#[test]
fn empty_collection_contributes_zeros() {
    let (mut scene, a, _) = two_magnets();
    let empty = scene.add_collection(&[]).unwrap();
    let out = compute_field(
        &scene,
        FieldKind::B,
        &[a, empty.into()],
        &[Observer::point([1.0, 1.0, 1.0])],
        EvalOptions::default(),
    )
    .unwrap();
    assert_eq!(out.shape(), &[2, 3]);
    assert!(out.index_axis(Axis(0), 1).iter().all(|&v| v == 0.0));
    assert!(out.index_axis(Axis(0), 0).iter().any(|&v| v != 0.0));
}

#[test]
fn shared_source_counts_once_per_entry() {
    let (mut scene, a, b) = two_magnets();
    let inner = scene.add_collection(&[a, b]).unwrap();
    let outer = scene.add_collection(&[a, inner.into()]).unwrap();
    let obs = [Observer::point([0.5, 1.5, 2.0])];
    let both = get_b(&scene, &[inner.into()], &obs).unwrap();
    let nested = get_b(&scene, &[outer.into()], &obs).unwrap();
    assert_eq!(both, nested);

    // the same source may still appear in several top-level entries
    let twice = get_b(&scene, &[a, inner.into()], &obs).unwrap();
    assert_eq!(twice.shape(), &[2, 3]);
}

#[test]
fn h_and_b_differ_by_mu0_outside_magnets() {
    let (scene, a, b) = two_magnets();
    let obs = [Observer::point([2.0, -1.0, 3.0])];
    let bf = get_b(&scene, &[a, b], &obs).unwrap();
    let hf = compute_field(&scene, FieldKind::H, &[a, b], &obs, EvalOptions::default()).unwrap();
    for (x, y) in bf.iter().zip(hf.iter()) {
        assert_relative_eq!(*y, x * magstat::params::B_TO_H, epsilon = 1e-12);
    }
}

#[test]
fn scenes_with_malformed_pixel_grids_do_not_load() {
    let scene_json = |second: &str| {
        format!(
            r#"{{"sources":[{{"kind":{{"type":"dipole","moment":[0,0,1]}}}}],"collections":[],
                "sensors":[{{"pixels":{{"shape":[2],"offsets":[[0,0,2],[0,0,3]]}}}},
                           {{"pixels":{{"shape":[2],"offsets":{second}}}}}]}}"#
        )
    };

    let bad = scene_json("[[1,0,2],[1,0,3],[1,0,4]]");
    assert!(serde_json::from_str::<Scene>(&bad).is_err());

    let good = scene_json("[[1,0,2],[1,0,3]]");
    let scene: Scene = serde_json::from_str(&good).unwrap();
    let out = get_b(
        &scene,
        &[magstat::SourceId(0).into()],
        &[magstat::SensorId(0).into(), magstat::SensorId(1).into()],
    )
    .unwrap();
    assert_eq!(out.shape(), &[2, 2, 3]);
}

#[test]
fn rotating_a_sensor_forth_and_back_restores_its_reading() {
    let (mut scene, a, b) = two_magnets();
    let grid = PixelGrid::line(vec![[0.0; 3], [0.2, -0.1, 0.0], [0.0, 0.3, 0.1]]);
    let s = scene.add_sensor(Sensor::new([1.5, -0.5, 2.0]).with_pixels(grid));
    let before = get_b(&scene, &[a, b], &[s.into()]).unwrap();

    let anchor = Some([0.2, 0.4, -1.0]);
    let path = &mut scene.sensor_mut(s).unwrap().path;
    path.rotate_from_angax(73.0, [1.0, -2.0, 0.5], anchor, -1, true).unwrap();
    let turned = get_b(&scene, &[a, b], &[s.into()]).unwrap();
    assert!(
        before.iter().zip(turned.iter()).any(|(x, y)| (x - y).abs() > 1e-3),
        "rotation should change the reading"
    );

    let path = &mut scene.sensor_mut(s).unwrap().path;
    path.rotate_from_angax(-73.0, [1.0, -2.0, 0.5], anchor, -1, true).unwrap();
    let after = get_b(&scene, &[a, b], &[s.into()]).unwrap();
    assert_eq!(before.shape(), after.shape());
    for (x, y) in before.iter().zip(after.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-12);
    }
}

#[test]
fn engine_rejects_an_invalid_run_config() {
    let mut cfg = RunConfig::default();
    cfg.analytic.cylinder_nodes = 0;
    assert!(Engine::from_config(&cfg).is_err());

    cfg.analytic.cylinder_nodes = 16;
    let engine = Engine::from_config(&cfg).unwrap();
    let mut scene = Scene::new();
    let cyl = scene.add_source(Source::cylinder([300.0, 0.0, 0.0], 2.0, 1.0));
    let b = engine.get_b(&scene, &[cyl.into()], &[Observer::point([1.5, 0.5, 0.2])]).unwrap();
    assert!(b.iter().all(|v| v.is_finite()));
}
