// src/bin/dipole_limit.rs
//
// Developer diagnostic: far-field convergence of the magnet families.
//
// A cuboid, a cylinder and a sphere of equal volume and magnetization are
// evaluated at increasing distance and compared with the point dipole of the
// same moment. The relative deviation should fall off roughly like (size/r)^2
// and stay near machine precision once the far-field quadrature takes over.
//
// This tool:
//   - prints results to stdout only
//   - does NOT write files
//
// Usage examples:
//   cargo run --bin dipole_limit
//   cargo run --bin dipole_limit -- 111 222 333

use std::f64::consts::PI;

use magstat::vec3;
use magstat::{get_b, logging, Member, Observer, Scene, Source};

fn rel_err(a: &[f64], b: &[f64]) -> f64 {
    let num: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    let den: f64 = b.iter().map(|y| y * y).sum();
    (num / den).sqrt()
}

fn main() -> Result<(), magstat::FieldError> {
    logging::init();
    let args: Vec<String> = std::env::args().collect();

    let mag = if args.len() == 4 {
        [
            args[1].parse::<f64>().expect("mx"),
            args[2].parse::<f64>().expect("my"),
            args[3].parse::<f64>().expect("mz"),
        ]
    } else {
        [111.0, 222.0, 333.0]
    };

    // unit volume for every body
    let mut scene = Scene::new();
    let cuboid = scene.add_source(Source::cuboid(mag, [1.0, 1.0, 1.0]));
    let cylinder = scene.add_source(Source::cylinder(mag, (4.0 / PI).sqrt(), 1.0));
    let sphere = scene.add_source(Source::sphere(mag, (6.0 / PI).cbrt()));
    let dipole = scene.add_source(Source::dipole(mag));
    let magnets: [Member; 3] = [cuboid.into(), cylinder.into(), sphere.into()];

    let dir = vec3::normalize([123.4, -23.4, 34.5]).unwrap_or([0.0, 0.0, 1.0]);
    println!("M = {:?} mT, direction {:.3?}", mag, dir);
    println!("{:>10} {:>14} {:>14} {:>14}", "r [mm]", "cuboid", "cylinder", "sphere");

    for r in [2.0, 5.0, 10.0, 20.0, 50.0, 125.0, 500.0, 2000.0] {
        let obs = [Observer::point(vec3::scale(dir, r))];
        let reference = get_b(&scene, &[dipole.into()], &obs)?;
        let b = get_b(&scene, &magnets, &obs)?;
        let reference = reference.as_slice().unwrap_or_default();
        let errs: Vec<f64> = b
            .outer_iter()
            .map(|row| rel_err(&row.iter().copied().collect::<Vec<f64>>(), reference))
            .collect();
        println!(
            "{:>10.1} {:>14.3e} {:>14.3e} {:>14.3e}",
            r, errs[0], errs[1], errs[2]
        );
    }
    Ok(())
}
