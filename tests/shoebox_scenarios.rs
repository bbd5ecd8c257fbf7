use anyhow::Result;
use ra::sim::rays::{RayMode, Termination};
use ra::{
    AirProperties, AlgorithmControls, CaptureRadius, Point, RayDirections, Receiver,
    RoomGeometry, Simulation, SimulationConfig, Source, Vector,
};

const C0: f64 = 343.0;

fn controls(ht_length: f64, allow_growth: bool) -> AlgorithmControls {
    let mut c = AlgorithmControls::new();
    c.freq = vec![500.0, 2000.0];
    c.ht_length = ht_length;
    c.allow_scattering = false;
    c.allow_growth = allow_growth;
    c
}

/// 6 x 4 x 3 m room, source in the center, receiver near a corner.
fn center_to_corner(
    absorption: f64,
    radius: CaptureRadius,
    n_rays: usize,
    ht_length: f64,
) -> Result<Simulation> {
    let room = RoomGeometry::shoebox(6.0, 4.0, 3.0, vec![absorption; 2], vec![0.0; 2])?;
    let air = AirProperties::new(C0, 1.21, vec![0.0; 2])?;
    let sources = vec![Source::omni(Point::new(3.0, 2.0, 1.5), 100.0, 2)?];
    let receivers = vec![Receiver::new(Point::new(5.5, 3.5, 2.5), Vector::zero(), radius)?];
    Ok(Simulation::from_parts(
        room,
        air,
        sources,
        receivers,
        RayDirections::isotropic(n_rays)?,
        &controls(ht_length, radius.allow_growth),
    )?)
}

#[test]
fn test_room_aggregates() -> Result<()> {
    let room = RoomGeometry::shoebox(6.0, 4.0, 3.0, vec![0.0], vec![0.0])?;
    assert_eq!(room.planes().len(), 6);
    assert!((room.volume() - 72.0).abs() < 1e-9);
    assert!((room.total_area() - 108.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_direct_time_is_distance_over_speed() -> Result<()> {
    let sim = center_to_corner(0.0, CaptureRadius::fixed(0.3), 100, 0.05)?;
    let result = sim.run();
    let d = result.direct(0, 0).expect("line of sight is clear");
    let distance = Point::new(3.0, 2.0, 1.5).distance(&Point::new(5.5, 3.5, 2.5));
    assert_eq!(d.distance, distance);
    assert_eq!(d.time, distance / C0);
    assert_eq!(d.hits, 1);
    Ok(())
}

#[test]
fn test_first_order_energy_below_direct() -> Result<()> {
    let sim = center_to_corner(0.0, CaptureRadius::fixed(0.3), 20_000, 0.05)?;
    let result = sim.run();
    let direct = result.direct(0, 0).expect("line of sight is clear");
    let arrivals = result.arrivals(0, 0);
    let first_order: Vec<_> = arrivals.iter().filter(|a| a.order == 1).collect();
    assert!(!first_order.is_empty());
    for band in 0..2 {
        let reflected: f64 = first_order.iter().map(|a| a.intensity[band]).sum();
        assert!(
            reflected < direct.intensity[band],
            "band {band}: first order {reflected} >= direct {}",
            direct.intensity[band]
        );
    }
    // Each first-order arrival comes later than the direct sound
    assert!(first_order.iter().all(|a| a.time > direct.time));
    Ok(())
}

#[test]
fn test_full_absorption_leaves_only_direct_energy() -> Result<()> {
    let sim = center_to_corner(1.0, CaptureRadius::growing(0.2, 1.0, 0.3), 2000, 0.3)?;
    let result = sim.run();
    assert!(result.direct(0, 0).is_some_and(|d| d.intensity.iter().all(|i| *i > 0.0)));
    let arrivals = result.arrivals(0, 0);
    assert!(!arrivals.is_empty());
    for a in &arrivals {
        assert!(a.order >= 1);
        assert!(a.intensity.iter().all(|i| *i == 0.0), "{a:?}");
    }
    Ok(())
}

#[test]
fn test_fixed_radius_is_constant() -> Result<()> {
    let sim = center_to_corner(0.1, CaptureRadius::fixed(0.35), 1000, 0.2)?;
    let result = sim.run();
    let mut n = 0;
    let total = result.num_crossings();
    for trace in &result.traces {
        for c in &trace.crossings {
            assert_eq!(c.radius, 0.35);
            n += 1;
        }
    }
    assert!(n > 0);
    assert_eq!(n, total);
    Ok(())
}

#[test]
fn test_radius_follows_growth_law() -> Result<()> {
    let radius = CaptureRadius::growing(0.1, 0.9, 0.2);
    let sim = center_to_corner(0.1, radius, 1000, 0.2)?;
    let result = sim.run();
    let receiver = &sim.receivers()[0];
    let mut radii = Vec::new();
    for trace in &result.traces {
        for c in &trace.crossings {
            assert!((c.radius - receiver.radius_at(c.time)).abs() < 1e-12);
            radii.push(c.radius);
        }
    }
    assert!(radii.iter().any(|r| *r > 0.5));
    Ok(())
}

#[test]
fn test_termination_bounds() -> Result<()> {
    let mut ctrl = controls(0.4, true);
    ctrl.allow_scattering = true;
    ctrl.transition_order = 2;
    ctrl.seed = 17;
    let room = RoomGeometry::shoebox(8.0, 6.0, 3.5, vec![0.05; 2], vec![0.4; 2])?;
    let air = AirProperties::new(C0, 1.21, vec![0.0; 2])?;
    let sources = vec![
        Source::omni(Point::new(2.0, 2.0, 1.2), 90.0, 2)?,
        Source::omni(Point::new(6.0, 4.0, 1.8), 95.0, 2)?,
    ];
    let receivers = vec![Receiver::new(
        Point::new(4.0, 3.0, 1.5),
        Vector::zero(),
        ctrl.capture_radius(),
    )?];
    let sim = Simulation::from_parts(
        room,
        air,
        sources,
        receivers,
        RayDirections::random(300, 5)?,
        &ctrl,
    )?;
    let result = sim.run();
    assert_eq!(result.traces.len(), 600);
    for t in &result.traces {
        assert!(t.elapsed <= 0.4);
        assert!(t.order() <= result.max_reflection_order);
        assert_eq!(t.planes.len(), t.points.len());
        assert_ne!(t.termination, Termination::Degenerate);
        // Consecutive reflections never hit the same plane twice in a row
        for w in t.planes.windows(2) {
            assert_ne!(w[0], w[1]);
        }
        for c in &t.crossings {
            assert!(c.time <= t.elapsed + 1e-12);
            assert!(c.order <= t.order());
        }
    }
    // Same seed, same output
    assert_eq!(sim.run().traces, result.traces);
    Ok(())
}

#[test]
fn test_run_from_json_config() -> Result<()> {
    let json = r#"{
        "controls": {"freq": [1000.0], "n_rays": 500, "ht_length": 0.2, "seed": 1},
        "air": {"temperature": 20.0, "hr": 50.0, "p_atm": 101325.0},
        "geometry": {"planes": [
            {"name": "floor", "vertices": [[0,0,0],[0,4,0],[6,4,0],[6,0,0]], "alpha": [0.1], "s": [0.2]},
            {"name": "ceiling", "vertices": [[0,0,3],[6,0,3],[6,4,3],[0,4,3]], "alpha": [0.3], "s": [0.2]},
            {"name": "south", "vertices": [[0,0,0],[6,0,0],[6,0,3],[0,0,3]], "alpha": [0.05], "s": [0.2]},
            {"name": "north", "vertices": [[0,4,0],[0,4,3],[6,4,3],[6,4,0]], "alpha": [0.05], "s": [0.2]},
            {"name": "west", "vertices": [[0,0,0],[0,0,3],[0,4,3],[0,4,0]], "alpha": [0.05], "s": [0.2]},
            {"name": "east", "vertices": [[6,0,0],[6,4,0],[6,4,3],[6,0,3]], "alpha": [0.05], "s": [0.2]}
        ]},
        "sources": [{"coord": [1.0, 1.0, 1.5], "power_dB": [94.0], "delay": 2.0}],
        "receivers": [{"coord": [5.0, 3.0, 1.2], "point_to_source": 0}]
    }"#;
    let config = SimulationConfig::from_json_str(json)?;
    let sim = Simulation::new(&config)?;
    let result = sim.run();
    assert_eq!(result.delays, vec![0.002]);
    let direct = result.direct(0, 0).expect("line of sight is clear");
    assert!((direct.cos - 1.0).abs() < 1e-12);
    assert!((direct.time - direct.distance / sim.air().c0).abs() < 1e-15);
    assert!(!result.arrivals(0, 0).is_empty());
    Ok(())
}

#[test]
fn test_single_ray_mode() -> Result<()> {
    let mut config = SimulationConfig::new();
    config.controls = controls(0.1, false);
    config.controls.ray_mode = RayMode::Single {
        direction: [1.0, 0.0, 0.0],
    };
    config.controls.freq = vec![1000.0];
    config.air = ra::sim::rays::AirConfig::Explicit {
        c0: C0,
        rho0: 1.21,
        m: vec![0.0],
    };
    let room = RoomGeometry::shoebox(10.0, 4.0, 3.0, vec![0.0], vec![0.0])?;
    config.geometry.planes = room
        .planes()
        .iter()
        .map(|p| ra::sim::rays::PlaneConfig {
            name: p.name.clone(),
            vertices: p.vertices().iter().map(|v| [v.x, v.y, v.z]).collect(),
            normal: None,
            alpha: vec![0.0],
            s: vec![0.0],
        })
        .collect();
    config.sources = vec![ra::sim::rays::SourceConfig {
        coord: [2.0, 2.0, 1.5],
        orientation: [0.0; 3],
        power_db: vec![100.0],
        eq_db: vec![],
        delay: 0.0,
    }];
    config.receivers = vec![ra::sim::rays::ReceiverConfig {
        coord: [6.0, 2.0, 1.5],
        orientation: [0.0; 3],
        point_to_source: None,
    }];

    let sim = Simulation::new(&config)?;
    let result = sim.run();
    assert_eq!(result.num_rays, 1);
    let arrivals = result.arrivals(0, 0);
    // Back from the east wall, from the west wall, from the east wall again.
    // The next pass would be at 48 m, beyond the 34.3 m history.
    let expected = [(12.0, 1), (24.0, 2), (32.0, 3)];
    assert_eq!(arrivals.len(), expected.len());
    for (a, (d, order)) in arrivals.iter().zip(expected) {
        assert!((a.time - d / C0).abs() < 1e-12);
        assert_eq!(a.order, order);
    }
    Ok(())
}

#[test]
fn test_demo_config_is_valid() -> Result<()> {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/shoebox.json");
    let config = SimulationConfig::from_json_file(&path)?;
    config.validate()?;
    let room = config.build_geometry()?;
    assert!((room.volume() - 144.0).abs() < 1e-9);
    let sim = Simulation::new(&config)?;
    assert_eq!(sim.directions().len(), 2000);
    assert_eq!(sim.receivers().len(), 2);
    Ok(())
}
