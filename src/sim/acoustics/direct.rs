use crate::geom::T_MIN;
use crate::sim::acoustics::receiver::Receiver;
use crate::sim::acoustics::source::Source;
use crate::sim::engine::FlatScene;
use crate::sim::engine::absorption::AirAbsorption;

/// Unobstructed path from a source to a receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectSound {
    /// Arrival time after emission [s].
    pub time: f64,
    /// Source to receiver distance [m].
    pub distance: f64,
    pub hits: usize,
    pub cos: f64,
    /// Intensity per band [W/m^2]. Empty until the intensity pass has run.
    pub intensity: Vec<f64>,
}

/// Evaluates the direct path between one source and one receiver.
///
/// Returns `None` when a plane blocks the line of sight or when source and
/// receiver coincide.
pub fn direct_sound(
    scene: &FlatScene,
    source: &Source,
    receiver: &Receiver,
    c0: f64,
) -> Option<DirectSound> {
    let distance = source.position.distance(&receiver.position);
    if !(distance.is_finite() && distance > T_MIN) {
        return None;
    }
    if scene.is_segment_blocked(source.position, receiver.position) {
        return None;
    }
    let travel = receiver.position - source.position;
    Some(DirectSound {
        time: distance / c0,
        distance,
        hits: 1,
        cos: receiver.arrival_cosine(travel),
        intensity: Vec::new(),
    })
}

/// Direct sound for every source-receiver pair, indexed `source * receivers.len() + receiver`.
pub fn direct_sound_all(
    scene: &FlatScene,
    sources: &[Source],
    receivers: &[Receiver],
    c0: f64,
) -> Vec<Option<DirectSound>> {
    sources
        .iter()
        .flat_map(|s| receivers.iter().map(move |r| direct_sound(scene, s, r, c0)))
        .collect()
}

/// Direct intensity per band: `W * exp(-m d) / (4 pi d^2)`.
pub fn direct_intensity(power: &[f64], air: &AirAbsorption, distance: f64) -> Vec<f64> {
    let spreading = 4.0 * std::f64::consts::PI * distance * distance;
    power
        .iter()
        .zip(air.apply_distance(distance))
        .map(|(w, a)| w * a / spreading)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::room::{Plane, RoomGeometry};
    use crate::sim::acoustics::receiver::CaptureRadius;
    use crate::{Point, Vector};
    use anyhow::Result;

    fn receiver(p: Point) -> Result<Receiver> {
        Ok(Receiver::new(p, Vector::zero(), CaptureRadius::fixed(0.1))?)
    }

    #[test]
    fn test_direct_in_shoebox() -> Result<()> {
        let room = RoomGeometry::shoebox(6.0, 5.0, 3.0, vec![0.2], vec![0.0])?;
        let scene = FlatScene::new(&room);
        let src = Source::omni(Point::new(1.0, 0.5, 1.5), 90.0, 1)?;
        let rec = receiver(Point::new(4.0, 4.5, 1.5))?;
        let d = direct_sound(&scene, &src, &rec, 343.0).unwrap();
        assert!((d.distance - 5.0).abs() < 1e-12);
        assert!((d.time - 5.0 / 343.0).abs() < 1e-15);
        assert_eq!(d.hits, 1);
        assert_eq!(d.cos, 1.0);
        Ok(())
    }

    #[test]
    fn test_direct_cosine_uses_orientation() -> Result<()> {
        let room = RoomGeometry::shoebox(6.0, 4.0, 3.0, vec![0.2], vec![0.0])?;
        let scene = FlatScene::new(&room);
        let src = Source::omni(Point::new(1.0, 2.0, 1.5), 90.0, 1)?;
        let rec = receiver(Point::new(5.0, 2.0, 1.5))?.point_to(src.position);
        let d = direct_sound(&scene, &src, &rec, 343.0).unwrap();
        assert!((d.cos - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_blocked_line_of_sight() -> Result<()> {
        // L-shaped room: floor and ceiling are L-shaped hexagons
        let l = [
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 2.0),
            (2.0, 2.0),
            (2.0, 4.0),
            (0.0, 4.0),
        ];
        let h = 3.0;
        let mut planes = Vec::new();
        let floor: Vec<Point> = l.iter().rev().map(|&(x, y)| Point::new(x, y, 0.0)).collect();
        let ceiling: Vec<Point> = l.iter().map(|&(x, y)| Point::new(x, y, h)).collect();
        planes.push(Plane::new("floor", floor, None, vec![0.1], vec![0.0])?);
        planes.push(Plane::new("ceiling", ceiling, None, vec![0.1], vec![0.0])?);
        for i in 0..l.len() {
            let (x0, y0) = l[i];
            let (x1, y1) = l[(i + 1) % l.len()];
            let wall = vec![
                Point::new(x0, y0, 0.0),
                Point::new(x1, y1, 0.0),
                Point::new(x1, y1, h),
                Point::new(x0, y0, h),
            ];
            planes.push(Plane::new(&format!("wall_{i}"), wall, None, vec![0.1], vec![0.0])?);
        }
        let room = RoomGeometry::new(planes)?;
        assert!((room.volume() - 36.0).abs() < 1e-9);

        let scene = FlatScene::new(&room);
        let src = Source::omni(Point::new(3.5, 1.0, 1.5), 90.0, 1)?;
        let around_corner = receiver(Point::new(1.0, 3.5, 1.5))?;
        let visible = receiver(Point::new(1.0, 1.0, 1.5))?;
        let results = direct_sound_all(&scene, &[src], &[around_corner, visible], 343.0);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_none());
        assert!(results[1].is_some());
        Ok(())
    }

    #[test]
    fn test_coincident_source_and_receiver() -> Result<()> {
        let room = RoomGeometry::shoebox(6.0, 4.0, 3.0, vec![0.2], vec![0.0])?;
        let scene = FlatScene::new(&room);
        let p = Point::new(1.0, 1.0, 1.0);
        let src = Source::omni(p, 90.0, 1)?;
        assert!(direct_sound(&scene, &src, &receiver(p)?, 343.0).is_none());
        Ok(())
    }

    #[test]
    fn test_direct_intensity_inverse_square() {
        let air = AirAbsorption::none(2);
        let i1 = direct_intensity(&[1.0, 2.0], &air, 1.0);
        let i2 = direct_intensity(&[1.0, 2.0], &air, 2.0);
        assert!((i1[0] - 1.0 / (4.0 * std::f64::consts::PI)).abs() < 1e-12);
        assert!((i1[1] / i1[0] - 2.0).abs() < 1e-12);
        assert!((i1[0] / i2[0] - 4.0).abs() < 1e-12);
    }
}
