use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult, ObjectClass, VehicleBox};
use crate::frame::MaskedFrame;
use crate::geometry::Point;

const CAR_HALF_WIDTH: i32 = 20;
const CAR_HALF_HEIGHT: i32 = 14;
const JITTER_PX: i32 = 3;

/// Synthetic detector for demo runs without a model.
///
/// Each frame, every spot independently holds a car with probability
/// `occupancy_probability`. Cars are jittered by a few pixels around the spot.
/// Seeded, so a given seed replays the same sequence.
pub struct SimulatedBackend {
    spots: Vec<Point>,
    occupancy_probability: f64,
    rng: StdRng,
}

impl SimulatedBackend {
    pub fn new(spots: Vec<Point>, occupancy_probability: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&occupancy_probability) {
            return Err(anyhow!(
                "occupancy probability must be within 0..=1, got {}",
                occupancy_probability
            ));
        }
        Ok(Self {
            spots,
            occupancy_probability,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl DetectorBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn detect(&mut self, frame: &MaskedFrame<'_>) -> Result<DetectionResult> {
        let mut detections = Vec::new();
        for spot in &self.spots {
            if !self.rng.gen_bool(self.occupancy_probability) {
                continue;
            }
            let cx = spot.x + self.rng.gen_range(-JITTER_PX..=JITTER_PX);
            let cy = spot.y + self.rng.gen_range(-JITTER_PX..=JITTER_PX);
            let Some(bbox) = VehicleBox::new(
                cx - CAR_HALF_WIDTH,
                cy - CAR_HALF_HEIGHT,
                cx + CAR_HALF_WIDTH,
                cy + CAR_HALF_HEIGHT,
            ) else {
                continue;
            };
            if !frame.covers(bbox.center()) {
                continue;
            }
            detections.push(Detection {
                bbox,
                confidence: self.rng.gen_range(0.5..1.0),
                class: ObjectClass::Car,
            });
        }
        Ok(DetectionResult { detections })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, Mask};
    use crate::geometry::Polygon;

    fn run(backend: &mut SimulatedBackend, frames: u64) -> Vec<usize> {
        let area = Polygon::from_pairs(&[(0, 0), (199, 0), (199, 99), (0, 99)]);
        let mask = Mask::build(200, 100, &area).unwrap();
        (0..frames)
            .map(|i| {
                let frame = Frame::new(vec![0; 200 * 100 * 3], 200, 100, i).unwrap();
                let masked = frame.apply_mask(&mask).unwrap();
                backend.detect(&masked).unwrap().detections.len()
            })
            .collect()
    }

    #[test]
    fn probability_bounds_are_enforced() {
        assert!(SimulatedBackend::new(vec![], 1.5, 0).is_err());
        assert!(SimulatedBackend::new(vec![], -0.1, 0).is_err());
    }

    #[test]
    fn certain_occupancy_fills_every_visible_spot() {
        let spots = vec![Point::new(50, 50), Point::new(150, 50), Point::new(500, 50)];
        let mut backend = SimulatedBackend::new(spots, 1.0, 7).unwrap();
        // The third spot is outside the frame, so it is never reported.
        assert_eq!(run(&mut backend, 5), vec![2; 5]);
    }

    #[test]
    fn zero_probability_reports_nothing() {
        let mut backend = SimulatedBackend::new(vec![Point::new(50, 50)], 0.0, 7).unwrap();
        assert_eq!(run(&mut backend, 3), vec![0; 3]);
    }

    #[test]
    fn same_seed_same_sequence() {
        let spots = vec![Point::new(40, 40), Point::new(100, 40), Point::new(160, 40)];
        let mut a = SimulatedBackend::new(spots.clone(), 0.5, 42).unwrap();
        let mut b = SimulatedBackend::new(spots, 0.5, 42).unwrap();
        assert_eq!(run(&mut a, 20), run(&mut b, 20));
    }
}
