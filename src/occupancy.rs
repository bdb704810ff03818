//! Occupancy classifier.
//!
//! A slot is occupied iff the integer center of at least one vehicle box lies
//! inside or on the boundary of the slot polygon. Overlap area and IoU play no
//! part. Each slot is decided independently, so a vehicle whose center falls
//! in a gap between slots occupies none of them.

use serde::Serialize;

use crate::detect::VehicleBox;
use crate::geometry::{Point, PolygonRole};
use crate::summary::FrameSummary;
use crate::zone::ZoneModel;
use crate::OccupancyError;

/// Occupancy of one slot in one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotState {
    /// 1-based slot index.
    pub index: usize,
    pub occupied: bool,
    /// Where a renderer should place the slot marker (centroid or first vertex).
    pub reference_point: Point,
}

/// Everything the classifier derives for one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    pub slots: Vec<SlotState>,
    pub summary: FrameSummary,
}

impl FrameReport {
    pub fn slot(&self, index: usize) -> Option<&SlotState> {
        index.checked_sub(1).and_then(|i| self.slots.get(i))
    }
}

/// Classify every slot, in ascending index order.
///
/// Fails on the first slot whose polygon has fewer than 3 points. An empty
/// `vehicles` slice is valid and leaves every slot empty.
pub fn classify_slots(
    model: &ZoneModel,
    vehicles: &[VehicleBox],
) -> Result<Vec<SlotState>, OccupancyError> {
    let centers: Vec<Point> = vehicles.iter().map(VehicleBox::center).collect();
    model
        .iter_slots()
        .map(|(index, polygon)| {
            polygon.ensure_valid(PolygonRole::Slot(index))?;
            Ok(SlotState {
                index,
                occupied: centers.iter().any(|&c| polygon.contains(c)),
                // A valid polygon always has a first vertex.
                reference_point: polygon.reference_point().unwrap_or_default(),
            })
        })
        .collect()
}

/// Classify a frame and aggregate the result.
pub fn classify(model: &ZoneModel, vehicles: &[VehicleBox]) -> Result<FrameReport, OccupancyError> {
    let slots = classify_slots(model, vehicles)?;
    let summary = FrameSummary::from_states(&slots);
    Ok(FrameReport { slots, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn vbox(x1: i32, y1: i32, x2: i32, y2: i32) -> VehicleBox {
        VehicleBox::new(x1, y1, x2, y2).unwrap()
    }

    fn square_model() -> ZoneModel {
        ZoneModel::new(
            vec![Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10), (0, 10)])],
            None,
        )
    }

    fn row_of_slots(n: i32) -> ZoneModel {
        let slots = (0..n)
            .map(|i| {
                let x = i * 20;
                Polygon::from_pairs(&[(x, 0), (x + 10, 0), (x + 10, 10), (x, 10)])
            })
            .collect();
        ZoneModel::new(slots, None)
    }

    #[test]
    fn vehicle_center_inside_square_occupies_it() {
        let report = classify(&square_model(), &[vbox(4, 4, 6, 6)]).unwrap();
        assert!(report.slots[0].occupied);
        assert_eq!(report.slots[0].reference_point, Point::new(5, 5));
        assert!(report.summary.empty_slots.is_empty());
    }

    #[test]
    fn vehicle_center_outside_leaves_slot_empty() {
        let report = classify(&square_model(), &[vbox(20, 20, 30, 30)]).unwrap();
        assert!(!report.slots[0].occupied);
        assert_eq!(report.summary.empty_slots, vec![1]);
    }

    #[test]
    fn center_on_edge_counts_as_occupied() {
        // Center (10, 5) lies on the right edge.
        let report = classify(&square_model(), &[vbox(8, 3, 12, 7)]).unwrap();
        assert!(report.slots[0].occupied);
    }

    #[test]
    fn box_overlap_without_center_containment_is_not_occupancy() {
        // Box covers most of the slot, but its center (14, 5) is outside.
        let report = classify(&square_model(), &[vbox(2, 0, 26, 10)]).unwrap();
        assert!(!report.slots[0].occupied);
    }

    #[test]
    fn no_vehicles_means_every_slot_empty() {
        let report = classify(&row_of_slots(3), &[]).unwrap();
        assert_eq!(report.summary.occupied, 0);
        assert_eq!(report.summary.empty, 3);
        assert_eq!(report.summary.empty_slots, vec![1, 2, 3]);
    }

    #[test]
    fn vehicle_in_gap_occupies_nothing() {
        // Center (15, 5) sits between slot 1 (0..10) and slot 2 (20..30).
        let report = classify(&row_of_slots(2), &[vbox(11, 2, 19, 8)]).unwrap();
        assert!(report.slots.iter().all(|s| !s.occupied));
    }

    #[test]
    fn several_vehicles_in_one_slot_still_one_occupied() {
        let vehicles = [vbox(1, 1, 3, 3), vbox(5, 5, 7, 7), vbox(41, 1, 49, 9)];
        let report = classify(&row_of_slots(3), &vehicles).unwrap();
        let occupied: Vec<usize> = report
            .slots
            .iter()
            .filter(|s| s.occupied)
            .map(|s| s.index)
            .collect();
        assert_eq!(occupied, vec![1, 3]);
        assert_eq!(report.summary.occupied, 2);
    }

    #[test]
    fn short_slot_polygon_fails_fast() {
        let model = ZoneModel::new(
            vec![
                Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10)]),
                Polygon::from_pairs(&[(0, 0), (10, 0)]),
            ],
            None,
        );
        assert_eq!(
            classify(&model, &[]),
            Err(OccupancyError::InvalidPolygon {
                role: PolygonRole::Slot(2),
                points: 2
            })
        );
    }

    #[test]
    fn degenerate_slot_marks_first_vertex() {
        let model = ZoneModel::new(vec![Polygon::from_pairs(&[(3, 4), (6, 8), (9, 12)])], None);
        let report = classify(&model, &[]).unwrap();
        assert_eq!(report.slots[0].reference_point, Point::new(3, 4));
    }

    #[test]
    fn multi_million_pixel_slot_classifies() {
        let model = ZoneModel::new(
            vec![Polygon::from_pairs(&[
                (0, 0),
                (3_000_000, 0),
                (3_000_000, 3_000_000),
                (0, 3_000_000),
            ])],
            None,
        );
        let report = classify(&model, &[vbox(10, 10, 20, 20)]).unwrap();
        assert!(report.slots[0].occupied);
        assert_eq!(
            report.slots[0].reference_point,
            Point::new(1_500_000, 1_500_000)
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let model = row_of_slots(4);
        let vehicles = [vbox(0, 0, 8, 8), vbox(60, 2, 68, 6)];
        let first = classify(&model, &vehicles).unwrap();
        let second = classify(&model, &vehicles).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn report_slot_lookup_is_one_based() {
        let report = classify(&row_of_slots(2), &[vbox(20, 0, 30, 10)]).unwrap();
        assert_eq!(report.slot(2).map(|s| s.occupied), Some(true));
        assert!(report.slot(0).is_none());
        assert!(report.slot(3).is_none());
    }
}
