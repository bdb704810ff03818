//! Zone model: the ordered slot polygons plus the monitored area.

use crate::geometry::{Polygon, PolygonRole};
use crate::OccupancyError;

/// Immutable set of parking slots and the overall monitored area.
///
/// Slots are addressed by 1-based index in layout order. The model has no
/// mutating methods; build a new one to change the layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneModel {
    slots: Vec<Polygon>,
    monitored_area: Option<Polygon>,
}

impl ZoneModel {
    /// Build a model without validating polygon sizes.
    ///
    /// Invalid polygons are reported when they are used (mask build or
    /// classification). Use [`ZoneModel::validated`] or
    /// [`crate::ZoneLayout::into_zone_model`] to fail at load time instead.
    pub fn new(slots: Vec<Polygon>, monitored_area: Option<Polygon>) -> Self {
        Self {
            slots,
            monitored_area,
        }
    }

    /// Build a model, rejecting any slot or area polygon with fewer than 3 points.
    pub fn validated(
        slots: Vec<Polygon>,
        monitored_area: Option<Polygon>,
    ) -> Result<Self, OccupancyError> {
        let model = Self::new(slots, monitored_area);
        model.validate()?;
        Ok(model)
    }

    /// Check every polygon, in slot order, then the monitored area.
    pub fn validate(&self) -> Result<(), OccupancyError> {
        for (index, polygon) in self.iter_slots() {
            polygon.ensure_valid(PolygonRole::Slot(index))?;
        }
        if let Some(area) = &self.monitored_area {
            area.ensure_valid(PolygonRole::MonitoredArea)?;
        }
        Ok(())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Polygon for a 1-based slot index.
    pub fn slot_polygon(&self, index: usize) -> Result<&Polygon, OccupancyError> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .ok_or(OccupancyError::IndexOutOfRange {
                index,
                count: self.slots.len(),
            })
    }

    pub fn monitored_area_polygon(&self) -> Result<&Polygon, OccupancyError> {
        self.monitored_area
            .as_ref()
            .ok_or(OccupancyError::NotConfigured)
    }

    /// `(index, polygon)` pairs in ascending 1-based index order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, &Polygon)> + '_ {
        self.slots.iter().enumerate().map(|(i, p)| (i + 1, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_slot_model() -> ZoneModel {
        ZoneModel::new(
            vec![
                Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10), (0, 10)]),
                Polygon::from_pairs(&[(20, 0), (30, 0), (30, 10), (20, 10)]),
            ],
            Some(Polygon::from_pairs(&[(0, 0), (40, 0), (40, 20), (0, 20)])),
        )
    }

    #[test]
    fn slot_lookup_is_one_based() {
        let model = two_slot_model();
        assert_eq!(model.slot_count(), 2);
        assert_eq!(model.slot_polygon(2).unwrap().points()[0].x, 20);
        assert_eq!(
            model.slot_polygon(0),
            Err(OccupancyError::IndexOutOfRange { index: 0, count: 2 })
        );
        assert_eq!(
            model.slot_polygon(3),
            Err(OccupancyError::IndexOutOfRange { index: 3, count: 2 })
        );
    }

    #[test]
    fn missing_area_is_not_configured() {
        let model = ZoneModel::new(vec![], None);
        assert_eq!(model.slot_count(), 0);
        assert_eq!(
            model.monitored_area_polygon(),
            Err(OccupancyError::NotConfigured)
        );
    }

    #[test]
    fn validated_rejects_short_slot() {
        let err = ZoneModel::validated(
            vec![
                Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10)]),
                Polygon::from_pairs(&[(0, 0), (10, 0)]),
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            OccupancyError::InvalidPolygon {
                role: PolygonRole::Slot(2),
                points: 2
            }
        );
    }

    #[test]
    fn validated_rejects_short_area() {
        let err = ZoneModel::validated(vec![], Some(Polygon::from_pairs(&[(0, 0)]))).unwrap_err();
        assert_eq!(
            err,
            OccupancyError::InvalidPolygon {
                role: PolygonRole::MonitoredArea,
                points: 1
            }
        );
    }

    #[test]
    fn iter_slots_yields_one_based_indices() {
        let model = two_slot_model();
        let indices: Vec<usize> = model.iter_slots().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
