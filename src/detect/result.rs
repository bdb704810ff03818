use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Axis-aligned vehicle box in pixel coordinates, `x1 < x2` and `y1 < y2`.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct VehicleBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl VehicleBox {
    /// Returns `None` for empty or inverted boxes.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    /// Build from detector float coordinates, truncating toward zero.
    pub fn from_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    /// Integer midpoint, `((x1 + x2) // 2, (y1 + y2) // 2)` with floor division.
    pub fn center(&self) -> Point {
        let mid = |a: i32, b: i32| (i64::from(a) + i64::from(b)).div_euclid(2) as i32;
        Point::new(mid(self.x1, self.x2), mid(self.y1, self.y2))
    }

    pub fn area(&self) -> i64 {
        (i64::from(self.x2) - i64::from(self.x1)) * (i64::from(self.y2) - i64::from(self.y1))
    }

    pub fn iou(&self, other: &VehicleBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }
        let intersection = (i64::from(ix2) - i64::from(ix1)) * (i64::from(iy2) - i64::from(iy1));
        let union = self.area() + other.area() - intersection;
        intersection as f32 / union as f32
    }
}

impl TryFrom<[i32; 4]> for VehicleBox {
    type Error = String;

    fn try_from([x1, y1, x2, y2]: [i32; 4]) -> Result<Self, Self::Error> {
        Self::new(x1, y1, x2, y2).ok_or_else(|| {
            format!(
                "vehicle box [{}, {}, {}, {}] must satisfy x1 < x2 and y1 < y2",
                x1, y1, x2, y2
            )
        })
    }
}

impl From<VehicleBox> for [i32; 4] {
    fn from(b: VehicleBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Object classes a detector may report. COCO ids map onto these.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Person,
    Car,
    Motorcycle,
    Bus,
    Truck,
    Unknown,
}

impl ObjectClass {
    pub fn from_coco_id(id: usize) -> Self {
        match id {
            0 => ObjectClass::Person,
            2 => ObjectClass::Car,
            3 => ObjectClass::Motorcycle,
            5 => ObjectClass::Bus,
            7 => ObjectClass::Truck,
            _ => ObjectClass::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: VehicleBox,
    pub confidence: f32,
    pub class: ObjectClass,
}

/// Result of running detection on one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// Detections whose class is in `classes`, in detector order.
    pub fn retain_classes(self, classes: &[ObjectClass]) -> Vec<Detection> {
        self.detections
            .into_iter()
            .filter(|d| classes.contains(&d.class))
            .collect()
    }
}
