mod backend;
mod backends;
mod registry;
mod result;
pub mod yolo;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{ReplayBackend, SimulatedBackend};
pub use registry::BackendRegistry;
pub use result::{Detection, DetectionResult, ObjectClass, VehicleBox};
