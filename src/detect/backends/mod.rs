pub mod replay;
pub mod simulated;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use replay::ReplayBackend;
pub use simulated::SimulatedBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
