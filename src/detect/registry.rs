use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionResult;
use crate::frame::MaskedFrame;

use super::backend::DetectorBackend;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Warm up every registered backend.
    pub fn warm_up_all(&self) -> Result<()> {
        for (name, backend) in &self.backends {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend '{}' lock poisoned", name))?;
            guard.warm_up()?;
        }
        Ok(())
    }

    /// Run detection with the default backend.
    pub fn detect_default(&self, frame: &MaskedFrame<'_>) -> Result<DetectionResult> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(frame)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The registry itself acts as a detector that delegates to its default backend.
impl DetectorBackend for BackendRegistry {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn detect(&mut self, frame: &MaskedFrame<'_>) -> Result<DetectionResult> {
        self.detect_default(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        self.warm_up_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::{Detection, ObjectClass, VehicleBox};
    use crate::frame::{Frame, Mask};
    use crate::geometry::Polygon;

    struct Fixed(&'static str, usize);

    impl DetectorBackend for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn detect(&mut self, _frame: &MaskedFrame<'_>) -> Result<DetectionResult> {
            let detection = Detection {
                bbox: VehicleBox::new(0, 0, 2, 2).unwrap(),
                confidence: 1.0,
                class: ObjectClass::Car,
            };
            Ok(DetectionResult {
                detections: vec![detection; self.1],
            })
        }
    }

    fn with_masked_frame<T>(f: impl FnOnce(&MaskedFrame<'_>) -> T) -> T {
        let area = Polygon::from_pairs(&[(0, 0), (3, 0), (3, 3), (0, 3)]);
        let mask = Mask::build(4, 4, &area).unwrap();
        let frame = Frame::new(vec![0; 4 * 4 * 3], 4, 4, 0).unwrap();
        let masked = frame.apply_mask(&mask).unwrap();
        f(&masked)
    }

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(Fixed("one", 1));
        registry.register(Fixed("two", 2));
        assert_eq!(registry.default_name(), Some("one"));
        assert_eq!(registry.list(), vec!["one".to_string(), "two".to_string()]);

        let n = with_masked_frame(|f| registry.detect_default(f).unwrap().detections.len());
        assert_eq!(n, 1);

        registry.set_default("two").unwrap();
        let n = with_masked_frame(|f| registry.detect(f).unwrap().detections.len());
        assert_eq!(n, 2);
    }

    #[test]
    fn unknown_default_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register(Fixed("one", 0));
        assert!(registry.set_default("missing").is_err());
    }

    #[test]
    fn empty_registry_cannot_detect() {
        let registry = BackendRegistry::default();
        assert!(with_masked_frame(|f| registry.detect_default(f)).is_err());
    }
}
