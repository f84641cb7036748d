use std::sync::Arc;

use agri_types::ModelError;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::SharedModel;

/// One registry entry. The mutex serializes training; once filled the slot
/// only hands out clones of the same `Arc`.
type ModelSlot = Arc<Mutex<Option<SharedModel>>>;

#[derive(Debug, Clone, Copy)]
enum FillKind {
    Train,
    Load,
}

impl FillKind {
    fn verb(self) -> &'static str {
        match self {
            FillKind::Train => "Training",
            FillKind::Load => "Loading",
        }
    }
}

/// Process-wide store of trained surrogates, keyed by name.
///
/// The registry is an ordinary value: construct one at startup and pass it
/// (or an `Arc` of it) to whatever needs a model.
#[derive(Default)]
pub struct ModelRegistry {
    slots: DashMap<String, ModelSlot>,
    stats: RwLock<RegistryStats>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("keys", &self.keys())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> ModelSlot {
        // The shard guard is dropped before the slot is locked, so a long
        // training run never blocks access to other keys.
        let entry = self.slots.entry(key.to_string()).or_default();
        Arc::clone(entry.value())
    }

    /// Return the model for `key`, running `train` if none exists yet.
    ///
    /// Concurrent first callers block on the slot; exactly one of them runs
    /// `train` and the rest receive its result. A failed training leaves the
    /// slot empty so a later call may retry.
    pub fn get_or_train<F>(&self, key: &str, train: F) -> Result<SharedModel, ModelError>
    where
        F: FnOnce() -> Result<SharedModel, ModelError>,
    {
        self.get_or_fill(key, FillKind::Train, train)
    }

    /// Like [`get_or_train`](Self::get_or_train), for models read from
    /// storage. The loader runs at most once per successful fill.
    pub fn get_or_load<F, E>(&self, key: &str, load: F) -> Result<SharedModel, E>
    where
        F: FnOnce() -> Result<SharedModel, E>,
        E: std::fmt::Display,
    {
        self.get_or_fill(key, FillKind::Load, load)
    }

    fn get_or_fill<F, E>(&self, key: &str, kind: FillKind, fill: F) -> Result<SharedModel, E>
    where
        F: FnOnce() -> Result<SharedModel, E>,
        E: std::fmt::Display,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock();

        if let Some(model) = guard.as_ref() {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(model));
        }

        self.stats.write().misses += 1;
        info!("{} surrogate model '{}'", kind.verb(), key);

        match fill() {
            Ok(model) => {
                *guard = Some(Arc::clone(&model));
                {
                    let mut stats = self.stats.write();
                    match kind {
                        FillKind::Train => stats.trainings += 1,
                        FillKind::Load => stats.loads += 1,
                    }
                }
                info!("Surrogate model '{}' ready ({})", key, model.name());
                Ok(model)
            }
            Err(e) => {
                self.stats.write().failures += 1;
                warn!("{} surrogate model '{}' failed: {}", kind.verb(), key, e);
                Err(e)
            }
        }
    }

    /// Cached model for `key`, without training.
    pub fn get(&self, key: &str) -> Option<SharedModel> {
        let slot = self.slots.get(key).map(|entry| Arc::clone(entry.value()))?;
        let model = slot.lock().clone();
        model
    }

    /// Cached model for `key`, or `ModelError::NotFound`.
    pub fn require(&self, key: &str) -> Result<SharedModel, ModelError> {
        self.get(key).ok_or_else(|| ModelError::NotFound {
            key: key.to_string(),
        })
    }

    /// Register an already-trained (e.g. loaded from disk) model, replacing
    /// any existing entry.
    pub fn insert(&self, key: &str, model: SharedModel) {
        let slot = self.slot(key);
        *slot.lock() = Some(model);
        self.stats.write().inserts += 1;
    }

    pub fn remove(&self, key: &str) -> Option<SharedModel> {
        self.slots
            .remove(key)
            .and_then(|(_, slot)| slot.lock().take())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    pub trainings: u64,
    pub loads: u64,
    pub failures: u64,
    pub inserts: u64,
}

impl RegistryStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SurrogateModel;
    use agri_types::FeatureVector;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct ConstantModel(f64);

    impl SurrogateModel for ConstantModel {
        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.0
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    fn constant(value: f64) -> SharedModel {
        Arc::new(ConstantModel(value))
    }

    #[test]
    fn test_second_call_hits_cache() {
        let registry = ModelRegistry::new();
        let first = registry.get_or_train("yield", || Ok(constant(1.0))).unwrap();
        let second = registry
            .get_or_train("yield", || panic!("must not retrain"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = registry.stats();
        assert_eq!(stats.trainings, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_concurrent_first_access_trains_once() {
        let registry = ModelRegistry::new();
        let trainings = AtomicUsize::new(0);

        let models: Vec<SharedModel> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .get_or_train("yield", || {
                                trainings.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(50));
                                Ok(constant(42.0))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(trainings.load(Ordering::SeqCst), 1);
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
        assert_eq!(registry.stats().trainings, 1);
    }

    #[test]
    fn test_concurrent_first_load_runs_once() {
        let registry = ModelRegistry::new();
        let loads = AtomicUsize::new(0);

        let models: Vec<SharedModel> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .get_or_load("stored", || {
                                loads.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(20));
                                Ok::<_, ModelError>(constant(9.0))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
        let stats = registry.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.trainings, 0);
        assert_eq!(stats.hits, 7);
    }

    #[test]
    fn test_failed_training_can_be_retried() {
        let registry = ModelRegistry::new();
        let err = registry
            .get_or_train("yield", || Err(ModelError::EmptyCorpus))
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyCorpus));
        assert!(!registry.contains("yield"));

        let model = registry.get_or_train("yield", || Ok(constant(2.0))).unwrap();
        assert_eq!(model.predict(&FeatureVector::floor()), 2.0);
        assert_eq!(registry.stats().failures, 1);
    }

    #[test]
    fn test_missing_model_is_not_substituted() {
        let registry = ModelRegistry::new();
        assert!(registry.get("unknown").is_none());
        assert!(matches!(
            registry.require("unknown"),
            Err(ModelError::NotFound { .. })
        ));

        registry.insert("preloaded", constant(3.0));
        assert!(registry.contains("preloaded"));
        assert_eq!(registry.keys(), vec!["preloaded".to_string()]);
        assert!(registry.remove("preloaded").is_some());
        assert!(!registry.contains("preloaded"));
    }
}
