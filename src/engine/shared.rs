use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::data::{WeatherProvider, load_artifact};
use crate::error::{EngineError, EngineResult};

use super::core::PredictionEngine;

type Loader = Box<dyn Fn() -> EngineResult<PredictionEngine> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub features_count: usize,
}

/// A process-wide engine built on first use.
/// A failed build leaves the cell empty, so the next caller retries.
pub struct SharedEngine {
    cell: OnceCell<Arc<PredictionEngine>>,
    loader: Loader,
}

impl SharedEngine {
    pub fn new(loader: impl Fn() -> EngineResult<PredictionEngine> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Loads the artifact at `path` on first use.
    pub fn from_artifact_path(
        path: impl Into<PathBuf>,
        config: EngineConfig,
        provider: Option<Arc<dyn WeatherProvider>>,
    ) -> Self {
        let path = path.into();
        Self::new(move || {
            let artifact = load_artifact(&path)
                .map_err(|e| EngineError::ModelNotLoaded(format!("{:#}", e)))?;
            let engine = PredictionEngine::new(artifact, config.clone())?;
            Ok(match &provider {
                Some(p) => engine.with_weather_provider(Arc::clone(p)),
                None => engine,
            })
        })
    }

    pub fn get(&self) -> EngineResult<Arc<PredictionEngine>> {
        self.cell
            .get_or_try_init(|| {
                (self.loader)().map(Arc::new).inspect_err(|e| {
                    log::error!("Engine initialisation failed: {}", e);
                })
            })
            .cloned()
    }

    /// Reports without forcing a load.
    pub fn status(&self) -> EngineStatus {
        match self.cell.get() {
            Some(engine) => EngineStatus {
                model_loaded: true,
                features_count: engine.features_count(),
            },
            None => EngineStatus {
                model_loaded: false,
                features_count: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENGINE;
    use crate::models::{LinearModel, ModelArtifact};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn retries_after_a_failed_load_then_sticks() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let shared = SharedEngine::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(EngineError::ModelNotLoaded("not yet".into()));
            }
            let artifact = ModelArtifact::new(
                Arc::new(LinearModel::new(0.1, vec![0.0, 0.0])),
                vec!["hour".into(), "month".into()],
            );
            PredictionEngine::new(artifact, ENGINE.clone())
        });

        assert_eq!(
            shared.status(),
            EngineStatus {
                model_loaded: false,
                features_count: 0
            }
        );
        assert!(matches!(shared.get(), Err(EngineError::ModelNotLoaded(_))));
        assert!(!shared.status().model_loaded);

        let first = shared.get().unwrap();
        let second = shared.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(shared.status().features_count, 2);
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let shared = SharedEngine::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            let artifact = ModelArtifact::new(
                Arc::new(LinearModel::new(0.1, vec![0.0])),
                vec!["hour".into()],
            );
            PredictionEngine::new(artifact, ENGINE.clone())
        });

        let engines: Vec<Arc<PredictionEngine>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| shared.get().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(engines.iter().all(|e| Arc::ptr_eq(e, &engines[0])));
        assert!(shared.status().model_loaded);
    }

    #[test]
    fn missing_artifact_is_model_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedEngine::from_artifact_path(dir.path().join("none.json"), ENGINE.clone(), None);
        let err = shared.get().unwrap_err();
        assert!(matches!(err, EngineError::ModelNotLoaded(_)));
        assert!(err.is_fatal());
    }
}
