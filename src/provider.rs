//! Model provider. Loads the pretrained model once and keeps it resident.
//!
//! The provider is an explicit value passed to whoever needs the model, not a
//! global. The first [`ModelProvider::handle`] call performs the load; every
//! later call returns the same handle. A failed load is remembered as well, so
//! it is reported on each use but never retried.
//!
//! Generation is serialized per handle: the handle's mutex is held across
//! `configure` + `generate_one`, because the generation length is state of the
//! handle rather than an argument of the call.

use std::sync::{Arc, Mutex, OnceLock};

use crate::Error;
use crate::model::{GenerationSettings, ModelLoader, MusicModel};
use crate::waveform::Waveform;

/// Shared handle to a loaded model.
#[derive(Clone)]
pub struct ModelHandle(Arc<Mutex<Box<dyn MusicModel>>>);

impl ModelHandle {
    /// True when both handles point at the same loaded model.
    pub fn same_as(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelHandle").field(&"<MusicModel>").finish()
    }
}

/// Failure of a provider operation.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The model could not be loaded (cached; no retry).
    #[error("error loading model: {0}")]
    Load(String),

    /// Configuring or running the model failed.
    #[error("error during music generation: {0}")]
    Generate(#[source] Error),
}

/// Lazily loaded, cached model.
pub struct ModelProvider<L: ModelLoader> {
    loader: L,
    model_id: String,
    loaded: OnceLock<Result<ModelHandle, String>>,
}

impl<L: ModelLoader> ModelProvider<L> {
    pub fn new(loader: L, model_id: impl Into<String>) -> Self {
        Self {
            loader,
            model_id: model_id.into(),
            loaded: OnceLock::new(),
        }
    }

    /// Whether a load has been attempted yet.
    pub fn is_initialized(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Return the cached handle, loading the model on first use.
    pub fn handle(&self) -> Result<ModelHandle, ProviderError> {
        self.loaded
            .get_or_init(|| match self.loader.load_pretrained(&self.model_id) {
                Ok(model) => Ok(ModelHandle(Arc::new(Mutex::new(model)))),
                Err(error) => {
                    tracing::error!(model = %self.model_id, %error, "error loading model");
                    Err(error.to_string())
                }
            })
            .clone()
            .map_err(ProviderError::Load)
    }

    /// Generate one clip of `duration_s` seconds for `description`.
    pub fn generate(&self, description: &str, duration_s: u32) -> Result<Waveform, ProviderError> {
        let handle = self.handle()?;
        let mut model = handle
            .0
            .lock()
            .map_err(|_| ProviderError::Generate(Error::Model("model handle poisoned".into())))?;

        let settings = GenerationSettings::for_duration(duration_s);
        model
            .configure(&settings)
            .and_then(|()| model.generate_one(description))
            .map_err(|error| {
                tracing::error!(%error, "error during music generation");
                ProviderError::Generate(error)
            })
    }
}
