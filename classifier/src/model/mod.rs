pub mod fetch;
pub mod graph;
pub mod onnx;

pub use fetch::{FetchError, ModelFetcher, ModelManifest, fetch_artifact};
pub use graph::{GraphFormat, GraphModel};
pub use onnx::{OnnxFormat, OnnxModel};

use crate::tensor::{NormalizedTensor, RawOutput, TensorTracker};
use shared::ModelStatus;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tract_onnx::prelude::{TValue, TVec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatAttempt {
    pub format: &'static str,
    pub reason: String,
}

impl fmt::Display for FormatAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.format, self.reason)
    }
}

fn describe_attempts(attempts: &[FormatAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid model manifest: {0}")]
    Manifest(String),
    #[error("model artifact is not in a supported format ({})", describe_attempts(.0))]
    Unrecognized(Vec<FormatAttempt>),
}

#[derive(Debug, Clone, Error)]
#[error("model execution failed: {0}")]
pub struct InferenceError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("model produced {len} output values, expected 1 or 2")]
pub struct UnexpectedOutputShape {
    pub len: usize,
}

/// Model output that cannot be read as class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UnexpectedOutput {
    #[error(transparent)]
    Shape(#[from] UnexpectedOutputShape),
    #[error("model produced {0}, which is not a probability in [0, 1]")]
    NotAProbability(f32),
}

/// A loaded network, whatever representation it came from.
pub trait ModelBackend {
    fn name(&self) -> &'static str;
    fn run_inference(&self, input: &TValue) -> Result<Vec<f32>, InferenceError>;
}

/// One serialized model representation that `ModelHandle::load` can try.
pub trait ModelFormat {
    fn name(&self) -> &'static str;
    fn decode(&self, artifact: &[u8]) -> Result<Rc<dyn ModelBackend>, String>;
}

/// Representations tried by default: ONNX first, then a TensorFlow graph.
pub fn default_formats() -> Vec<Box<dyn ModelFormat>> {
    vec![Box::new(OnnxFormat), Box::new(GraphFormat)]
}

pub(crate) fn flatten_first_output(outputs: &TVec<TValue>) -> Result<Vec<f32>, InferenceError> {
    let first = outputs
        .first()
        .ok_or_else(|| InferenceError("model returned no outputs".into()))?;
    let view = first
        .to_array_view::<f32>()
        .map_err(|e| InferenceError(format!("{e:#}")))?;
    Ok(view.iter().copied().collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub cat: f32,
    pub dog: f32,
}

impl ClassProbabilities {
    /// A single value is P(dog); a pair is `[P(cat), P(dog)]`. Every value
    /// must be finite and within `[0, 1]`.
    pub fn from_output(values: &[f32]) -> Result<Self, UnexpectedOutput> {
        if let Some(&bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(UnexpectedOutput::NotAProbability(bad));
        }
        match *values {
            [dog] => Ok(Self { cat: 1.0 - dog, dog }),
            [cat, dog] => Ok(Self { cat, dog }),
            _ => Err(UnexpectedOutputShape { len: values.len() }.into()),
        }
    }
}

enum ModelState {
    Unloaded,
    Loading,
    Loaded(Rc<dyn ModelBackend>),
    Failed(String),
}

pub struct ModelHandle {
    formats: Vec<Box<dyn ModelFormat>>,
    state: RefCell<ModelState>,
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new(default_formats())
    }
}

impl ModelHandle {
    pub fn new(formats: Vec<Box<dyn ModelFormat>>) -> Self {
        Self {
            formats,
            state: RefCell::new(ModelState::Unloaded),
        }
    }

    pub fn status(&self) -> ModelStatus {
        match &*self.state.borrow() {
            ModelState::Unloaded => ModelStatus::Unloaded,
            ModelState::Loading => ModelStatus::Loading,
            ModelState::Loaded(_) => ModelStatus::Loaded,
            ModelState::Failed(_) => ModelStatus::Failed,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status() == ModelStatus::Loaded
    }

    /// Reason recorded by the last failed load, if the handle is `Failed`.
    pub fn failure(&self) -> Option<String> {
        match &*self.state.borrow() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend().map(|backend| backend.name())
    }

    pub(crate) fn backend(&self) -> Option<Rc<dyn ModelBackend>> {
        match &*self.state.borrow() {
            ModelState::Loaded(backend) => Some(Rc::clone(backend)),
            _ => None,
        }
    }

    /// Fetches and decodes the model at `url`. Does nothing once loaded.
    pub async fn load<F: ModelFetcher>(&self, fetcher: &F, url: &str) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        *self.state.borrow_mut() = ModelState::Loading;

        let result = match fetch_artifact(fetcher, url).await {
            Ok(artifact) => self.decode(&artifact),
            Err(e) => Err(e),
        };

        match result {
            Ok(backend) => {
                log::info!("Model loaded from {} as {}", url, backend.name());
                *self.state.borrow_mut() = ModelState::Loaded(backend);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load model from {}: {}", url, e);
                *self.state.borrow_mut() = ModelState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn decode(&self, artifact: &[u8]) -> Result<Rc<dyn ModelBackend>, LoadError> {
        let mut attempts = Vec::new();
        for format in &self.formats {
            match format.decode(artifact) {
                Ok(backend) => return Ok(backend),
                Err(reason) => {
                    log::warn!("Model is not a valid {} artifact: {}", format.name(), reason);
                    attempts.push(FormatAttempt {
                        format: format.name(),
                        reason,
                    });
                }
            }
        }
        Err(LoadError::Unrecognized(attempts))
    }

    /// Installs an already decoded backend, skipping the fetch.
    pub fn install(&self, backend: Rc<dyn ModelBackend>) {
        *self.state.borrow_mut() = ModelState::Loaded(backend);
    }

    pub fn unload(&self) {
        *self.state.borrow_mut() = ModelState::Unloaded;
    }

    /// Runs `tensor` through the loaded model. The caller keeps ownership of
    /// `tensor` and drops it; the returned output holds its own lease.
    pub fn infer(&self, tensor: &NormalizedTensor, tracker: &TensorTracker) -> Result<RawOutput, InferenceError> {
        let backend = self
            .backend()
            .ok_or_else(|| InferenceError("model is not loaded".into()))?;
        let values = backend.run_inference(tensor.value())?;
        Ok(RawOutput::new(values, tracker.lease()))
    }
}
