//! Cat/dog photo classifier core.
//!
//! Uploads are checked by [`validation::ImageValidator`], tracked by
//! [`upload::UploadController`] and classified by
//! [`service::InferenceService`], which loads an ONNX or TensorFlow model
//! once and runs preprocess → infer → threshold for each photo.

pub mod config;
pub mod messages;
pub mod model;
pub mod preprocess;
pub mod service;
pub mod tensor;
pub mod upload;
pub mod validation;

pub use config::{ClassifierConfig, ConfigError};
pub use model::{FetchError, LoadError, ModelBackend, ModelFetcher, ModelFormat, ModelHandle};
pub use preprocess::{DecodeError, ImagePreprocessor};
pub use service::{InferenceService, PredictError};
pub use shared::{ClassLabel, ModelStatus, PredictionResult};
pub use upload::{ImageFile, PredictionTicket, UploadController, UploadedImage};
pub use validation::{ImageValidator, ValidationError};
