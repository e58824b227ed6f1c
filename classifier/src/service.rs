use crate::config::ClassifierConfig;
use crate::messages;
use crate::model::{
    ClassProbabilities, InferenceError, LoadError, ModelBackend, ModelFetcher, ModelFormat, ModelHandle,
    UnexpectedOutput, default_formats,
};
use crate::preprocess::{DecodeError, ImagePreprocessor};
use crate::tensor::TensorTracker;
use crate::upload::ImageFile;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use shared::{ClassLabel, ModelStatus, PredictionResult};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

const DEFAULT_MESSAGE_SEED: u64 = 0x6d65_6f77;

pub const USER_FACING_ERROR: &str = "Something went wrong, please try again.";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model unavailable: {0}")]
    Load(#[from] LoadError),
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] DecodeError),
    #[error(transparent)]
    UnexpectedOutput(#[from] UnexpectedOutput),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    /// Text safe to show end users; details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        USER_FACING_ERROR
    }

    /// The result to display instead of an error, for faults that read as
    /// "the model could not decide" rather than "something broke".
    pub fn fallback_result(&self) -> Option<PredictionResult> {
        match self {
            PredictError::UnexpectedOutput(_) => Some(PredictionResult {
                class_label: ClassLabel::Uncertain,
                confidence: 0.0,
                message: messages::UNCERTAIN_MESSAGE.to_string(),
            }),
            _ => None,
        }
    }
}

/// Load-once model owner and the preprocess → infer → threshold pipeline.
///
/// One instance lives for the whole session and is shared by reference.
/// Calls are expected to be serialized by the caller, but overlapping
/// `predict`s only share the read-only model.
pub struct InferenceService<F> {
    config: ClassifierConfig,
    fetcher: F,
    model: ModelHandle,
    preprocessor: ImagePreprocessor,
    tensors: TensorTracker,
    rng: RefCell<SmallRng>,
}

impl<F: ModelFetcher> InferenceService<F> {
    pub fn new(config: ClassifierConfig, fetcher: F) -> Self {
        Self::with_formats(config, fetcher, default_formats())
    }

    pub fn with_formats(config: ClassifierConfig, fetcher: F, formats: Vec<Box<dyn ModelFormat>>) -> Self {
        Self {
            config,
            fetcher,
            model: ModelHandle::new(formats),
            preprocessor: ImagePreprocessor::new(),
            tensors: TensorTracker::new(),
            rng: RefCell::new(SmallRng::seed_from_u64(DEFAULT_MESSAGE_SEED)),
        }
    }

    /// Reseeds the message picker. Only the wording of messages depends on it.
    pub fn with_message_seed(self, seed: u64) -> Self {
        *self.rng.borrow_mut() = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn status(&self) -> ModelStatus {
        self.model.status()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    /// Number of tensors currently alive; zero whenever no prediction runs.
    pub fn live_tensors(&self) -> usize {
        self.tensors.live()
    }

    pub async fn load_model(&self) -> Result<(), LoadError> {
        self.model.load(&self.fetcher, &self.config.model_url).await
    }

    /// Uses an already decoded model instead of fetching one.
    pub fn install_model(&self, backend: Rc<dyn ModelBackend>) {
        self.model.install(backend);
    }

    /// Releases the model at the end of the session.
    pub fn unload(&self) {
        self.model.unload();
    }

    pub async fn predict(&self, file: &ImageFile) -> Result<PredictionResult, PredictError> {
        match self.run_pipeline(file).await {
            Ok(result) => {
                log::debug!(
                    "Predicted {} ({:.3}) for {}",
                    result.class_label,
                    result.confidence,
                    file.name()
                );
                Ok(result)
            }
            Err(e) => {
                log::error!("Prediction failed for {}: {}", file.name(), e);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, file: &ImageFile) -> Result<PredictionResult, PredictError> {
        if !self.is_loaded() {
            self.load_model().await?;
        }

        let tensor = self.preprocessor.preprocess(file, &self.tensors).await?;
        let output = self.model.infer(&tensor, &self.tensors);
        drop(tensor);
        let output = output?;

        let probabilities = ClassProbabilities::from_output(output.values())?;
        drop(output);

        Ok(self.classify(probabilities))
    }

    fn classify(&self, probabilities: ClassProbabilities) -> PredictionResult {
        // Strict comparison: an exact tie goes to dog. Kept for
        // compatibility with earlier results; the choice itself is arbitrary.
        let is_cat = probabilities.cat > probabilities.dog;
        let confidence = probabilities.cat.max(probabilities.dog);

        let class_label = if confidence < self.config.confidence_threshold {
            ClassLabel::Uncertain
        } else if is_cat {
            ClassLabel::Cat
        } else {
            ClassLabel::Dog
        };

        let message = messages::pick(class_label, &mut *self.rng.borrow_mut());

        PredictionResult {
            class_label,
            confidence,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FetchError, UnexpectedOutputShape};
    use futures::executor::block_on;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tract_onnx::prelude::TValue;

    struct NoFetch;

    impl ModelFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::new(url, "offline"))
        }
    }

    struct Scripted(Vec<f32>);

    impl ModelBackend for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn run_inference(&self, input: &TValue) -> Result<Vec<f32>, InferenceError> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            Ok(self.0.clone())
        }
    }

    fn service_with_output(output: Vec<f32>) -> InferenceService<NoFetch> {
        let service = InferenceService::new(ClassifierConfig::default(), NoFetch).with_message_seed(3);
        service.install_model(Rc::new(Scripted(output)));
        service
    }

    fn photo() -> ImageFile {
        let img = ImageBuffer::from_pixel(64, 48, Rgb([120u8, 90, 60]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageFile::new("pet.png", "image/png", bytes)
    }

    #[test]
    fn single_output_is_dog_probability() {
        let service = service_with_output(vec![0.9]);
        let result = block_on(service.predict(&photo())).unwrap();
        assert_eq!(result.class_label, ClassLabel::Dog);
        assert_eq!(result.confidence, 0.9);
        assert!(messages::DOG_MESSAGES.contains(&result.message.as_str()));
    }

    #[test]
    fn confident_cat() {
        let service = service_with_output(vec![0.95, 0.05]);
        let result = block_on(service.predict(&photo())).unwrap();
        assert_eq!(result.class_label, ClassLabel::Cat);
        assert_eq!(result.confidence, 0.95);
        assert!(messages::CAT_MESSAGES.contains(&result.message.as_str()));
    }

    #[test]
    fn low_confidence_tie_is_uncertain() {
        let service = service_with_output(vec![0.3, 0.3]);
        let result = block_on(service.predict(&photo())).unwrap();
        assert_eq!(result.class_label, ClassLabel::Uncertain);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.message, messages::UNCERTAIN_MESSAGE);
    }

    #[test]
    fn exact_tie_above_threshold_goes_to_dog() {
        let config = ClassifierConfig {
            confidence_threshold: 0.5,
            ..ClassifierConfig::default()
        };
        let service = InferenceService::new(config, NoFetch);
        service.install_model(Rc::new(Scripted(vec![0.5, 0.5])));

        let result = block_on(service.predict(&photo())).unwrap();
        assert_eq!(result.class_label, ClassLabel::Dog);
    }

    #[test]
    fn confidence_at_threshold_is_definite() {
        let service = service_with_output(vec![0.7, 0.3]);
        let result = block_on(service.predict(&photo())).unwrap();
        assert_eq!(result.class_label, ClassLabel::Cat);
    }

    #[test]
    fn three_outputs_fail_with_shape_error() {
        let service = service_with_output(vec![0.1, 0.2, 0.7]);
        let err = block_on(service.predict(&photo())).unwrap_err();
        assert!(matches!(
            err,
            PredictError::UnexpectedOutput(UnexpectedOutput::Shape(UnexpectedOutputShape { len: 3 }))
        ));

        let fallback = err.fallback_result().unwrap();
        assert_eq!(fallback.class_label, ClassLabel::Uncertain);
        assert_eq!(fallback.confidence, 0.0);
        assert_eq!(service.live_tensors(), 0);
    }

    #[test]
    fn outputs_outside_unit_interval_fall_back_to_uncertain() {
        for output in [vec![0.9, f32::NAN], vec![f32::NAN], vec![1.8, -0.8]] {
            let service = service_with_output(output);
            let err = block_on(service.predict(&photo())).unwrap_err();
            assert!(matches!(err, PredictError::UnexpectedOutput(UnexpectedOutput::NotAProbability(_))));

            let fallback = err.fallback_result().unwrap();
            assert_eq!(fallback.class_label, ClassLabel::Uncertain);
            assert_eq!(fallback.confidence, 0.0);
            assert_eq!(service.live_tensors(), 0);
        }
    }

    #[test]
    fn no_tensors_survive_a_prediction() {
        let service = service_with_output(vec![0.2, 0.8]);
        for _ in 0..3 {
            block_on(service.predict(&photo())).unwrap();
            assert_eq!(service.live_tensors(), 0);
        }
    }

    #[test]
    fn corrupt_image_is_a_preprocess_error() {
        let service = service_with_output(vec![0.2, 0.8]);
        let file = ImageFile::new("bad.jpg", "image/jpeg", b"\xff\xd8garbage".to_vec());
        let err = block_on(service.predict(&file)).unwrap_err();
        assert!(matches!(err, PredictError::Preprocess(_)));
        assert_eq!(err.user_message(), USER_FACING_ERROR);
        assert!(err.fallback_result().is_none());
        assert_eq!(service.live_tensors(), 0);
    }

    #[test]
    fn unloaded_model_is_loaded_lazily_and_failure_propagates() {
        let service = InferenceService::new(ClassifierConfig::default(), NoFetch);
        let err = block_on(service.predict(&photo())).unwrap_err();
        assert!(matches!(err, PredictError::Load(LoadError::Fetch(_))));
        assert_eq!(service.status(), ModelStatus::Failed);
    }

    #[test]
    fn unload_releases_the_model() {
        let service = service_with_output(vec![0.9]);
        assert!(service.is_loaded());
        service.unload();
        assert!(!service.is_loaded());
    }
}
