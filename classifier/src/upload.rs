use crate::service::PredictError;
use crate::validation::{ImageValidator, ValidationError};
use shared::PredictionResult;
use std::sync::Arc;

/// A user-selected file: declared media type plus its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The current selection. `P` is whatever keeps a preview displayable
/// (an object URL in the browser); dropping it releases the preview.
#[derive(Debug, Default)]
pub enum UploadedImage<P> {
    #[default]
    Empty,
    Rejected(ValidationError),
    Accepted { file: ImageFile, preview: P },
}

impl<P> UploadedImage<P> {
    pub fn file(&self) -> Option<&ImageFile> {
        match self {
            UploadedImage::Accepted { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&P> {
        match self {
            UploadedImage::Accepted { preview, .. } => Some(preview),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, UploadedImage::Accepted { .. })
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            UploadedImage::Rejected(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UploadedImage::Empty)
    }
}

/// Proof that a prediction was started for a particular selection.
#[derive(Debug, Clone)]
pub struct PredictionTicket {
    generation: u64,
    file: ImageFile,
}

impl PredictionTicket {
    pub fn file(&self) -> &ImageFile {
        &self.file
    }
}

/// Holds the selected image and the latest prediction for it.
///
/// Every new selection or removal starts a new generation; outcomes that
/// arrive for an older generation are dropped.
#[derive(Debug)]
pub struct UploadController<P> {
    validator: ImageValidator,
    image: UploadedImage<P>,
    generation: u64,
    processing: bool,
    prediction: Option<PredictionResult>,
    prediction_error: Option<String>,
}

impl<P> UploadController<P> {
    pub fn new(validator: ImageValidator) -> Self {
        Self {
            validator,
            image: UploadedImage::Empty,
            generation: 0,
            processing: false,
            prediction: None,
            prediction_error: None,
        }
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    pub fn image(&self) -> &UploadedImage<P> {
        &self.image
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    pub fn prediction_error(&self) -> Option<&str> {
        self.prediction_error.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Validates `file` and replaces the current selection with it.
    /// `make_preview` runs only for accepted files.
    pub fn select(&mut self, file: ImageFile, make_preview: impl FnOnce(&ImageFile) -> P) -> Result<(), ValidationError> {
        match self.validator.validate(&file) {
            Ok(()) => {
                let preview = make_preview(&file);
                self.replace(UploadedImage::Accepted { file, preview });
                Ok(())
            }
            Err(err) => {
                self.reject(err.clone());
                Err(err)
            }
        }
    }

    /// Records a rejection found before the file's bytes were read.
    pub fn reject(&mut self, err: ValidationError) {
        log::warn!("Rejected upload: {}", err);
        self.replace(UploadedImage::Rejected(err));
    }

    /// Starts a new upload whose bytes are still being read. The previous
    /// selection and any prediction in flight for it are dropped now.
    pub fn begin_upload(&mut self) {
        self.replace(UploadedImage::Empty);
    }

    pub fn remove(&mut self) {
        self.replace(UploadedImage::Empty);
    }

    fn replace(&mut self, image: UploadedImage<P>) {
        self.generation += 1;
        self.image = image;
        self.processing = false;
        self.prediction = None;
        self.prediction_error = None;
    }

    /// Marks a prediction as in flight for the accepted image. Returns `None`
    /// when there is nothing to analyze or a prediction is already running.
    pub fn begin_prediction(&mut self) -> Option<PredictionTicket> {
        if self.processing {
            return None;
        }
        let file = self.image.file()?.clone();
        self.processing = true;
        self.prediction = None;
        self.prediction_error = None;
        Some(PredictionTicket {
            generation: self.generation,
            file,
        })
    }

    /// Applies a finished prediction. Returns `false` when the ticket belongs
    /// to a selection that has since been replaced.
    pub fn finish_prediction(&mut self, ticket: PredictionTicket, outcome: Result<PredictionResult, PredictError>) -> bool {
        if ticket.generation != self.generation {
            log::debug!("Discarding stale prediction for {}", ticket.file.name());
            return false;
        }

        self.processing = false;
        match outcome {
            Ok(result) => self.prediction = Some(result),
            Err(err) => match err.fallback_result() {
                Some(result) => self.prediction = Some(result),
                None => self.prediction_error = Some(err.user_message().to_string()),
            },
        }
        true
    }
}
