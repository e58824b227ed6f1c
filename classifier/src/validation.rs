use crate::config::ClassifierConfig;
use crate::upload::ImageFile;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload a valid image file ({})", .accepted.join(", "))]
    UnsupportedFormat {
        media_type: String,
        accepted: Vec<String>,
    },
    #[error("File size must be less than {limit_mb}MB")]
    FileTooLarge { size: u64, limit: u64, limit_mb: u64 },
}

/// Checks uploads against the configured format and size policy.
///
/// The format check runs first, so a file that is both the wrong type and
/// too large reports the format problem.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    accepted_formats: Vec<String>,
    max_file_size: u64,
}

impl ImageValidator {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            accepted_formats: config.accepted_formats.clone(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn validate(&self, file: &ImageFile) -> Result<(), ValidationError> {
        self.check(file.media_type(), file.size())
    }

    /// Metadata-only variant, usable before the file's bytes are read.
    pub fn check(&self, media_type: &str, size: u64) -> Result<(), ValidationError> {
        if !self.accepted_formats.iter().any(|format| format == media_type) {
            return Err(ValidationError::UnsupportedFormat {
                media_type: media_type.to_string(),
                accepted: self.accepted_formats.clone(),
            });
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                limit: self.max_file_size,
                limit_mb: self.max_file_size / (1024 * 1024),
            });
        }

        Ok(())
    }

    /// Value for a file input's `accept` attribute.
    pub fn accept_attribute(&self) -> String {
        self.accepted_formats.join(",")
    }

    /// Short human hint such as `JPG, PNG, WebP • Max 10MB`.
    pub fn hint(&self) -> String {
        let formats: Vec<&str> = self
            .accepted_formats
            .iter()
            .map(|format| match format.as_str() {
                "image/jpeg" => "JPG",
                "image/png" => "PNG",
                "image/webp" => "WebP",
                other => other.strip_prefix("image/").unwrap_or(other),
            })
            .collect();
        format!(
            "{} • Max {}MB",
            formats.join(", "),
            self.max_file_size / (1024 * 1024)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ImageValidator {
        ImageValidator::new(&ClassifierConfig::default())
    }

    #[test]
    fn accepts_supported_formats_within_limit() {
        let v = validator();
        for media_type in ["image/jpeg", "image/png", "image/webp"] {
            assert_eq!(v.check(media_type, 1), Ok(()));
            assert_eq!(v.check(media_type, 0), Ok(()));
        }
    }

    #[test]
    fn rejects_unsupported_format_regardless_of_size() {
        let v = validator();
        for size in [0, 1024, 10 * 1024 * 1024, 50 * 1024 * 1024] {
            let err = v.check("image/gif", size).unwrap_err();
            assert!(matches!(err, ValidationError::UnsupportedFormat { .. }));
        }
    }

    #[test]
    fn format_message_lists_accepted_types() {
        let err = validator().check("application/pdf", 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please upload a valid image file (image/jpeg, image/png, image/webp)"
        );
    }

    #[test]
    fn size_boundary_is_inclusive() {
        let v = validator();
        let max = ClassifierConfig::default().max_file_size;
        assert_eq!(v.check("image/png", max), Ok(()));

        let err = v.check("image/png", max + 1).unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 10MB");
        assert!(matches!(err, ValidationError::FileTooLarge { size, .. } if size == max + 1));
    }

    #[test]
    fn validates_whole_files() {
        let v = validator();
        let file = ImageFile::new("cat.png", "image/png", vec![0u8; 16]);
        assert!(v.validate(&file).is_ok());

        let file = ImageFile::new("cat.bmp", "image/bmp", vec![0u8; 16]);
        assert!(v.validate(&file).is_err());
    }

    #[test]
    fn renders_input_hints() {
        let v = validator();
        assert_eq!(v.accept_attribute(), "image/jpeg,image/png,image/webp");
        assert_eq!(v.hint(), "JPG, PNG, WebP • Max 10MB");
    }
}
