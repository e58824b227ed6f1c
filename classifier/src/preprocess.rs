use crate::tensor::{NormalizedTensor, TensorTracker};
use crate::upload::ImageFile;
use image::{DynamicImage, ImageFormat, RgbImage};
use thiserror::Error;
use tract_onnx::prelude::*;

pub const INPUT_HEIGHT: usize = 224;
pub const INPUT_WIDTH: usize = 224;
pub const INPUT_CHANNELS: usize = 3;
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Turns an uploaded file into the model's NHWC input tensor.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn preprocess(
        &self,
        file: &ImageFile,
        tracker: &TensorTracker,
    ) -> Result<NormalizedTensor, DecodeError> {
        let image = decode(file)?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyImage { width, height });
        }

        let tensor = resize_nearest_to_tensor(&rgb);
        Ok(NormalizedTensor::new(tensor.into_tvalue(), tracker.lease()))
    }
}

fn decode(file: &ImageFile) -> Result<DynamicImage, DecodeError> {
    let image = match ImageFormat::from_mime_type(file.media_type()) {
        Some(format) => image::load_from_memory_with_format(file.bytes(), format)?,
        None => image::load_from_memory(file.bytes())?,
    };
    Ok(image)
}

/// Nearest-neighbour resize to 224x224 fused with the `/255` scaling.
///
/// Source coordinates follow TensorFlow's `resizeNearestNeighbor` with
/// `alignCorners = false` and `halfPixelCenters = false`.
fn resize_nearest_to_tensor(rgb: &RgbImage) -> Tensor {
    let (src_width, src_height) = rgb.dimensions();
    let xs: Vec<u32> = (0..INPUT_WIDTH)
        .map(|x| nearest_source(x, src_width, INPUT_WIDTH))
        .collect();
    let ys: Vec<u32> = (0..INPUT_HEIGHT)
        .map(|y| nearest_source(y, src_height, INPUT_HEIGHT))
        .collect();

    tract_ndarray::Array4::from_shape_fn(
        (1, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS),
        |(_, y, x, c)| {
            let pixel = rgb.get_pixel(xs[x], ys[y]);
            pixel[c] as f32 / 255.0
        },
    )
    .into_tensor()
}

fn nearest_source(dst: usize, src_len: u32, dst_len: usize) -> u32 {
    let scaled = dst as u64 * src_len as u64 / dst_len as u64;
    scaled.min(src_len as u64 - 1) as u32
}
