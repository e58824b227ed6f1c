use super::{InferenceError, ModelBackend, ModelFormat, flatten_first_output};
use crate::preprocess::INPUT_SHAPE;
use std::io::Cursor;
use std::rc::Rc;
use tract_onnx::prelude::*;

/// Layered network serialized as ONNX.
pub struct OnnxModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
}

impl OnnxModel {
    pub fn from_bytes(artifact: &[u8]) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(artifact))?
            .with_input_fact(0, f32::fact(INPUT_SHAPE).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model })
    }
}

impl ModelBackend for OnnxModel {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn run_inference(&self, input: &TValue) -> Result<Vec<f32>, InferenceError> {
        let outputs = self
            .model
            .run(tvec!(input.clone()))
            .map_err(|e| InferenceError(format!("{e:#}")))?;
        flatten_first_output(&outputs)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxFormat;

impl ModelFormat for OnnxFormat {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn decode(&self, artifact: &[u8]) -> Result<Rc<dyn ModelBackend>, String> {
        let model = OnnxModel::from_bytes(artifact).map_err(|e| format!("{e:#}"))?;
        Ok(Rc::new(model))
    }
}
