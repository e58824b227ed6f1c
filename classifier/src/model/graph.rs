use super::{InferenceError, ModelBackend, ModelFormat, flatten_first_output};
use crate::preprocess::INPUT_SHAPE;
use std::io::Cursor;
use std::rc::Rc;
use tract_tensorflow::prelude::*;

/// Frozen TensorFlow `GraphDef`.
pub struct GraphModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
}

impl GraphModel {
    pub fn from_bytes(artifact: &[u8]) -> TractResult<Self> {
        let model = tract_tensorflow::tensorflow()
            .model_for_read(&mut Cursor::new(artifact))?
            .with_input_fact(0, f32::fact(INPUT_SHAPE).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model })
    }
}

impl ModelBackend for GraphModel {
    fn name(&self) -> &'static str {
        "tensorflow-graph"
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
pub struct GraphFormat;

impl ModelFormat for GraphFormat {
    fn name(&self) -> &'static str {
        "tensorflow-graph"
    }

    fn decode(&self, artifact: &[u8]) -> Result<Rc<dyn ModelBackend>, String> {
        let model = GraphModel::from_bytes(artifact).map_err(|e| format!("{e:#}"))?;
        Ok(Rc::new(model))
    }
}
