use std::cell::Cell;
use std::rc::Rc;
use tract_onnx::prelude::TValue;

/// Counts the transient buffers a pipeline currently holds.
///
/// Every [`NormalizedTensor`] and [`RawOutput`] takes a lease from a tracker
/// and gives it back when dropped, so a non-zero count after a prediction
/// means something escaped its scope.
#[derive(Debug, Clone, Default)]
pub struct TensorTracker {
    live: Rc<Cell<usize>>,
}

impl TensorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn lease(&self) -> TensorLease {
        self.live.set(self.live.get() + 1);
        TensorLease {
            live: Rc::clone(&self.live),
        }
    }
}

#[derive(Debug)]
pub struct TensorLease {
    live: Rc<Cell<usize>>,
}

impl Drop for TensorLease {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Model input: `[1, 224, 224, 3]` f32 in `[0, 1]`.
#[derive(Debug)]
pub struct NormalizedTensor {
    value: TValue,
    _lease: TensorLease,
}

impl NormalizedTensor {
    pub(crate) fn new(value: TValue, lease: TensorLease) -> Self {
        Self {
            value,
            _lease: lease,
        }
    }

    pub fn value(&self) -> &TValue {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }
}

/// Flattened model output.
#[derive(Debug)]
pub struct RawOutput {
    values: Vec<f32>,
    _lease: TensorLease,
}

impl RawOutput {
    pub(crate) fn new(values: Vec<f32>, lease: TensorLease) -> Self {
        Self {
            values,
            _lease: lease,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leases_are_returned_on_drop() {
        let tracker = TensorTracker::new();
        let first = tracker.lease();
        let second = tracker.clone().lease();
        assert_eq!(tracker.live(), 2);

        drop(first);
        assert_eq!(tracker.live(), 1);
        drop(second);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn raw_output_releases_its_lease() {
        let tracker = TensorTracker::new();
        {
            let output = RawOutput::new(vec![0.25, 0.75], tracker.lease());
            assert_eq!(output.values(), &[0.25, 0.75]);
            assert_eq!(tracker.live(), 1);
        }
        assert_eq!(tracker.live(), 0);
    }
}
