//! Optimizer trait and trainable parameter buffers

use serde::{Deserialize, Serialize};

/// A flat trainable buffer with its most recent gradient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub data: Vec<f32>,
    #[serde(skip)]
    pub grad: Option<Vec<f32>>,
}

impl Parameter {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data, grad: None }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the gradient; it must have the same length as the data
    pub fn set_grad(&mut self, grad: Vec<f32>) {
        debug_assert_eq!(grad.len(), self.data.len(), "gradient length mismatch");
        self.grad = Some(grad);
    }

    pub fn zero_grad(&mut self) {
        self.grad = None;
    }
}

/// Trait for optimization algorithms
///
/// Optimizers own the parameters they update; they are handed over as a
/// runtime argument when the optimizer is constructed from its configuration.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self);

    fn params(&self) -> &[Parameter];

    fn params_mut(&mut self) -> &mut [Parameter];

    /// Give the parameters back
    fn into_params(self: Box<Self>) -> Vec<Parameter>;

    /// Zero out all gradients
    fn zero_grad(&mut self) {
        for param in self.params_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
