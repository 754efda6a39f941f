//! Configurable optimizers over flat `f32` parameter buffers

mod adam;
mod optimizer;
mod sgd;

#[cfg(test)]
mod convergence_tests;

pub use adam::Adam;
pub use optimizer::{Optimizer, Parameter};
pub use sgd::Sgd;

use crate::error::{Error, Result};
use crate::lazy::{Choices, Kwargs, Lazy, Parsable};
use crate::value::Value;

/// `SGD` (default) or `ADAM`
pub struct OptimizerChoice;

impl Choices for OptimizerChoice {
    const NAME: &'static str = "OptimizerChoice";

    fn alternatives() -> Vec<(&'static str, Value)> {
        vec![
            ("SGD", Sgd::as_lazy().into()),
            ("ADAM", Adam::as_lazy().into()),
        ]
    }
}

/// Construct the optimizer `config` describes, handing it `params`
pub fn build_optimizer(config: &Lazy, params: Vec<Parameter>) -> Result<Box<dyn Optimizer>> {
    let kwargs = Kwargs::new().object("params", params);
    let class = config.class();
    if class.is::<Sgd>() {
        Ok(Box::new(config.to_eager_with::<Sgd>(kwargs)?))
    } else if class.is::<Adam>() {
        Ok(Box::new(config.to_eager_with::<Adam>(kwargs)?))
    } else {
        Err(Error::TypeMismatch {
            class: class.path().to_string(),
            expected: "an optimizer".to_string(),
            actual: class.type_name().to_string(),
        })
    }
}
