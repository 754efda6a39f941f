//! Demo configurables: a linear model trained with a selectable optimizer
//!
//! ```
//! use lazyconf::demo::Params;
//! use lazyconf::Parsable;
//!
//! let params = Params::try_parse_args_from(["train", "--opt", "ADAM", "--betas", "0.8", "0.99"]).unwrap();
//! assert_eq!(params.choice("opt").unwrap().tag, "ADAM");
//! ```

use crate::error::{Error, Result};
use crate::io::Checkpoint;
use crate::lazy::{Configurable, Kwargs, Lazy, Param, Parsable};
use crate::optim::{OptimizerChoice, Parameter};
use crate::typecheck::TypeExpr;
use serde::{Deserialize, Serialize};

/// `y = W x + b`
#[derive(Debug)]
pub struct Linear {
    pub in_channels: usize,
    pub out_channels: usize,
    weight: Vec<f32>,
    bias: Vec<f32>,
    config: Lazy,
}

/// Saved weights of a [`Linear`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearState {
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Linear {
    pub fn forward(&self, x: &[f32]) -> Vec<f32> {
        self.weight
            .chunks(self.in_channels)
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect()
    }

    /// Weight and bias as trainable buffers
    pub fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::new(self.weight.clone()),
            Parameter::new(self.bias.clone()),
        ]
    }

    pub fn set_parameters(&mut self, params: &[Parameter]) -> Result<()> {
        match params {
            [weight, bias] => self.load_state_dict(LinearState {
                weight: weight.data.clone(),
                bias: bias.data.clone(),
            }),
            _ => Err(Error::Construction(format!(
                "Linear expects 2 parameters, got {}",
                params.len()
            ))),
        }
    }
}

impl Configurable for Linear {
    const PATH: &'static str = "lazyconf::demo::Linear";

    fn params() -> Vec<Param> {
        vec![
            Param::new("in_channels", TypeExpr::Int).with_default(4),
            Param::new("out_channels", TypeExpr::Int).with_default(2),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        let in_channels: usize = kwargs.require("in_channels")?;
        let out_channels: usize = kwargs.require("out_channels")?;
        if in_channels == 0 || out_channels == 0 {
            return Err(Error::Construction(
                "Linear needs at least one input and one output".to_string(),
            ));
        }

        // deterministic small weights in [-0.5, 0.5)
        let weight = (0..in_channels * out_channels)
            .map(|i| ((i * 7 + 3) % 11) as f32 / 11.0 - 0.5)
            .collect();
        Ok(Self {
            in_channels,
            out_channels,
            weight,
            bias: vec![0.0; out_channels],
            config,
        })
    }
}

impl Parsable for Linear {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

impl Checkpoint for Linear {
    type State = LinearState;

    fn state_dict(&self) -> LinearState {
        LinearState {
            weight: self.weight.clone(),
            bias: self.bias.clone(),
        }
    }

    fn load_state_dict(&mut self, state: LinearState) -> Result<()> {
        if state.weight.len() != self.in_channels * self.out_channels
            || state.bias.len() != self.out_channels
        {
            return Err(Error::Construction(format!(
                "state of shape ({}, {}) does not fit Linear({}, {})",
                state.weight.len(),
                state.bias.len(),
                self.in_channels,
                self.out_channels
            )));
        }
        self.weight = state.weight;
        self.bias = state.bias;
        Ok(())
    }
}

/// Training run: a model, an optimizer choice and an epoch count
#[derive(Debug)]
pub struct Params {
    pub model: Lazy,
    pub opt: Lazy,
    pub epochs: usize,
    config: Lazy,
}

impl Configurable for Params {
    const PATH: &'static str = "lazyconf::demo::Params";

    fn params() -> Vec<Param> {
        vec![
            Param::sub::<Linear>("model"),
            Param::choice::<OptimizerChoice>("opt"),
            Param::new("epochs", TypeExpr::Int).with_default(10),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            model: kwargs.require("model")?,
            opt: kwargs.require("opt")?,
            epochs: kwargs.require("epochs")?,
            config,
        })
    }
}

impl Parsable for Params {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::{build_optimizer, Adam, Sgd};
    use crate::value::Value;

    #[test]
    fn test_linear_forward() {
        let mut linear: Linear = Linear::as_lazy()
            .copy_with([("in_channels", 2), ("out_channels", 1)])
            .unwrap()
            .to_eager()
            .unwrap();
        linear
            .load_state_dict(LinearState {
                weight: vec![1.0, 2.0],
                bias: vec![0.5],
            })
            .unwrap();
        assert_eq!(linear.forward(&[3.0, 4.0]), vec![11.5]);
    }

    #[test]
    fn test_linear_rejects_bad_state() {
        let mut linear: Linear = Linear::as_lazy().to_eager().unwrap();
        let state = LinearState {
            weight: vec![0.0; 3],
            bias: vec![0.0; 2],
        };
        assert!(linear.load_state_dict(state).is_err());
        assert!(linear.set_parameters(&[]).is_err());
    }

    #[test]
    fn test_linear_rejects_empty_shape() {
        let lazy = Linear::as_lazy().copy_with([("in_channels", 0)]).unwrap();
        assert!(lazy.to_eager::<Linear>().is_err());
    }

    #[test]
    fn test_params_defaults() {
        let params: Params = Params::as_lazy().to_eager().unwrap();
        assert_eq!(params.epochs, 10);
        assert!(params.model.class().is::<Linear>());
        assert!(params.opt.class().is::<Sgd>());
    }

    #[test]
    fn test_params_build_optimizer_over_model() {
        let lazy = Params::try_parse_args_from(["train", "--opt", "ADAM", "--lr", "0.01"]).unwrap();
        let params: Params = lazy.to_eager().unwrap();
        assert!(params.opt.class().is::<Adam>());
        assert_eq!(params.opt.get("lr").unwrap(), Some(&Value::Float(0.01)));

        let linear: Linear = params.model.to_eager().unwrap();
        let optimizer = build_optimizer(&params.opt, linear.parameters()).unwrap();
        assert_eq!(optimizer.params().len(), 2);
        assert_eq!(optimizer.params()[0].len(), 8);
    }
}
