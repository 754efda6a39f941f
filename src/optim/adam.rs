//! Adam optimizer

use super::{Optimizer, Parameter};
use crate::error::{Error, Result};
use crate::lazy::{Configurable, Kwargs, Lazy, Param, Parsable};
use crate::typecheck::TypeExpr;
use crate::value::Value;

/// Moment estimates of one parameter
#[derive(Debug, Clone, Default)]
struct Moments {
    m: Vec<f32>,
    v: Vec<f32>,
    v_max: Vec<f32>,
}

/// Adam optimizer (Adaptive Moment Estimation), optionally AMSGrad
#[derive(Debug)]
pub struct Adam {
    params: Vec<Parameter>,
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    amsgrad: bool,
    t: i32,
    moments: Vec<Option<Moments>>,
    config: Lazy,
}

impl Adam {
    /// Create Adam with default parameters
    pub fn default_params(params: Vec<Parameter>, lr: f32) -> Result<Self> {
        let kwargs = Kwargs::new()
            .object("params", params)
            .value("lr", f64::from(lr));
        Lazy::of::<Self>().to_eager_with(kwargs)
    }

    pub fn betas(&self) -> (f32, f32) {
        (self.beta1, self.beta2)
    }
}

impl Configurable for Adam {
    const PATH: &'static str = "lazyconf::optim::Adam";

    fn params() -> Vec<Param> {
        vec![
            Param::new("params", TypeExpr::Opaque("Vec<Parameter>")),
            Param::new("lr", TypeExpr::Float).with_default(1e-3),
            Param::new("betas", TypeExpr::tuple_of(TypeExpr::Float, 2))
                .with_default(Value::tuple([0.9, 0.999])),
            Param::new("eps", TypeExpr::Float).with_default(1e-8),
            Param::new("weight_decay", TypeExpr::Float).with_default(0.0),
            Param::new("amsgrad", TypeExpr::Bool).with_default(false),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        let params: Vec<Parameter> = kwargs.take_object("params")?;
        let (beta1, beta2): (f32, f32) = kwargs.require("betas")?;
        if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
            return Err(Error::Construction(format!(
                "invalid betas ({beta1}, {beta2})"
            )));
        }
        Ok(Self {
            moments: vec![None; params.len()],
            params,
            lr: kwargs.require("lr")?,
            beta1,
            beta2,
            epsilon: kwargs.require("eps")?,
            weight_decay: kwargs.require("weight_decay")?,
            amsgrad: kwargs.require("amsgrad")?,
            t: 0,
            config,
        })
    }
}

impl Parsable for Adam {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

impl Optimizer for Adam {
    fn step(&mut self) {
        self.t += 1;

        // Bias correction factors
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2_sqrt = (1.0 - self.beta2.powi(self.t)).sqrt();
        let step_size = self.lr / bias1;

        for (param, moments) in self.params.iter_mut().zip(&mut self.moments) {
            let Some(grad) = &param.grad else { continue };
            let n = param.data.len();
            let state = moments.get_or_insert_with(|| Moments {
                m: vec![0.0; n],
                v: vec![0.0; n],
                v_max: vec![0.0; n],
            });

            for i in 0..n {
                let g = grad[i] + self.weight_decay * param.data[i];
                // m_t = β1 * m_{t-1} + (1 - β1) * g
                state.m[i] = self.beta1 * state.m[i] + (1.0 - self.beta1) * g;
                // v_t = β2 * v_{t-1} + (1 - β2) * g²
                state.v[i] = self.beta2 * state.v[i] + (1.0 - self.beta2) * g * g;

                let v = if self.amsgrad {
                    state.v_max[i] = state.v_max[i].max(state.v[i]);
                    state.v_max[i]
                } else {
                    state.v[i]
                };
                let denom = v.sqrt() / bias2_sqrt + self.epsilon;
                param.data[i] -= step_size * state.m[i] / denom;
            }
        }
    }

    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }

    fn into_params(self: Box<Self>) -> Vec<Parameter> {
        self.params
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quadratic(adam: &mut Adam, steps: usize) {
        for _ in 0..steps {
            let grad = adam.params()[0].data.iter().map(|x| 2.0 * x).collect();
            adam.params_mut()[0].set_grad(grad);
            adam.step();
        }
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() {
        let mut adam = Adam::default_params(vec![Parameter::new(vec![1.0, -1.0])], 0.1).unwrap();
        adam.params_mut()[0].set_grad(vec![4.0, -0.5]);
        adam.step();
        // the bias-corrected first step has magnitude lr regardless of the gradient
        assert_abs_diff_eq!(adam.params()[0].data[0], 0.9, epsilon = 1e-4);
        assert_abs_diff_eq!(adam.params()[0].data[1], -0.9, epsilon = 1e-4);
    }

    #[test]
    fn test_adam_quadratic_convergence() {
        let mut adam =
            Adam::default_params(vec![Parameter::new(vec![5.0, -3.0, 2.0])], 0.1).unwrap();
        quadratic(&mut adam, 300);
        for &val in &adam.params()[0].data {
            assert!(val.abs() < 0.5, "Value {val} did not converge");
        }
    }

    #[test]
    fn test_amsgrad_converges() {
        let lazy = Lazy::of::<Adam>()
            .copy_with([("amsgrad", Value::Bool(true)), ("lr", Value::Float(0.1))])
            .unwrap();
        let mut adam: Adam = lazy
            .to_eager_with(Kwargs::new().object("params", vec![Parameter::new(vec![4.0])]))
            .unwrap();
        quadratic(&mut adam, 300);
        assert!(adam.params()[0].data[0].abs() < 0.5);
    }

    #[test]
    fn test_adam_config_defaults() {
        let adam = Adam::default_params(Vec::new(), 1e-3).unwrap();
        let (b1, b2) = adam.betas();
        assert_abs_diff_eq!(b1, 0.9);
        assert_abs_diff_eq!(b2, 0.999);
        assert_eq!(
            adam.config().get("betas").unwrap(),
            Some(&Value::tuple([0.9, 0.999]))
        );
    }

    #[test]
    fn test_adam_rejects_invalid_betas() {
        let lazy = Lazy::of::<Adam>()
            .copy_with([("betas", Value::tuple([1.5, 0.999]))])
            .unwrap();
        let result =
            lazy.to_eager_with::<Adam>(Kwargs::new().object("params", Vec::<Parameter>::new()));
        assert!(matches!(result, Err(Error::Construction(_))));
    }
}
