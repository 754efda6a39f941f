//! Stochastic Gradient Descent optimizer

use super::{Optimizer, Parameter};
use crate::error::{Error, Result};
use crate::lazy::{Configurable, Kwargs, Lazy, Param, Parsable};
use crate::typecheck::TypeExpr;

/// SGD with optional momentum, dampening, weight decay and Nesterov updates
#[derive(Debug)]
pub struct Sgd {
    params: Vec<Parameter>,
    lr: f32,
    momentum: f32,
    dampening: f32,
    weight_decay: f32,
    nesterov: bool,
    velocities: Vec<Option<Vec<f32>>>,
    config: Lazy,
}

impl Sgd {
    pub fn new(params: Vec<Parameter>, lr: f32, momentum: f32) -> Result<Self> {
        let kwargs = Kwargs::new()
            .object("params", params)
            .value("lr", f64::from(lr))
            .value("momentum", f64::from(momentum));
        Lazy::of::<Self>().to_eager_with(kwargs)
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn nesterov(&self) -> bool {
        self.nesterov
    }
}

impl Configurable for Sgd {
    const PATH: &'static str = "lazyconf::optim::Sgd";

    fn params() -> Vec<Param> {
        vec![
            Param::new("params", TypeExpr::Opaque("Vec<Parameter>")),
            Param::new("lr", TypeExpr::Float).with_default(1e-3),
            Param::new("momentum", TypeExpr::Float).with_default(0.0),
            Param::new("dampening", TypeExpr::Float).with_default(0.0),
            Param::new("weight_decay", TypeExpr::Float).with_default(0.0),
            Param::new("nesterov", TypeExpr::Bool).with_default(false),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        let params: Vec<Parameter> = kwargs.take_object("params")?;
        let sgd = Self {
            velocities: vec![None; params.len()],
            params,
            lr: kwargs.require("lr")?,
            momentum: kwargs.require("momentum")?,
            dampening: kwargs.require("dampening")?,
            weight_decay: kwargs.require("weight_decay")?,
            nesterov: kwargs.require("nesterov")?,
            config,
        };
        if sgd.lr < 0.0 {
            return Err(Error::Construction(format!("invalid learning rate {}", sgd.lr)));
        }
        if sgd.nesterov && (sgd.momentum <= 0.0 || sgd.dampening != 0.0) {
            return Err(Error::Construction(
                "Nesterov momentum requires a momentum and zero dampening".to_string(),
            ));
        }
        Ok(sgd)
    }
}

impl Parsable for Sgd {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

impl Optimizer for Sgd {
    fn step(&mut self) {
        for (param, velocity) in self.params.iter_mut().zip(&mut self.velocities) {
            let Some(grad) = &param.grad else { continue };

            // d = g + wd * p
            let mut d: Vec<f32> = grad
                .iter()
                .zip(&param.data)
                .map(|(g, p)| g + self.weight_decay * p)
                .collect();

            if self.momentum != 0.0 {
                let buf = match velocity.take() {
                    // v = momentum * v + (1 - dampening) * d
                    Some(mut v) => {
                        for (v, d) in v.iter_mut().zip(&d) {
                            *v = self.momentum * *v + (1.0 - self.dampening) * d;
                        }
                        v
                    }
                    None => d.clone(),
                };
                if self.nesterov {
                    for (d, v) in d.iter_mut().zip(&buf) {
                        *d += self.momentum * v;
                    }
                } else {
                    d.clone_from(&buf);
                }
                *velocity = Some(buf);
            }

            for (p, d) in param.data.iter_mut().zip(&d) {
                *p -= self.lr * d;
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
