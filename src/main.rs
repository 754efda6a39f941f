//! Lazyconf demo CLI
//!
//! Fits a linear model to a synthetic regression target with an optimizer
//! picked on the command line. Every field of the training parameters is a
//! flag.
//!
//! # Usage
//!
//! ```bash
//! # Train with defaults (SGD)
//! lazyconf
//!
//! # Switch optimizer and override its fields
//! lazyconf --opt ADAM --lr 0.05 --betas 0.8 0.99 --epochs 50
//!
//! # Resize the model and keep the result
//! lazyconf --in_channels 8 --checkpoint runs/linear
//!
//! # Only print the resolved configuration
//! lazyconf --dry_run yes
//! ```

use lazyconf::demo::{Linear, Params};
use lazyconf::io::Checkpoint;
use lazyconf::optim::{build_optimizer, Optimizer};
use lazyconf::parse::ArgumentParser;
use lazyconf::{Lazy, Parsable, Result, TypeExpr, Value};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLES: usize = 32;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let parsed = ArgumentParser::new("lazyconf")
        .with_about("Train a linear model with a configurable optimizer")
        .add_options(Params::as_lazy())
        .add_option("checkpoint", TypeExpr::Str, Some(Value::from("")))
        .add_option("dry_run", TypeExpr::Bool, Some(Value::Bool(false)))
        .parse_args();

    let checkpoint = parsed
        .get("checkpoint")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let dry_run = matches!(parsed.get("dry_run"), Some(Value::Bool(true)));
    let Some(config) = parsed.into_root() else {
        eprintln!("Error: no training parameters were parsed");
        return ExitCode::FAILURE;
    };

    println!("{config}");
    if dry_run {
        return ExitCode::SUCCESS;
    }

    match run_train(&config, &checkpoint) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Inputs on a fixed grid and targets from a fixed linear map
fn dataset(in_channels: usize, out_channels: usize) -> Vec<(Vec<f32>, Vec<f32>)> {
    (0..SAMPLES)
        .map(|n| {
            let x: Vec<f32> = (0..in_channels)
                .map(|i| ((n * 3 + i * 5) % 7) as f32 / 7.0 - 0.5)
                .collect();
            let y = (0..out_channels)
                .map(|o| {
                    x.iter()
                        .enumerate()
                        .map(|(i, x)| x * ((o + i) % 3) as f32)
                        .sum::<f32>()
                        + 0.1 * o as f32
                })
                .collect();
            (x, y)
        })
        .collect()
}

/// Mean squared error and its gradients with respect to weight and bias
fn mse_grad(linear: &Linear, data: &[(Vec<f32>, Vec<f32>)]) -> (f32, Vec<f32>, Vec<f32>) {
    let (n_in, n_out) = (linear.in_channels, linear.out_channels);
    let scale = 1.0 / data.len() as f32;
    let mut loss = 0.0;
    let mut d_weight = vec![0.0; n_in * n_out];
    let mut d_bias = vec![0.0; n_out];

    for (x, target) in data {
        for (o, (y, t)) in linear.forward(x).iter().zip(target).enumerate() {
            let err = y - t;
            loss += 0.5 * err * err * scale;
            d_bias[o] += err * scale;
            for (i, x) in x.iter().enumerate() {
                d_weight[o * n_in + i] += err * x * scale;
            }
        }
    }
    (loss, d_weight, d_bias)
}

fn run_train(config: &Lazy, checkpoint: &str) -> Result<()> {
    let params: Params = config.to_eager()?;
    let mut linear: Linear = params.model.to_eager()?;
    let mut optimizer = build_optimizer(&params.opt, linear.parameters())?;
    let data = dataset(linear.in_channels, linear.out_channels);

    info!(
        optimizer = params.opt.class().name(),
        lr = optimizer.lr(),
        epochs = params.epochs,
        "training"
    );
    for epoch in 0..params.epochs {
        linear.set_parameters(optimizer.params())?;
        let (loss, d_weight, d_bias) = mse_grad(&linear, &data);
        optimizer.zero_grad();
        optimizer.params_mut()[0].set_grad(d_weight);
        optimizer.params_mut()[1].set_grad(d_bias);
        optimizer.step();
        info!(epoch, loss, "step");
    }
    linear.set_parameters(&optimizer.into_params())?;

    let (loss, _, _) = mse_grad(&linear, &data);
    println!("Final loss: {loss:.6}");

    if !checkpoint.is_empty() {
        linear.to_checkpoint(checkpoint)?;
        println!("Saved checkpoint to {checkpoint}");
    }
    Ok(())
}
