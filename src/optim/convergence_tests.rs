//! Property-based convergence tests for optimizers
//!
//! Optimizers are built from their configurations, then run on
//! f(x) = x², which is convex with its optimum at the origin.

#[cfg(test)]
mod tests {
    use crate::lazy::Choices;
    use crate::optim::*;
    use crate::value::Value;
    use proptest::prelude::*;

    fn configured(choice: &str, changes: Vec<(&str, Value)>) -> Box<dyn Optimizer> {
        let config = OptimizerChoice::select(choice)
            .unwrap()
            .copy_with(changes)
            .unwrap();
        build_optimizer(&config, vec![Parameter::new(vec![3.0, -2.0, 1.5, -2.5])]).unwrap()
    }

    /// Whether the optimizer converges on f(x) = x²
    fn converges_quadratic(optimizer: &mut dyn Optimizer, iterations: usize, threshold: f32) -> bool {
        for _ in 0..iterations {
            // ∇(x²) = 2x
            let grad = optimizer.params()[0].data.iter().map(|x| 2.0 * x).collect();
            optimizer.params_mut()[0].set_grad(grad);
            optimizer.step();
        }
        optimizer.params()[0].data.iter().all(|val| val.abs() < threshold)
    }

    fn loss(optimizer: &dyn Optimizer) -> f32 {
        optimizer.params()[0].data.iter().map(|x| x * x).sum()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_sgd_converges_quadratic(lr in 0.01f64..0.4, momentum in 0.0f64..0.9) {
            let mut sgd = configured("SGD", vec![
                ("lr", Value::Float(lr)),
                ("momentum", Value::Float(momentum)),
            ]);
            prop_assert!(converges_quadratic(sgd.as_mut(), 300, 1.0));
        }

        #[test]
        fn prop_adam_converges_quadratic(lr in 0.05f64..0.5) {
            let mut adam = configured("ADAM", vec![("lr", Value::Float(lr))]);
            prop_assert!(converges_quadratic(adam.as_mut(), 300, 1.5));
        }

        #[test]
        fn prop_plain_sgd_decreases_loss(lr in 0.01f64..0.4) {
            let mut sgd = configured("SGD", vec![("lr", Value::Float(lr))]);
            let mut previous = loss(sgd.as_ref());
            for _ in 0..50 {
                let grad = sgd.params()[0].data.iter().map(|x| 2.0 * x).collect();
                sgd.params_mut()[0].set_grad(grad);
                sgd.step();
                let current = loss(sgd.as_ref());
                prop_assert!(current <= previous + 1e-6);
                previous = current;
            }
        }

        #[test]
        fn prop_zero_grad_freezes_params(lr in 0.01f64..0.5) {
            let mut adam = configured("ADAM", vec![("lr", Value::Float(lr))]);
            let before = adam.params()[0].data.clone();
            adam.zero_grad();
            adam.step();
            prop_assert_eq!(&adam.params()[0].data, &before);
        }
    }

    #[test]
    fn test_configured_values_reach_the_optimizer() {
        let sgd = configured("SGD", vec![("lr", Value::Float(0.25))]);
        assert!((sgd.lr() - 0.25).abs() < 1e-6);
    }
}
