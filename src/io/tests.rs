//! Integration tests for configuration I/O

use super::*;
use crate::demo::{Linear, LinearState, Params};
use crate::error::Error;
use crate::lazy::{Bindings, DictOptions, Kwargs, Parsable};
use crate::optim::OptimizerChoice;
use crate::testing::{Inner2, Outer2};
use crate::Choices;
use tempfile::TempDir;

#[test]
fn test_full_workflow_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("params.yaml");

    let lazy = Params::as_lazy()
        .copy_with([("model.out_channels", 3), ("epochs", 4)])
        .unwrap();
    save_config(&path, &lazy).unwrap();

    assert_eq!(load_config(&path).unwrap(), lazy);
}

#[test]
fn test_full_workflow_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("params.json");

    let adam = OptimizerChoice::select("ADAM").unwrap();
    let lazy = Params::as_lazy_with(Bindings::new().kwarg("opt", adam)).unwrap();
    save_config(&path, &lazy).unwrap();

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, lazy);
    assert_eq!(loaded.choice("opt").unwrap().tag, "ADAM");
}

#[test]
fn test_flat_dict_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flat.yml");

    let i2 = Inner2::as_lazy_with(Bindings::new().kwarg("aa", "x")).unwrap();
    let lazy = Outer2::as_lazy_with(Bindings::new().kwarg("c", i2)).unwrap();
    let flat = lazy
        .to_dict(DictOptions::tagged().with_flatten(true))
        .unwrap();
    save_dict(&path, &flat).unwrap();

    assert_eq!(load_dict(&path).unwrap().len(), flat.len());
    assert_eq!(load_config(&path).unwrap(), lazy);
}

#[test]
fn test_checkpoint_round_trip() {
    let dir = TempDir::new().unwrap();
    let lazy = Linear::as_lazy().copy_with([("in_channels", 3)]).unwrap();
    let mut linear: Linear = lazy.to_eager().unwrap();
    linear
        .load_state_dict(LinearState {
            weight: vec![0.5; 6],
            bias: vec![1.0, -1.0],
        })
        .unwrap();

    linear.to_checkpoint(dir.path()).unwrap();
    assert!(dir.path().join(CONFIG_FILE).exists());
    assert!(dir.path().join(WEIGHTS_FILE).exists());

    let restored = Linear::from_checkpoint(dir.path()).unwrap();
    assert_eq!(restored.config(), &lazy);
    assert_eq!(restored.state_dict(), linear.state_dict());
    assert_eq!(restored.forward(&[1.0, 1.0, 1.0]), vec![2.5, 0.5]);
}

#[test]
fn test_checkpoint_of_other_class_is_rejected() {
    let dir = TempDir::new().unwrap();
    save_config(dir.path().join(CONFIG_FILE), &Params::as_lazy()).unwrap();
    std::fs::write(dir.path().join(WEIGHTS_FILE), "{}").unwrap();

    assert!(matches!(
        Linear::from_checkpoint(dir.path()),
        Err(Error::StructuralMismatch(_))
    ));
}

#[test]
fn test_checkpoint_missing_weights() {
    let dir = TempDir::new().unwrap();
    save_config(dir.path().join(CONFIG_FILE), &Linear::as_lazy()).unwrap();
    assert!(matches!(
        Linear::from_checkpoint(dir.path()),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_checkpoint_with_runtime_overrides() {
    let dir = TempDir::new().unwrap();
    let lazy = Linear::as_lazy();
    let linear: Linear = lazy.to_eager().unwrap();
    linear.to_checkpoint(dir.path()).unwrap();

    let wider =
        Linear::from_checkpoint_with(dir.path(), Kwargs::new().value("out_channels", 3));
    // the saved weights no longer fit the overridden shape
    assert!(matches!(wider, Err(Error::Construction(_))));
}
