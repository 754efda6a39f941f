//! Integration tests: command line, dict and file forms of one configuration

use lazyconf::demo::{Linear, Params};
use lazyconf::io::{load_config, save_config, Checkpoint};
use lazyconf::optim::{build_optimizer, Adam, OptimizerChoice, Sgd};
use lazyconf::parse::ArgumentParser;
use lazyconf::testing::{Model, Outer2};
use lazyconf::{Bindings, Choices, DictOptions, Error, Parsable, TypeExpr, Value};
use std::process::Command;
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lazyconf"))
}

#[test]
fn test_cli_equals_copy_with() {
    let parsed = Params::try_parse_args_from([
        "train",
        "--opt",
        "ADAM",
        "--lr",
        "0.05",
        "--betas",
        "0.8",
        "0.99",
        "--out_channels",
        "3",
        "--epochs",
        "2",
    ])
    .unwrap();

    let adam = OptimizerChoice::select("ADAM")
        .unwrap()
        .copy_with([
            ("lr", Value::Float(0.05)),
            ("betas", Value::tuple([0.8, 0.99])),
        ])
        .unwrap();
    let expected = Params::as_lazy_with(Bindings::new().kwarg("opt", adam))
        .unwrap()
        .copy_with([("model.out_channels", 3), ("epochs", 2)])
        .unwrap();
    assert_eq!(parsed, expected);
}

#[test]
fn test_cli_file_and_dict_agree() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("params.yaml");

    let parsed = Params::try_parse_args_from(["train", "--momentum", "0.9", "--in_channels", "6"])
        .unwrap();
    save_config(&path, &parsed).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, parsed);

    let flat = parsed
        .to_dict(DictOptions::tagged().with_flatten(true))
        .unwrap();
    assert_eq!(Params::from_dict(&flat).unwrap(), parsed);

    let params: Params = loaded.to_eager().unwrap();
    assert!(params.opt.class().is::<Sgd>());
    let linear: Linear = params.model.to_eager().unwrap();
    assert_eq!(linear.in_channels, 6);
}

#[test]
fn test_eager_tree_keeps_its_configuration() {
    let lazy = Params::try_parse_args_from(["train", "--opt", "ADAM"]).unwrap();
    let params: Params = lazy.to_eager().unwrap();
    assert_eq!(params.config(), &lazy);

    let linear: Linear = params.model.to_eager().unwrap();
    let optimizer = build_optimizer(&params.opt, linear.parameters()).unwrap();
    assert!((optimizer.lr() - 1e-3).abs() < 1e-9);
    assert!(params.opt.class().is::<Adam>());
}

#[test]
fn test_named_roots_share_one_command_line() {
    let parsed = ArgumentParser::new("prog")
        .add_options_as("model", Model::as_lazy())
        .add_options_as("run", Outer2::as_lazy())
        .add_option("seed", TypeExpr::Int, Some(Value::Int(0)))
        .try_parse_from(["prog", "--y", "4", "--c", "I2", "--aa", "v", "--seed", "3"])
        .unwrap();

    assert_eq!(
        parsed.root("model").unwrap(),
        &Model::as_lazy().copy_with([("sub.y", 4)]).unwrap()
    );
    assert_eq!(parsed.root("run").unwrap().choice("c").unwrap().tag, "I2");
    assert_eq!(parsed.get("seed"), Some(&Value::Int(3)));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        Params::try_parse_args_from(["train", "--opt", "RMSPROP"]),
        Err(Error::InvalidChoice { .. })
    ));
    assert!(matches!(
        Params::try_parse_args_from(["train", "--epochs", "many"]),
        Err(Error::Cli { .. })
    ));
    assert!(matches!(
        Params::try_parse_args_from(["train", "--betas", "0.8", "0.99"]),
        Err(Error::Cli { .. })
    ));
}

#[test]
fn test_checkpoint_after_training_config() {
    let dir = TempDir::new().unwrap();
    let lazy = Linear::as_lazy().copy_with([("out_channels", 1)]).unwrap();
    let linear: Linear = lazy.to_eager().unwrap();
    linear.to_checkpoint(dir.path()).unwrap();

    let restored = Linear::from_checkpoint(dir.path()).unwrap();
    assert_eq!(restored.state_dict(), linear.state_dict());
    assert_eq!(restored.config(), &lazy);
}

#[test]
fn test_binary_dry_run_prints_configuration() {
    let output = bin()
        .args(["--dry_run", "yes", "--opt", "ADAM", "--epochs", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Params("));
    assert!(stdout.contains("opt=Adam("));
    assert!(stdout.contains("epochs=3,"));
}

#[test]
fn test_binary_trains_and_saves_checkpoint() {
    let dir = TempDir::new().unwrap();
    let output = bin()
        .args(["--epochs", "5", "--lr", "0.1", "--checkpoint"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Final loss"));

    let restored = Linear::from_checkpoint(dir.path()).unwrap();
    assert_eq!(restored.out_channels, 2);
}

#[test]
fn test_binary_exit_codes() {
    let help = bin().arg("--help").output().unwrap();
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("--out_channels"));

    let bad = bin().args(["--opt", "RMSPROP"]).output().unwrap();
    assert_eq!(bad.status.code(), Some(2));

    let unknown = bin().arg("--nope").output().unwrap();
    assert_eq!(unknown.status.code(), Some(2));
}
