use super::*;
use crate::lazy::{Bindings, Configurable, Kwargs, Param, Parsable};
use crate::testing::{DummyFlat, Grid, Inner, Inner2, Model, Outer, Outer2, Stack};
use proptest::prelude::*;

struct HelpField;

impl Configurable for HelpField {
    const PATH: &'static str = "lazyconf::parse::tests::HelpField";

    fn params() -> Vec<Param> {
        vec![Param::new("help", TypeExpr::Int).with_default(1)]
    }

    fn construct(_kwargs: Kwargs) -> Result<Self> {
        Ok(HelpField)
    }
}

fn parse(parser: ArgumentParser, args: &[&str]) -> Result<ParsedArgs> {
    parser.try_parse_from(std::iter::once("prog").chain(args.iter().copied()))
}

fn parse_root(lazy: Lazy, args: &[&str]) -> Result<Lazy> {
    let parsed = parse(ArgumentParser::new("prog").add_options(lazy), args)?;
    Ok(parsed.into_root().unwrap())
}

fn cli_kind(result: Result<impl std::fmt::Debug>) -> ErrorKind {
    match result {
        Err(Error::Cli { kind, .. }) => kind,
        other => panic!("expected a command-line error, got {other:?}"),
    }
}

fn inner_with_a(a: &str) -> Lazy {
    Inner::as_lazy_with(Bindings::new().kwarg("a", a)).unwrap()
}

// ============================================================
// Plain options
// ============================================================

#[test]
fn test_add_option_basic_types() {
    let parser = || {
        ArgumentParser::new("prog")
            .add_option("n", TypeExpr::Int, Some(Value::Int(1)))
            .add_option("rate", TypeExpr::Float, Some(Value::Float(0.5)))
            .add_option("name", TypeExpr::Str, Some(Value::from("x")))
    };

    let defaults = parse(parser(), &[]).unwrap();
    assert_eq!(defaults.get("n"), Some(&Value::Int(1)));
    assert_eq!(defaults.get("rate"), Some(&Value::Float(0.5)));
    assert_eq!(defaults.get("name"), Some(&Value::from("x")));
    assert!(defaults.roots().is_empty());

    let given = parse(parser(), &["--n", "-3", "--rate", "2", "--name", "y"]).unwrap();
    assert_eq!(given.get("n"), Some(&Value::Int(-3)));
    assert_eq!(given.get("rate"), Some(&Value::Float(2.0)));
    assert_eq!(given.get("name"), Some(&Value::from("y")));

    assert_eq!(
        cli_kind(parse(parser(), &["--n", "1.5"])),
        ErrorKind::ValueValidation
    );
}

#[test]
fn test_add_option_bool_tokens() {
    let parser = || ArgumentParser::new("prog").add_option("flag", TypeExpr::Bool, Some(Value::Bool(false)));

    for (token, expected) in [("yes", true), ("T", true), ("1", true), ("no", false), ("F", false)] {
        let parsed = parse(parser(), &["--flag", token]).unwrap();
        assert_eq!(parsed.get("flag"), Some(&Value::Bool(expected)), "{token}");
    }
    assert_eq!(
        cli_kind(parse(parser(), &["--flag", "maybe"])),
        ErrorKind::ValueValidation
    );
}

#[test]
fn test_add_option_tuples() {
    let parser = || {
        ArgumentParser::new("prog")
            .add_option(
                "sizes",
                TypeExpr::var_tuple(TypeExpr::Int),
                Some(Value::tuple([1, 2])),
            )
            .add_option("point", TypeExpr::tuple_of(TypeExpr::Float, 2), None)
    };

    let parsed = parse(parser(), &["--point", "1.5", "-2"]).unwrap();
    assert_eq!(parsed.get("sizes"), Some(&Value::tuple([1, 2])));
    assert_eq!(parsed.get("point"), Some(&Value::tuple([1.5, -2.0])));

    let parsed = parse(parser(), &["--sizes", "3", "4", "5", "--point", "0", "0"]).unwrap();
    assert_eq!(parsed.get("sizes"), Some(&Value::tuple([3, 4, 5])));

    assert!(parse(parser(), &["--point", "1.0"]).is_err());
}

#[test]
fn test_required_option_missing() {
    let parser = ArgumentParser::new("prog").add_option("n", TypeExpr::Int, None);
    assert_eq!(
        cli_kind(parse(parser, &[])),
        ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn test_add_option_rejects_unsupported_type() {
    let parser = ArgumentParser::new("prog").add_option("xs", TypeExpr::list(TypeExpr::Int), None);
    assert!(matches!(
        parse(parser, &[]),
        Err(Error::UnsupportedType { .. })
    ));
}

#[test]
fn test_help_is_reported() {
    let parser = ArgumentParser::new("prog")
        .with_about("toy trainer")
        .add_options(Model::as_lazy());
    assert_eq!(cli_kind(parse(parser, &["--help"])), ErrorKind::DisplayHelp);
}

#[test]
fn test_field_named_help_is_rejected() {
    assert!(matches!(
        parse_root(Lazy::of::<HelpField>(), &[]),
        Err(Error::StructuralMismatch(_))
    ));
}

// ============================================================
// Configuration roots
// ============================================================

#[test]
fn test_add_options_flat() {
    let lazy = parse_root(DummyFlat::as_lazy(), &["--b", "x"]).unwrap();
    assert_eq!(
        lazy,
        DummyFlat::as_lazy_with(Bindings::new().kwarg("b", "x")).unwrap()
    );

    let lazy = parse_root(DummyFlat::as_lazy(), &["--b", "x", "--c", "0.25"]).unwrap();
    assert_eq!(lazy.get("c").unwrap(), Some(&Value::Float(0.25)));

    assert_eq!(
        cli_kind(parse_root(DummyFlat::as_lazy(), &[])),
        ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn test_add_options_nested() {
    let lazy = parse_root(Outer::as_lazy(), &["--a", "s", "--d", "bye"]).unwrap();
    assert_eq!(
        lazy,
        Outer::as_lazy()
            .copy_with([("c.a", "s"), ("d", "bye")])
            .unwrap()
    );
}

#[test]
fn test_full_path_alias_is_accepted() {
    let short = parse_root(Outer::as_lazy(), &["--a", "s"]).unwrap();
    let full = parse_root(Outer::as_lazy(), &["--c.a", "s"]).unwrap();
    assert_eq!(short, full);
}

#[test]
fn test_equals_form_and_last_occurrence_wins() {
    let lazy = parse_root(Outer::as_lazy(), &["--a=s", "--d", "one", "--d=two"]).unwrap();
    assert_eq!(lazy.get("d").unwrap(), Some(&Value::from("two")));
}

#[test]
fn test_cli_matches_copy_with() {
    let lazy = parse_root(Model::as_lazy(), &["--y", "4", "--z", "7", "8", "--x", "2"]).unwrap();
    let expected = Model::as_lazy()
        .copy_with([
            ("x", Value::Int(2)),
            ("sub.y", Value::Int(4)),
            ("sub.z", Value::tuple([7, 8])),
        ])
        .unwrap();
    assert_eq!(lazy, expected);

    let model: Model = lazy.to_eager().unwrap();
    assert_eq!(model.sub.z, vec![7, 8]);
}

#[test]
fn test_nested_tuple_fields_keep_their_value() {
    let grid = Lazy::of::<Grid>();
    let lazy = parse_root(grid.clone(), &["--scale", "2.0"]).unwrap();
    assert_eq!(lazy, grid.copy_with([("scale", 2.0)]).unwrap());
    assert_eq!(lazy.get("points").unwrap(), grid.get("points").unwrap());

    assert_eq!(
        cli_kind(parse_root(grid, &["--points", "1", "2"])),
        ErrorKind::UnknownArgument
    );
}

#[test]
fn test_named_roots_and_plain_options() {
    let parser = ArgumentParser::new("prog")
        .add_options_as("model", Model::as_lazy())
        .add_options_as("outer", Outer::as_lazy())
        .add_option("seed", TypeExpr::Int, Some(Value::Int(0)));

    let parsed = parse(parser, &["--x", "2", "--a", "q", "--seed", "7"]).unwrap();
    assert_eq!(parsed.get("seed"), Some(&Value::Int(7)));
    assert_eq!(
        parsed.root("model").unwrap(),
        &Model::as_lazy().copy_with([("x", 2)]).unwrap()
    );
    assert_eq!(
        parsed.root("outer").unwrap(),
        &Outer::as_lazy().copy_with([("c.a", "q")]).unwrap()
    );
    assert!(parsed.root(UNNAMED_ROOT).is_none());
}

#[test]
fn test_shared_leaves_need_longer_flags() {
    let parser = || {
        ArgumentParser::new("prog")
            .add_options_as("left", Outer::as_lazy())
            .add_options_as("right", Outer::as_lazy())
    };

    let parsed = parse(
        parser(),
        &["--left.c.a", "l", "--right.c.a", "r", "--right.d", "bye"],
    )
    .unwrap();
    assert_eq!(
        parsed.root("left").unwrap(),
        &Outer::as_lazy().copy_with([("c.a", "l")]).unwrap()
    );
    assert_eq!(
        parsed.root("right").unwrap(),
        &Outer::as_lazy()
            .copy_with([("c.a", "r"), ("d", "bye")])
            .unwrap()
    );

    assert!(parse(parser(), &["--c.a", "l"]).is_err());
}

// ============================================================
// Choices
// ============================================================

#[test]
fn test_choice_default_alternative() {
    let lazy = Outer2::try_parse_args_from(["prog", "--a", "z"]).unwrap();
    assert_eq!(
        lazy,
        Outer2::as_lazy_with(Bindings::new().kwarg("c", inner_with_a("z"))).unwrap()
    );
}

#[test]
fn test_choice_selects_alternative() {
    let expected = Outer2::as_lazy_with(Bindings::new().kwarg(
        "c",
        Inner2::as_lazy_with(Bindings::new().kwarg("aa", "something")).unwrap(),
    ))
    .unwrap();

    for args in [
        ["prog", "--c", "I2", "--c.aa", "something"],
        ["prog", "--c", "I2", "--aa", "something"],
        ["prog", "--aa", "something", "--c", "I2"],
        ["prog", "--c=I2", "--aa=something", "--d", "hello"],
    ] {
        assert_eq!(Outer2::try_parse_args_from(args).unwrap(), expected, "{args:?}");
    }
}

#[test]
fn test_choice_prunes_inactive_alternatives() {
    assert_eq!(
        cli_kind(Outer2::try_parse_args_from(["prog", "--c", "I2", "--a", "z"])),
        ErrorKind::UnknownArgument
    );
    assert_eq!(
        cli_kind(Outer2::try_parse_args_from(["prog", "--a", "z", "--aa", "x"])),
        ErrorKind::UnknownArgument
    );
}

#[test]
fn test_choice_rejects_unknown_alternative() {
    match Outer2::try_parse_args_from(["prog", "--c", "I3", "--a", "z"]) {
        Err(Error::InvalidChoice { given, choices, .. }) => {
            assert_eq!(given, "I3");
            assert_eq!(choices, ["I1", "I2"]);
        }
        other => panic!("expected invalid choice, got {other:?}"),
    }
}

#[test]
fn test_nested_choices() {
    let stack = Lazy::of::<Stack>();

    let lazy = parse_root(stack.clone(), &["--s", "MODEL", "--x", "3", "--verbose", "yes"]).unwrap();
    let expected = Lazy::from_class::<Stack>(
        Bindings::new()
            .kwarg("s", Model::as_lazy().copy_with([("x", 3)]).unwrap())
            .kwarg("verbose", true),
    )
    .unwrap();
    assert_eq!(lazy, expected);

    let lazy = parse_root(stack.clone(), &["--c", "I2", "--aa", "q"]).unwrap();
    let outer2 = Outer2::as_lazy_with(Bindings::new().kwarg(
        "c",
        Inner2::as_lazy_with(Bindings::new().kwarg("aa", "q")).unwrap(),
    ))
    .unwrap();
    assert_eq!(
        lazy,
        Lazy::from_class::<Stack>(Bindings::new().kwarg("s", outer2)).unwrap()
    );

    assert!(parse_root(stack, &["--s", "MODEL", "--a", "z"]).is_err());
}

#[test]
fn test_choice_current_value_is_the_default_selection() {
    let outer2 = Outer2::as_lazy_with(Bindings::new().kwarg(
        "c",
        Inner2::as_lazy_with(Bindings::new().kwarg("aa", "preset")).unwrap(),
    ))
    .unwrap();

    let lazy = parse_root(outer2.clone(), &[]).unwrap();
    assert_eq!(lazy, outer2);

    let lazy = parse_root(outer2, &["--c", "I1", "--a", "z"]).unwrap();
    assert_eq!(lazy.choice("c").unwrap().variant, inner_with_a("z"));
}

// ============================================================
// Properties
// ============================================================

fn arb_paths() -> impl Strategy<Value = Vec<FieldPath>> {
    proptest::collection::btree_set(
        proptest::collection::vec(prop_oneof!["a", "b", "c", "lr", "dim"], 1..4),
        1..12,
    )
    .prop_map(|set| {
        set.into_iter()
            .map(|segments| FieldPath::from_segments(segments.into_iter().map(String::from)))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_shorten_is_a_bijection(paths in arb_paths()) {
        let aliases = shorten(&paths).unwrap();
        prop_assert_eq!(aliases.len(), paths.len());
        for path in &paths {
            let alias = aliases.alias_of(path).unwrap();
            prop_assert!(path.join().ends_with(alias));
            prop_assert_eq!(aliases.path_of(alias), Some(path));
        }
    }

    #[test]
    fn test_str2bool_ignores_case(
        token in prop_oneof!["yes", "true", "t", "y", "1", "no", "false", "f", "n", "0"],
        upper in any::<bool>(),
    ) {
        let expected = str2bool(&token).unwrap();
        let cased = if upper { token.to_uppercase() } else { token.clone() };
        prop_assert_eq!(str2bool(&cased), Ok(expected));
    }
}
