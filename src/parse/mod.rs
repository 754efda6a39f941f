//! Command-line flags for lazy configurations
//!
//! Every configurable leaf of a registered root becomes one `--flag`,
//! registered under its shortest unique trailing suffix (the full dotted
//! path stays accepted as a hidden alias). Choice fields add a
//! discriminator flag; only the selected alternative's fields are exposed.
//!
//! ```
//! use lazyconf::parse::ArgumentParser;
//! use lazyconf::demo::Linear;
//! use lazyconf::{Lazy, Parsable, Value};
//!
//! let parsed = ArgumentParser::new("demo")
//!     .add_options(Linear::as_lazy())
//!     .try_parse_from(["demo", "--out_channels", "8"])
//!     .unwrap();
//! let linear = parsed.into_root().unwrap();
//! assert_eq!(linear.get("out_channels").unwrap(), Some(&Value::Int(8)));
//! ```

mod flags;
mod trie;

#[cfg(test)]
mod tests;

pub use flags::str2bool;
pub use trie::{shorten, FlagAliases};

use crate::error::{Error, Result};
use crate::lazy::{ConfigDict, Entry, Lazy, TYPE_TAG};
use crate::path::FieldPath;
use crate::typecheck::{is_bool_type, is_flat_tuple_type, is_primitive_type, tuple_inner_type, Arity, TypeExpr};
use crate::value::Value;
use clap::builder::PossibleValuesParser;
use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use flags::{current_selections, is_active, FlagKind, RootFlags, Selections};
use std::collections::BTreeMap;
use std::ffi::OsString;
use tracing::debug;

/// Name of the unnamed root registered by [`ArgumentParser::add_options`]
pub const UNNAMED_ROOT: &str = "";

/// Flags reserved by the parser itself
const RESERVED_FLAGS: [&str; 1] = ["help"];

/// Upper bound on discriminator pre-scan rounds
const MAX_SELECTION_ROUNDS: usize = 32;

struct Root {
    name: String,
    lazy: Lazy,
    flags: RootFlags,
}

impl Root {
    fn prefix(&self) -> FieldPath {
        if self.name.is_empty() {
            FieldPath::root()
        } else {
            FieldPath::from_segments([self.name.clone()])
        }
    }

    fn full_path(&self, path: &FieldPath) -> FieldPath {
        FieldPath::from_segments(
            self.prefix()
                .segments()
                .iter()
                .chain(path.segments())
                .cloned(),
        )
    }
}

/// A flag outside any configuration root
struct PlainOption {
    name: String,
    annotation: TypeExpr,
    default: Option<Value>,
}

/// Identifies an active flag during parsing
#[derive(Debug, Clone, Copy)]
enum Owner {
    Root { root: usize, flag: usize },
    Plain(usize),
}

struct ActiveFlag {
    owner: Owner,
    full: FieldPath,
    kind: FlagKind,
    value: Option<Value>,
}

/// Result of a successful parse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    roots: BTreeMap<String, Lazy>,
    values: BTreeMap<String, Value>,
}

impl ParsedArgs {
    /// Rebuilt configuration of root `name`
    pub fn root(&self, name: &str) -> Option<&Lazy> {
        self.roots.get(name)
    }

    /// Value of plain option `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn roots(&self) -> &BTreeMap<String, Lazy> {
        &self.roots
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// The unnamed root
    pub fn into_root(mut self) -> Option<Lazy> {
        self.roots.remove(UNNAMED_ROOT)
    }
}

/// Builds a command line from lazy configurations
pub struct ArgumentParser {
    name: String,
    about: Option<String>,
    roots: Vec<(String, Lazy)>,
    options: Vec<PlainOption>,
}

impl ArgumentParser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            roots: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Expose the fields of `lazy` at the top level
    pub fn add_options(self, lazy: Lazy) -> Self {
        self.add_options_as(UNNAMED_ROOT, lazy)
    }

    /// Expose the fields of `lazy` under `name.`
    pub fn add_options_as(mut self, name: impl Into<String>, lazy: Lazy) -> Self {
        self.roots.push((name.into(), lazy));
        self
    }

    /// A plain flag whose value is passed through unchanged
    pub fn add_option(
        mut self,
        name: impl Into<String>,
        annotation: TypeExpr,
        default: Option<Value>,
    ) -> Self {
        self.options.push(PlainOption {
            name: name.into(),
            annotation,
            default,
        });
        self
    }

    /// Parse the process arguments, printing usage and exiting on error
    pub fn parse_args(&self) -> ParsedArgs {
        self.try_parse_from(std::env::args_os())
            .unwrap_or_else(|e| exit_with(e))
    }

    /// Parse `argv`; the first element is the program name
    pub fn try_parse_from<I, T>(&self, argv: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv: Vec<String> = argv
            .into_iter()
            .map(|arg| arg.into().to_string_lossy().into_owned())
            .collect();

        let roots = self.collect_roots()?;
        let plain_kinds = self
            .options
            .iter()
            .map(plain_kind)
            .collect::<Result<Vec<_>>>()?;

        let selections = resolve_selections(&roots, &argv)?;
        let active = self.active_flags(&roots, &plain_kinds, &selections);
        let aliases = shorten(&active.iter().map(|f| f.full.clone()).collect::<Vec<_>>())?;
        let matches = self.command(&active, &aliases)?.try_get_matches_from(&argv)?;

        let mut parsed = ParsedArgs::default();
        let mut flat: Vec<ConfigDict> = roots
            .iter()
            .map(|root| {
                let mut dict = ConfigDict::new();
                dict.insert(
                    TYPE_TAG.to_string(),
                    Entry::Class(root.lazy.class().path().to_string()),
                );
                for tag in &root.flags.tags {
                    if is_active(&tag.branches, &selections[&root.name]) {
                        dict.insert(
                            tag.path.child(TYPE_TAG).join(),
                            Entry::Class(tag.class.to_string()),
                        );
                    }
                }
                for spec in &root.flags.flags {
                    if let (FlagKind::Skipped, Some(value)) = (&spec.kind, &spec.value) {
                        if is_active(&spec.branches, &selections[&root.name]) {
                            dict.insert(spec.path.join(), Entry::Value(value.clone()));
                        }
                    }
                }
                dict
            })
            .collect();

        for flag in &active {
            let value = match read_value(&matches, flag)? {
                Some(value) => Some(value),
                None => flag.value.clone(),
            };
            let Some(value) = value else { continue };
            match flag.owner {
                Owner::Root { root, flag: index } => {
                    let spec = &roots[root].flags.flags[index];
                    if !matches!(spec.kind, FlagKind::Discriminator { .. }) {
                        flat[root].insert(spec.path.join(), Entry::Value(value));
                    }
                }
                Owner::Plain(index) => {
                    parsed.values.insert(self.options[index].name.clone(), value);
                }
            }
        }

        for (root, dict) in roots.iter().zip(flat) {
            debug!(root = %root.name, "rebuilding configuration from command line");
            parsed.roots.insert(root.name.clone(), Lazy::from_dict(&dict)?);
        }
        Ok(parsed)
    }

    fn collect_roots(&self) -> Result<Vec<Root>> {
        self.roots
            .iter()
            .map(|(name, lazy)| {
                Ok(Root {
                    name: name.clone(),
                    lazy: lazy.clone(),
                    flags: RootFlags::collect(lazy)?,
                })
            })
            .collect()
    }

    fn active_flags(
        &self,
        roots: &[Root],
        plain_kinds: &[FlagKind],
        selections: &BTreeMap<String, Selections>,
    ) -> Vec<ActiveFlag> {
        let mut active = Vec::new();
        for (r, root) in roots.iter().enumerate() {
            for (i, spec) in root.flags.flags.iter().enumerate() {
                if matches!(spec.kind, FlagKind::Skipped)
                    || !is_active(&spec.branches, &selections[&root.name])
                {
                    continue;
                }
                active.push(ActiveFlag {
                    owner: Owner::Root { root: r, flag: i },
                    full: root.full_path(&spec.path),
                    kind: spec.kind.clone(),
                    value: spec.value.clone(),
                });
            }
        }
        for (i, (option, kind)) in self.options.iter().zip(plain_kinds).enumerate() {
            active.push(ActiveFlag {
                owner: Owner::Plain(i),
                full: FieldPath::from_segments([option.name.clone()]),
                kind: kind.clone(),
                value: option.default.clone(),
            });
        }
        active
    }

    fn command(&self, active: &[ActiveFlag], aliases: &FlagAliases) -> Result<Command> {
        let mut command = Command::new(self.name.clone()).args_override_self(true);
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for flag in active {
            let full = flag.full.join();
            let long = aliases.alias_of(&flag.full).unwrap_or(&full).to_string();
            if RESERVED_FLAGS.contains(&long.as_str()) {
                return Err(Error::StructuralMismatch(format!(
                    "field '{full}' collides with the built-in --{long} flag"
                )));
            }

            let mut arg = Arg::new(full.clone()).long(long.clone()).action(ArgAction::Set);
            if long != full {
                arg = arg.alias(full.clone());
            }
            arg = match &flag.value {
                Some(value) => arg.help(format!("[default: {value}]")),
                None => arg.required(true),
            };
            command = command.arg(configure(arg, &flag.kind));
        }
        Ok(command)
    }
}

/// Token parsing of one flag
fn configure(arg: Arg, kind: &FlagKind) -> Arg {
    match kind {
        FlagKind::Bool => arg.value_name("bool").value_parser(str2bool),
        FlagKind::Scalar(ty) => scalar_parser(arg, ty).value_name(ty.to_string()),
        FlagKind::Tuple { inner, arity } => {
            let arg = scalar_parser(arg, inner);
            match arity {
                Arity::Fixed(n) => arg.num_args(*n).value_name(inner.to_string()),
                Arity::Variadic => arg.num_args(1..).value_name(format!("{inner},")),
            }
        }
        FlagKind::Discriminator { choices } => arg
            .value_name("choice")
            .value_parser(PossibleValuesParser::new(choices.clone())),
        FlagKind::Skipped => arg,
    }
}

fn scalar_parser(arg: Arg, ty: &TypeExpr) -> Arg {
    match ty {
        TypeExpr::Bool => arg.value_parser(str2bool),
        TypeExpr::Int => arg.value_parser(value_parser!(i64)).allow_negative_numbers(true),
        TypeExpr::Float => arg.value_parser(value_parser!(f64)).allow_negative_numbers(true),
        _ => arg.value_parser(value_parser!(String)),
    }
}

fn plain_kind(option: &PlainOption) -> Result<FlagKind> {
    let ty = &option.annotation;
    if is_bool_type(ty) {
        Ok(FlagKind::Bool)
    } else if is_primitive_type(ty) {
        Ok(FlagKind::Scalar(ty.clone()))
    } else if is_flat_tuple_type(ty) {
        let (inner, arity) = tuple_inner_type(ty)?;
        Ok(FlagKind::Tuple { inner, arity })
    } else {
        Err(Error::UnsupportedType {
            field: option.name.clone(),
            ty: ty.to_string(),
        })
    }
}

fn matches_error(id: &str, err: clap::parser::MatchesError) -> Error {
    Error::StructuralMismatch(format!("reading '{id}': {err}"))
}

fn one<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<Option<T>> {
    matches
        .try_get_one::<T>(id)
        .map(|v| v.cloned())
        .map_err(|e| matches_error(id, e))
}

fn many<T>(matches: &ArgMatches, id: &str) -> Result<Option<Value>>
where
    T: Clone + Send + Sync + 'static + Into<Value>,
{
    Ok(matches
        .try_get_many::<T>(id)
        .map_err(|e| matches_error(id, e))?
        .map(|values| Value::tuple(values.cloned())))
}

/// Value given on the command line for `flag`, if any
fn read_value(matches: &ArgMatches, flag: &ActiveFlag) -> Result<Option<Value>> {
    let id = flag.full.join();
    match &flag.kind {
        FlagKind::Bool | FlagKind::Scalar(TypeExpr::Bool) => Ok(one::<bool>(matches, &id)?.map(Value::Bool)),
        FlagKind::Scalar(TypeExpr::Int) => Ok(one::<i64>(matches, &id)?.map(Value::Int)),
        FlagKind::Scalar(TypeExpr::Float) => Ok(one::<f64>(matches, &id)?.map(Value::Float)),
        FlagKind::Scalar(_) | FlagKind::Discriminator { .. } => {
            Ok(one::<String>(matches, &id)?.map(Value::Str))
        }
        FlagKind::Tuple { inner, .. } => match inner {
            TypeExpr::Bool => many::<bool>(matches, &id),
            TypeExpr::Int => many::<i64>(matches, &id),
            TypeExpr::Float => many::<f64>(matches, &id),
            _ => many::<String>(matches, &id),
        },
        FlagKind::Skipped => Ok(None),
    }
}

/// Resolve choice selections from `argv` until they stop changing
///
/// Selecting an alternative can expose nested choices and change which
/// alias names a discriminator, so the scan repeats over the updated flag
/// set. Unknown alternative names are rejected here.
fn resolve_selections(roots: &[Root], argv: &[String]) -> Result<BTreeMap<String, Selections>> {
    let mut selections: BTreeMap<String, Selections> = roots
        .iter()
        .map(|root| (root.name.clone(), current_selections(&root.flags)))
        .collect();
    let given = scan_argv(argv);

    for _ in 0..MAX_SELECTION_ROUNDS {
        let mut discriminators = Vec::new();
        let mut all_paths = Vec::new();
        for root in roots {
            for spec in &root.flags.flags {
                if matches!(spec.kind, FlagKind::Skipped)
                    || !is_active(&spec.branches, &selections[&root.name])
                {
                    continue;
                }
                let full = root.full_path(&spec.path);
                all_paths.push(full.clone());
                if let FlagKind::Discriminator { choices } = &spec.kind {
                    discriminators.push((root.name.clone(), spec.path.clone(), full, choices));
                }
            }
        }
        let aliases = shorten(&all_paths).unwrap_or_default();

        let mut changed = false;
        for (root, path, full, choices) in discriminators {
            let full_name = full.join();
            let alias = aliases.alias_of(&full).unwrap_or(&full_name);
            let Some(tag) = given
                .iter()
                .rev()
                .find(|(name, _)| name == alias || *name == full_name)
                .map(|(_, value)| value)
            else {
                continue;
            };
            if !choices.contains(tag) {
                return Err(Error::InvalidChoice {
                    field: full_name,
                    given: tag.clone(),
                    choices: choices.clone(),
                });
            }
            let current = selections.entry(root).or_default();
            if current.get(&path) != Some(tag) {
                current.insert(path, tag.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    Ok(selections)
}

/// `(flag name, first value)` pairs from `--flag value` and `--flag=value`
fn scan_argv(argv: &[String]) -> Vec<(String, String)> {
    let mut given = Vec::new();
    let mut tokens = argv.iter().skip(1).peekable();
    while let Some(token) = tokens.next() {
        if token == "--" {
            break;
        }
        let Some(flag) = token.strip_prefix("--") else {
            continue;
        };
        match flag.split_once('=') {
            Some((name, value)) => given.push((name.to_string(), value.to_string())),
            None => {
                if let Some(value) = tokens.next_if(|next| !next.starts_with("--")) {
                    given.push((flag.to_string(), value.clone()));
                }
            }
        }
    }
    given
}

/// Report `err` the way clap does and exit
///
/// Help and version requests exit with status 0, every other error with 2.
pub fn exit_with(err: Error) -> ! {
    match err {
        Error::Cli { kind, message }
            if matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            print!("{message}");
            std::process::exit(0)
        }
        Error::Cli { message, .. } => {
            eprint!("{message}");
            std::process::exit(2)
        }
        other => {
            eprintln!("error: {other}");
            std::process::exit(2)
        }
    }
}
