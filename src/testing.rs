//! Configurable fixtures shared by unit tests, integration tests and benches

use crate::error::Result;
use crate::lazy::{Choices, Configurable, Kwargs, Lazy, Param, Parsable};
use crate::typecheck::TypeExpr;
use crate::value::Value;

/// `DummyFlat(a, b: str, c: float = 2.5)`
#[derive(Debug)]
pub struct DummyFlat {
    pub a: Option<Value>,
    pub b: String,
    pub c: f64,
    config: Lazy,
}

impl Configurable for DummyFlat {
    const PATH: &'static str = "lazyconf::testing::DummyFlat";

    fn params() -> Vec<Param> {
        vec![
            Param::unannotated("a"),
            Param::new("b", TypeExpr::Str),
            Param::new("c", TypeExpr::Float).with_default(2.5),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            a: kwargs.take("a")?,
            b: kwargs.require("b")?,
            c: kwargs.require("c")?,
            config,
        })
    }
}

impl Parsable for DummyFlat {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `DummyNested(a: str, b: Lazy[DummyFlat], c: float = 2.5)`
#[derive(Debug)]
pub struct DummyNested {
    pub a: String,
    pub b: Lazy,
    pub c: f64,
    config: Lazy,
}

impl Configurable for DummyNested {
    const PATH: &'static str = "lazyconf::testing::DummyNested";

    fn params() -> Vec<Param> {
        vec![
            Param::new("a", TypeExpr::Str),
            Param::sub::<DummyFlat>("b"),
            Param::new("c", TypeExpr::Float).with_default(2.5),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            a: kwargs.require("a")?,
            b: kwargs.require("b")?,
            c: kwargs.require("c")?,
            config,
        })
    }
}

impl Parsable for DummyNested {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `Submodel(y: int = 5, z: tuple[int, ...] = (1, 2))`
#[derive(Debug, PartialEq)]
pub struct Submodel {
    pub y: i64,
    pub z: Vec<i64>,
}

impl Configurable for Submodel {
    const PATH: &'static str = "lazyconf::testing::Submodel";

    fn params() -> Vec<Param> {
        vec![
            Param::new("y", TypeExpr::Int).with_default(5),
            Param::new("z", TypeExpr::var_tuple(TypeExpr::Int)).with_default(Value::tuple([1, 2])),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        Ok(Self {
            y: kwargs.require("y")?,
            z: kwargs.require("z")?,
        })
    }
}

/// `Model(x: int = 1, sub: Lazy[Submodel])`, building `sub` eagerly
#[derive(Debug)]
pub struct Model {
    pub x: i64,
    pub sub: Submodel,
    config: Lazy,
}

impl Configurable for Model {
    const PATH: &'static str = "lazyconf::testing::Model";

    fn params() -> Vec<Param> {
        vec![
            Param::new("x", TypeExpr::Int).with_default(1),
            Param::sub::<Submodel>("sub"),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        let sub: Lazy = kwargs.require("sub")?;
        Ok(Self {
            x: kwargs.require("x")?,
            sub: sub.to_eager()?,
            config,
        })
    }
}

impl Parsable for Model {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `Inner(x, a: str, b: int = 1)`
#[derive(Debug)]
pub struct Inner {
    pub x: Option<Value>,
    pub a: String,
    pub b: i64,
    config: Lazy,
}

impl Configurable for Inner {
    const PATH: &'static str = "lazyconf::testing::Inner";

    fn params() -> Vec<Param> {
        vec![
            Param::unannotated("x"),
            Param::new("a", TypeExpr::Str),
            Param::new("b", TypeExpr::Int).with_default(1),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            x: kwargs.take("x")?,
            a: kwargs.require("a")?,
            b: kwargs.require("b")?,
            config,
        })
    }
}

impl Parsable for Inner {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `Inner2(aa: str, bb: int = 1, cc: int | str)`
#[derive(Debug)]
pub struct Inner2 {
    pub aa: String,
    pub bb: i64,
    config: Lazy,
}

impl Configurable for Inner2 {
    const PATH: &'static str = "lazyconf::testing::Inner2";

    fn params() -> Vec<Param> {
        vec![
            Param::new("aa", TypeExpr::Str),
            Param::new("bb", TypeExpr::Int).with_default(1),
            Param::new("cc", TypeExpr::Union(vec![TypeExpr::Int, TypeExpr::Str])),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            aa: kwargs.require("aa")?,
            bb: kwargs.require("bb")?,
            config,
        })
    }
}

impl Parsable for Inner2 {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `Outer(c: Lazy[Inner] = Inner.as_lazy(), d: str = "hello")`
#[derive(Debug)]
pub struct Outer {
    pub c: Lazy,
    pub d: String,
    config: Lazy,
}

impl Configurable for Outer {
    const PATH: &'static str = "lazyconf::testing::Outer";

    fn params() -> Vec<Param> {
        vec![
            Param::new("c", TypeExpr::lazy::<Inner>()).with_default(Inner::as_lazy()),
            Param::new("d", TypeExpr::Str).with_default("hello"),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            c: kwargs.require("c")?,
            d: kwargs.require("d")?,
            config,
        })
    }
}

impl Parsable for Outer {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `I1 = Inner`, `I2 = Inner2`
pub struct InnerChoice;

impl Choices for InnerChoice {
    const NAME: &'static str = "InnerChoice";

    fn alternatives() -> Vec<(&'static str, Value)> {
        vec![
            ("I1", Inner::as_lazy().into()),
            ("I2", Inner2::as_lazy().into()),
        ]
    }
}

/// `Outer2(c: InnerChoice = I1, d: str = "hello")`
#[derive(Debug)]
pub struct Outer2 {
    pub c: Lazy,
    pub d: String,
    config: Lazy,
}

impl Configurable for Outer2 {
    const PATH: &'static str = "lazyconf::testing::Outer2";

    fn params() -> Vec<Param> {
        vec![
            Param::choice::<InnerChoice>("c"),
            Param::new("d", TypeExpr::Str).with_default("hello"),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        let config = kwargs.snapshot()?;
        Ok(Self {
            c: kwargs.require("c")?,
            d: kwargs.require("d")?,
            config,
        })
    }
}

impl Parsable for Outer2 {
    fn config(&self) -> &Lazy {
        &self.config
    }
}

/// `OUTER = Outer2`, `MODEL = Model`
pub struct StackChoice;

impl Choices for StackChoice {
    const NAME: &'static str = "StackChoice";

    fn alternatives() -> Vec<(&'static str, Value)> {
        vec![
            ("OUTER", Outer2::as_lazy().into()),
            ("MODEL", Model::as_lazy().into()),
        ]
    }
}

/// `Stack(s: StackChoice = OUTER, verbose: bool = false)`; a choice nested in a choice
#[derive(Debug)]
pub struct Stack {
    pub s: Lazy,
    pub verbose: bool,
}

impl Configurable for Stack {
    const PATH: &'static str = "lazyconf::testing::Stack";

    fn params() -> Vec<Param> {
        vec![
            Param::choice::<StackChoice>("s"),
            Param::new("verbose", TypeExpr::Bool).with_default(false),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        Ok(Self {
            s: kwargs.require("s")?,
            verbose: kwargs.require("verbose")?,
        })
    }
}

/// `Grid(points: tuple[tuple[float, float], ...] = ((0.0, 0.0),), scale: float = 1.0)`
#[derive(Debug)]
pub struct Grid {
    pub points: Vec<(f64, f64)>,
    pub scale: f64,
}

impl Configurable for Grid {
    const PATH: &'static str = "lazyconf::testing::Grid";

    fn params() -> Vec<Param> {
        vec![
            Param::new(
                "points",
                TypeExpr::var_tuple(TypeExpr::tuple_of(TypeExpr::Float, 2)),
            )
            .with_default(Value::tuple([Value::tuple([0.0, 0.0])])),
            Param::new("scale", TypeExpr::Float).with_default(1.0),
        ]
    }

    fn construct(mut kwargs: Kwargs) -> Result<Self> {
        Ok(Self {
            points: kwargs.require("points")?,
            scale: kwargs.require("scale")?,
        })
    }
}
