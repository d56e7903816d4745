//! Component kinds and how to construct them
//!
//! A [Registry] maps a kind name (the tag of a component in a document) to a [Factory]. The factory declares the
//! kind's parameters, the groups of parameters that have to agree ([SharedGroup]s) and constructs objects from
//! already materialized [Args].
//!
//! Most kinds do not need a dedicated type, [KindSpec] is a factory backed by a closure:
//!
//! ```
//! # use objtree::registry::{Args, KindSpec, Registry};
//! # use objtree::node::Component;
//! #[derive(Debug)]
//! struct Linear {
//!     size: i64,
//! }
//! impl Component for Linear {}
//!
//! let mut registry = Registry::default();
//! registry.register(
//!     "Linear",
//!     KindSpec::new(|args: Args| Ok(Box::new(Linear { size: args.integer("size")? })))
//!         .required("size"),
//! );
//! assert!(registry.get("Linear").is_some());
//! ```
use crate::node::{Component, Live, Node, Params};
use crate::share::SharedGroup;
use crate::value::Value;
use indexmap::IndexMap;

/// Name of the parameter through which the construction context is passed
pub const CONTEXT_PARAM: &str = "context";

/// A declared constructor parameter
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Parameter {
    pub name: String,
    /// `None` means the parameter is required
    pub default: Option<Node>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Constructor capability of one component kind
pub trait Factory {
    fn parameters(&self) -> &[Parameter];

    fn shared_params(&self) -> &[SharedGroup] {
        &[]
    }

    fn construct(&self, args: Args) -> Result<Box<dyn Component>, ParamError>;

    fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters().iter().find(|param| param.name == name)
    }
}

type ConstructFn = dyn Fn(Args) -> Result<Box<dyn Component>, ParamError>;

/// [Factory] backed by a closure
pub struct KindSpec {
    parameters: Vec<Parameter>,
    shared: Vec<SharedGroup>,
    construct: Box<ConstructFn>,
}

impl KindSpec {
    pub fn new<F>(construct: F) -> Self
    where
        F: Fn(Args) -> Result<Box<dyn Component>, ParamError> + 'static,
    {
        Self {
            parameters: vec![],
            shared: vec![],
            construct: Box::new(construct),
        }
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(name.into(), None));
        self
    }

    pub fn optional(mut self, name: impl Into<String>, default: impl Into<Node>) -> Self {
        self.parameters
            .push(Parameter::new(name.into(), Some(default.into())));
        self
    }

    /// Declare a group of relative paths whose values must agree
    pub fn shared(mut self, group: impl Into<SharedGroup>) -> Self {
        self.shared.push(group.into());
        self
    }
}

impl Factory for KindSpec {
    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn shared_params(&self) -> &[SharedGroup] {
        &self.shared
    }

    fn construct(&self, args: Args) -> Result<Box<dyn Component>, ParamError> {
        (self.construct)(args)
    }
}

/// Kind name to [Factory]
#[derive(Default)]
pub struct Registry {
    kinds: IndexMap<String, Box<dyn Factory>>,
}

impl Registry {
    /// Registers a kind, replacing a previous registration of the same name
    pub fn register(&mut self, kind: impl Into<String>, factory: impl Factory + 'static) -> &mut Self {
        let kind = kind.into();
        if self.kinds.insert(kind.clone(), Box::new(factory)).is_some() {
            tracing::debug!(%kind, "kind registered twice, replacing");
        }
        self
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Factory> {
        self.kinds.get(kind).map(Box::as_ref)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.kinds.keys()).finish()
    }
}

/// Parameter mismatch reported by a constructor
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("missing parameter `{0}`")]
    Missing(String),
    #[error("parameter `{name}` must be {expected}")]
    WrongType { name: String, expected: &'static str },
    #[error("parameter `{name}` is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// Materialized parameters handed to [Factory::construct]
///
/// Every declared parameter is present, absent ones carry their default.
#[derive(Debug, Clone, derive_new::new)]
pub struct Args {
    kind: String,
    params: Params,
}

impl Args {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.params.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Node, ParamError> {
        self.get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    fn scalar(&self, name: &str) -> Result<Option<&Value>, ParamError> {
        match self.get(name) {
            None | Some(Node::Scalar(Value::Null)) => Ok(None),
            Some(Node::Scalar(value)) => Ok(Some(value)),
            Some(_) => Err(wrong_type(name, "a scalar")),
        }
    }

    /// `None` when absent or null
    pub fn opt_integer(&self, name: &str) -> Result<Option<i64>, ParamError> {
        self.scalar(name)?
            .map(|value| value.as_i64().ok_or_else(|| wrong_type(name, "an integer")))
            .transpose()
    }

    pub fn integer(&self, name: &str) -> Result<i64, ParamError> {
        self.opt_integer(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn opt_decimal(&self, name: &str) -> Result<Option<f64>, ParamError> {
        self.scalar(name)?
            .map(|value| value.as_f64().ok_or_else(|| wrong_type(name, "a number")))
            .transpose()
    }

    pub fn decimal(&self, name: &str) -> Result<f64, ParamError> {
        self.opt_decimal(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn opt_boolean(&self, name: &str) -> Result<Option<bool>, ParamError> {
        self.scalar(name)?
            .map(|value| value.as_bool().ok_or_else(|| wrong_type(name, "a boolean")))
            .transpose()
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ParamError> {
        self.opt_boolean(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn opt_string(&self, name: &str) -> Result<Option<&str>, ParamError> {
        self.scalar(name)?
            .map(|value| value.as_str().ok_or_else(|| wrong_type(name, "a string")))
            .transpose()
    }

    pub fn string(&self, name: &str) -> Result<&str, ParamError> {
        self.opt_string(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    /// `None` when absent or null
    pub fn opt_live(&self, name: &str) -> Result<Option<&Live>, ParamError> {
        match self.get(name) {
            None | Some(Node::Scalar(Value::Null)) => Ok(None),
            Some(Node::Live(live)) => Ok(Some(live)),
            Some(_) => Err(wrong_type(name, "a component")),
        }
    }

    pub fn live(&self, name: &str) -> Result<&Live, ParamError> {
        self.opt_live(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    /// A live object of a specific type
    pub fn object<T: Component>(&self, name: &str) -> Result<&T, ParamError> {
        self.live(name)?.downcast_ref::<T>().ok_or_else(|| ParamError::WrongType {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }
}

fn wrong_type(name: &str, expected: &'static str) -> ParamError {
    ParamError::WrongType {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Unit;
    impl Component for Unit {}

    fn args() -> Args {
        let mut params = Params::new();
        params.insert("size".into(), 3.into());
        params.insert("rate".into(), 0.5.into());
        params.insert("name".into(), "enc".into());
        params.insert("unset".into(), Node::null());
        params.insert(
            "child".into(),
            Live::new("Unit", Box::new(Unit), Params::new()).into(),
        );
        Args::new("Test".into(), params)
    }

    #[test]
    fn typed_accessors() {
        let args = args();
        assert_eq!(args.integer("size"), Ok(3));
        assert_eq!(args.decimal("size"), Ok(3.0));
        assert_eq!(args.decimal("rate"), Ok(0.5));
        assert_eq!(args.string("name"), Ok("enc"));
        assert_eq!(args.opt_integer("unset"), Ok(None));
        assert_eq!(args.opt_integer("absent"), Ok(None));
        assert!(args.object::<Unit>("child").is_ok());
    }

    #[test]
    fn mismatches() {
        let args = args();
        assert_eq!(
            args.integer("rate"),
            Err(ParamError::WrongType {
                name: "rate".into(),
                expected: "an integer"
            })
        );
        assert_eq!(args.integer("unset"), Err(ParamError::Missing("unset".into())));
        assert!(matches!(
            args.live("size"),
            Err(ParamError::WrongType { .. })
        ));
        assert!(matches!(
            args.string("child"),
            Err(ParamError::WrongType { .. })
        ));
    }

    #[test]
    fn parameter_without_default_is_required() {
        assert!(Parameter::new("size".to_string(), None).is_required());
        assert!(!Parameter::new("bias".to_string(), Some(true.into())).is_required());

        let args = Args::new("Linear".to_string(), Params::new());
        assert_eq!(args.kind(), "Linear");
        assert!(args.params().is_empty());
    }

    #[test]
    fn kind_spec_declarations() {
        let spec = KindSpec::new(|_| Ok(Box::new(Unit)))
            .required("size")
            .optional("bias", true)
            .shared(["size", "inner.size"]);

        assert!(spec.parameter("size").unwrap().is_required());
        assert_eq!(
            spec.parameter("bias").unwrap().default,
            Some(Node::scalar(true))
        );
        assert!(spec.parameter("other").is_none());
        assert_eq!(spec.shared_params().len(), 1);
    }

    #[test]
    fn registry_lookup() {
        let mut registry = Registry::default();
        registry
            .register("A", KindSpec::new(|_| Ok(Box::new(Unit))))
            .register("B", KindSpec::new(|_| Ok(Box::new(Unit))));

        assert!(registry.contains("A"));
        assert!(registry.get("C").is_none());
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
