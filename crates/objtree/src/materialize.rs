//! The materialization pipeline
//!
//! 1. copy the input tree, the caller's tree is never modified
//! 2. collect the [NamedPaths] from the copy, as parsed
//! 3. [crate::staging::stage]
//! 4. [crate::share::propagate]
//! 5. [Initializer::run]
//!
//! Any error aborts the whole run, there is no partially materialized result.
use crate::error::Error;
use crate::init::Initializer;
use crate::node::Node;
use crate::path::Path;
use crate::registry::Registry;
use crate::resolve::NamedPaths;
use crate::share::{self, SharedGroup};
use crate::staging;

/// Non-fatal notices collected during a run
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Members of a shared parameter group disagree, the group was ignored
    SharedParamConflict {
        path: Path,
        group: SharedGroup,
        values: Vec<Node>,
    },
    /// `at` was bound to the object already built for `target`
    Reused { at: Path, target: Path },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::SharedParamConflict {
                path,
                group,
                values,
            } => {
                let values: Vec<_> = values.iter().map(Node::summary).collect();
                write!(
                    f,
                    "inconsistent shared params at `{path}` for {group}: [{}]; ignoring these shared parameters",
                    values.join(", ")
                )
            }
            Diagnostic::Reused { at, target } => {
                write!(f, "reusing previously initialized object `{target}` at `{at}`")
            }
        }
    }
}

#[derive(Debug)]
pub struct Materialized {
    pub root: Node,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct Materializer {
    registry: Registry,
    context: Option<Node>,
}

impl Materializer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            context: None,
        }
    }

    /// Handed to every kind declaring a [crate::registry::CONTEXT_PARAM] parameter
    pub fn with_context(mut self, context: impl Into<Node>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn materialize(&self, root: &Node) -> Result<Materialized, Error> {
        if let Node::Live(_) = root {
            return Ok(Materialized {
                root: root.clone(),
                diagnostics: vec![],
            });
        }

        let mut root = root.clone();
        let named = NamedPaths::collect(&root);
        tracing::debug!(named = named.len(), "collected named paths");

        staging::stage(&mut root, &self.registry)?;

        let mut diagnostics = vec![];
        share::propagate(&mut root, &self.registry, &named, &mut diagnostics)?;

        let mut initializer = Initializer::new(&self.registry, &named, self.context.as_ref());
        initializer.run(&mut root)?;
        tracing::debug!(objects = initializer.cache().len(), "initialized");
        diagnostics.extend(initializer.into_diagnostics());

        Ok(Materialized { root, diagnostics })
    }
}
