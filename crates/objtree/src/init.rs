//! Bottom-up initialization
//!
//! Nodes are visited in post-order, so the children of a component are live objects by the time the component
//! itself is constructed. Two things break that order:
//! - a [Reference] whose target comes later in the traversal: the target (and its subtree) is built right away
//! - a component whose shared id was already declared elsewhere: it becomes the object declared first, its own
//!   subtree is never built
//!
//! Both recurse through [Initializer::ensure]. Paths currently being built are tracked, reaching one of them again
//! is a reference cycle. Every constructed object is cached by path, that cache is what makes all references to
//! one shared id end up with the same object.
use crate::error::{ComponentInitError, Error, UnresolvedReferenceError};
use crate::materialize::Diagnostic;
use crate::node::{ComponentDescriptor, Live, Node, Reference};
use crate::path::Path;
use crate::registry::{Args, Factory, Registry, CONTEXT_PARAM};
use crate::resolve::{resolve, NamedPaths};
use crate::tree::{self, TraversalOrder};
use std::collections::HashMap;

/// Live objects by path, scoped to one materialization
#[derive(Debug, Default)]
pub struct InitCache {
    objects: HashMap<Path, Live>,
}

impl InitCache {
    pub fn get(&self, path: &Path) -> Option<&Live> {
        self.objects.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.objects.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn insert(&mut self, path: Path, live: Live) {
        tracing::debug!(%path, kind=%live.kind(), "cached");
        self.objects.insert(path, live);
    }
}

pub struct Initializer<'m> {
    registry: &'m Registry,
    named: &'m NamedPaths,
    context: Option<&'m Node>,
    cache: InitCache,
    /// paths being built, outermost first
    in_progress: Vec<Path>,
    /// components repeating a shared id declared elsewhere, their subtrees are never built
    aliases: Vec<Path>,
    diagnostics: Vec<Diagnostic>,
}

impl<'m> Initializer<'m> {
    pub fn new(registry: &'m Registry, named: &'m NamedPaths, context: Option<&'m Node>) -> Self {
        Self {
            registry,
            named,
            context,
            cache: Default::default(),
            in_progress: vec![],
            aliases: vec![],
            diagnostics: vec![],
        }
    }

    /// Replace every component and reference below `root` with its live object
    pub fn run(&mut self, root: &mut Node) -> Result<(), Error> {
        self.aliases = tree::traverse(root, TraversalOrder::PreOrder)
            .filter_map(|(path, node)| {
                let declared = self.named.get(node.as_component()?.shared_id()?)?;
                (*declared != path).then_some(path)
            })
            .collect();

        let order: Vec<Path> = tree::traverse(root, TraversalOrder::PostOrder)
            .map(|(path, _)| path)
            .collect();

        for path in &order {
            self.step(root, path)?;
        }

        Ok(())
    }

    pub fn cache(&self) -> &InitCache {
        &self.cache
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn step(&mut self, root: &mut Node, path: &Path) -> Result<(), Error> {
        if self
            .aliases
            .iter()
            .any(|alias| alias != path && path.starts_with(alias))
        {
            tracing::trace!(%path, "below a duplicate shared id, skipped");
            return Ok(());
        }

        match tree::lookup(root, path) {
            Some(Node::Reference(reference)) => {
                let reference = reference.clone();
                self.bind_reference(root, path, &reference)?;
            }
            Some(Node::Component(_)) => {
                self.ensure(root, path, path)?;
            }
            // `None`: below a component that was built ahead of the traversal
            Some(Node::Scalar(_) | Node::Sequence(_) | Node::Mapping(_) | Node::Live(_)) | None => {}
        }

        Ok(())
    }

    /// The live object at `path`, building it first if necessary
    fn ensure(&mut self, root: &mut Node, path: &Path, requested_by: &Path) -> Result<Live, Error> {
        if let Some(live) = self.cache.get(path) {
            return Ok(live.clone());
        }

        let unresolved = |source| Error::UnresolvedReference {
            at: requested_by.clone(),
            source,
        };

        match tree::lookup(root, path) {
            None => Err(unresolved(UnresolvedReferenceError::MissingTarget(
                path.clone(),
            ))),
            Some(Node::Live(live)) => {
                let live = live.clone();
                self.cache.insert(path.clone(), live.clone());
                Ok(live)
            }
            Some(Node::Reference(reference)) => {
                let reference = reference.clone();
                self.bind_reference(root, path, &reference)
            }
            Some(Node::Component(_)) => self.construct(root, path),
            Some(Node::Scalar(_) | Node::Sequence(_) | Node::Mapping(_)) => Err(unresolved(
                UnresolvedReferenceError::NotAComponent(path.clone()),
            )),
        }
    }

    fn bind_reference(
        &mut self,
        root: &mut Node,
        path: &Path,
        reference: &Reference,
    ) -> Result<Live, Error> {
        let target = resolve(reference, self.named).map_err(|source| Error::UnresolvedReference {
            at: path.clone(),
            source,
        })?;

        self.enter(path)?;
        let live = match self.cache.get(&target) {
            Some(live) => {
                tracing::info!(%path, %target, "reusing previously initialized object");
                self.diagnostics.push(Diagnostic::Reused {
                    at: path.clone(),
                    target: target.clone(),
                });
                live.clone()
            }
            None => self.ensure(root, &target, path)?,
        };
        self.leave();

        tree::set(root, path, Node::Live(live.clone()))?;
        self.cache.insert(path.clone(), live.clone());
        Ok(live)
    }

    fn construct(&mut self, root: &mut Node, path: &Path) -> Result<Live, Error> {
        self.enter(path)?;

        let alias = match tree::get(root, path)? {
            Node::Component(descriptor) => descriptor
                .shared_id()
                .and_then(|id| self.named.get(id))
                .filter(|declared| *declared != path)
                .cloned(),
            _ => None,
        };

        if let Some(declared) = alias {
            // another component declared this shared id first, use that one
            tracing::debug!(%path, %declared, "duplicate shared id");
            let live = self.ensure(root, &declared, path)?;
            self.diagnostics.push(Diagnostic::Reused {
                at: path.clone(),
                target: declared,
            });
            self.leave();

            tree::set(root, path, Node::Live(live.clone()))?;
            self.cache.insert(path.clone(), live.clone());
            return Ok(live);
        }

        // live already, unless this component is built ahead of the traversal
        let pending: Vec<Path> = tree::traverse_at(root, path, TraversalOrder::PostOrder)?
            .map(|(child, _)| child)
            .filter(|child| child != path)
            .collect();
        for child in &pending {
            self.step(root, child)?;
        }

        let Node::Component(descriptor) = tree::get(root, path)? else {
            return Err(Error::TreeShape {
                path: path.clone(),
                reason: "component was replaced while its parameters were initialized".to_string(),
            });
        };
        let descriptor = descriptor.clone();

        let Some(factory) = self.registry.get(descriptor.kind()) else {
            return Err(Error::TreeShape {
                path: path.clone(),
                reason: format!("unknown component kind `{}`", descriptor.kind()),
            });
        };

        let args = self.arguments(path, &descriptor, factory)?;
        let object = factory
            .construct(args)
            .map_err(|err| init_error(path, &descriptor, factory, vec![], vec![], err.to_string()))?;

        tracing::info!(
            %path,
            kind=%descriptor.kind(),
            params=?descriptor.init_params().keys().collect::<Vec<_>>(),
            "initialized"
        );

        let live = Live::from_descriptor(&descriptor, object);
        tree::set(root, path, Node::Live(live.clone()))?;
        self.cache.insert(path.clone(), live.clone());
        self.leave();

        Ok(live)
    }

    /// `init_params` plus defaults (and the context, if the kind asks for it)
    fn arguments(
        &self,
        path: &Path,
        descriptor: &ComponentDescriptor,
        factory: &dyn Factory,
    ) -> Result<Args, Error> {
        let given = descriptor.init_params();
        let wants_context = self.context.is_some() && factory.parameter(CONTEXT_PARAM).is_some();

        let unexpected: Vec<String> = given
            .keys()
            .filter(|name| factory.parameter(name).is_none())
            .cloned()
            .collect();

        let missing: Vec<String> = factory
            .parameters()
            .iter()
            .filter(|param| param.is_required() && !given.contains_key(&param.name))
            .filter(|param| !(wants_context && param.name == CONTEXT_PARAM))
            .map(|param| param.name.clone())
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            let mut reasons = vec![];
            if !missing.is_empty() {
                reasons.push(format!("missing [{}]", missing.join(", ")));
            }
            if !unexpected.is_empty() {
                reasons.push(format!("unexpected [{}]", unexpected.join(", ")));
            }
            let reason = reasons.join(", ");
            return Err(init_error(path, descriptor, factory, missing, unexpected, reason));
        }

        let mut params = given.clone();
        for param in factory.parameters() {
            if params.contains_key(&param.name) {
                continue;
            }
            if let Some(default) = &param.default {
                params.insert(param.name.clone(), default.clone());
            }
        }

        if let Some(context) = self.context.filter(|_| wants_context) {
            params.insert(CONTEXT_PARAM.to_string(), context.clone());
        }

        Ok(Args::new(descriptor.kind().to_string(), params))
    }

    fn enter(&mut self, path: &Path) -> Result<(), Error> {
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let mut cycle = self.in_progress[start..].to_vec();
            cycle.push(path.clone());
            return Err(Error::CyclicReference { cycle });
        }

        self.in_progress.push(path.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.in_progress.pop();
    }
}

fn init_error(
    path: &Path,
    descriptor: &ComponentDescriptor,
    factory: &dyn Factory,
    missing: Vec<String>,
    unexpected: Vec<String>,
    reason: String,
) -> Error {
    Error::ComponentInit(Box::new(ComponentInitError {
        path: path.clone(),
        kind: descriptor.kind().to_string(),
        attempted: descriptor.init_params().keys().cloned().collect(),
        expected: factory
            .parameters()
            .iter()
            .map(|param| param.name.clone())
            .collect(),
        missing,
        unexpected,
        reason,
    }))
}
