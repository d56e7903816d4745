//! Shared parameters
//!
//! A kind may declare groups of paths, relative to the component, whose values have to agree. For example an
//! attender and the encoder it attends over need the same dimension, so the decoder declares
//! `["hidden_size", "attender.input_dim"]`: once either side is given, the other one inherits it.
//!
//! Per group
//! - members that do not exist are skipped
//! - no value at all: nothing happens
//! - exactly one distinct value: it is written to every member
//! - more than one distinct value: the group is ignored and a [Diagnostic::SharedParamConflict] is emitted
//!
//! Values are compared structurally ([Node]'s `PartialEq`). A shared value may itself be a component, every member
//! then gets its own copy of it. Components nested inside a shared value are rejected, references are fine.
use crate::error::Error;
use crate::materialize::Diagnostic;
use crate::node::Node;
use crate::path::Path;
use crate::registry::Registry;
use crate::resolve::{self, NamedPaths};
use crate::tree::{self, TraversalOrder};
use std::fmt;

/// Relative paths whose values must agree
#[derive(Debug, Clone, PartialEq)]
pub struct SharedGroup {
    paths: Vec<Path>,
}

impl SharedGroup {
    pub fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
}

impl fmt::Display for SharedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, path) in self.paths.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{path}")?;
        }
        f.write_str("}")
    }
}

impl<const N: usize> From<[&str; N]> for SharedGroup {
    fn from(paths: [&str; N]) -> Self {
        Self::new(paths.into_iter().map(Path::from).collect())
    }
}

impl From<Vec<Path>> for SharedGroup {
    fn from(paths: Vec<Path>) -> Self {
        Self::new(paths)
    }
}

/// Unify shared parameters of every component, top-down
pub fn propagate(
    root: &mut Node,
    registry: &Registry,
    named: &NamedPaths,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), Error> {
    let declaring: Vec<(Path, String)> = tree::traverse(root, TraversalOrder::PreOrder)
        .filter_map(|(path, node)| Some((path, node.as_component()?.kind().to_string())))
        .collect();

    for (path, kind) in declaring {
        let Some(factory) = registry.get(&kind) else {
            return Err(Error::TreeShape {
                path,
                reason: format!("unknown component kind `{kind}`"),
            });
        };

        for group in factory.shared_params() {
            propagate_group(root, &path, group, named, diagnostics)?;
        }
    }

    Ok(())
}

fn propagate_group(
    root: &mut Node,
    path: &Path,
    group: &SharedGroup,
    named: &NamedPaths,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), Error> {
    let mut members = vec![];
    let mut choices: Vec<Node> = vec![];

    for relative in group.paths() {
        let Some(member) = locate(root, path, relative, named) else {
            tracing::trace!(%path, %relative, "shared param member unreachable");
            continue;
        };

        if let Some(value) = tree::lookup(root, &member) {
            check_scope(value, path, &member, group)?;
            if !choices.contains(value) {
                choices.push(value.clone());
            }
        }

        members.push(member);
    }

    match choices.as_slice() {
        [] => {}
        [value] => {
            for member in &members {
                tracing::trace!(%path, %member, "set shared param");
                tree::set(root, member, value.clone())?;
            }
        }
        values => {
            let shown = values
                .iter()
                .map(Node::summary)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                %path,
                %group,
                values=%shown,
                "inconsistent shared params; ignoring these shared parameters"
            );
            diagnostics.push(Diagnostic::SharedParamConflict {
                path: path.clone(),
                group: group.clone(),
                values: values.to_vec(),
            });
        }
    }

    Ok(())
}

/// Absolute path of a group member
///
/// References at intermediate positions are followed, so a component can share parameters with an object it
/// only references. Returns `None` if the member's parent does not exist.
fn locate(root: &Node, base: &Path, relative: &Path, named: &NamedPaths) -> Option<Path> {
    let (last, intermediate) = relative.selectors().split_last()?;

    let mut current = base.clone();
    for selector in intermediate {
        current = resolve::follow(root, current.child(selector.clone()), named)?;
    }

    match tree::lookup(root, &current)? {
        Node::Mapping(_) | Node::Component(_) => Some(current.child(last.clone())),
        // sequences cannot grow, only existing elements are members
        Node::Sequence(items) => last
            .as_index()
            .filter(|index| *index < items.len())
            .map(|_| current.child(last.clone())),
        Node::Reference(_) | Node::Scalar(_) | Node::Live(_) => None,
    }
}

fn check_scope(value: &Node, path: &Path, member: &Path, group: &SharedGroup) -> Result<(), Error> {
    let offending = tree::traverse(value, TraversalOrder::PreOrder)
        .filter(|(nested, _)| !nested.is_root())
        .find_map(|(nested, node)| Some((nested, node.as_component()?.kind().to_string())));

    match offending {
        Some((nested, kind)) => Err(Error::SharingScope {
            path: path.clone(),
            group: group.clone(),
            offending: member.join(&nested),
            kind,
        }),
        None => Ok(()),
    }
}
