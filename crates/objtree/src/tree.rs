//! Navigation and traversal of [Node] trees
//!
//! Children of a node are
//! - sequence elements (selected by index)
//! - mapping entries (selected by key)
//! - component parameters, i.e. [ComponentDescriptor::init_params] (selected by name)
//!
//! Scalars, references and live objects are leaves. Reserved component metadata (the shared id) is only listed by
//! [children_of] when asked for and is never traversed.
use crate::error::PathError;
use crate::node::Node;
use crate::path::{Path, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// parents before children
    PreOrder,
    /// children before parents
    PostOrder,
}

/// Named children of a node
///
/// Keys are turned into selectors the way paths are parsed, so a mapping key `0` is [Selector::Index] here too.
pub fn children_of(node: &Node, include_reserved: bool) -> Vec<(Selector, &Node)> {
    match node {
        Node::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (Selector::Index(index), item))
            .collect(),
        Node::Mapping(entries) => entries
            .iter()
            .map(|(key, child)| (Selector::from(key.as_str()), child))
            .collect(),
        Node::Component(descriptor) => {
            let reserved = descriptor
                .meta()
                .iter()
                .filter(|_| include_reserved)
                .map(|(key, child)| (Selector::from(key.as_str()), child));

            reserved
                .chain(
                    descriptor
                        .init_params()
                        .iter()
                        .map(|(key, child)| (Selector::from(key.as_str()), child)),
                )
                .collect()
        }
        Node::Scalar(_) | Node::Reference(_) | Node::Live(_) => vec![],
    }
}

/// A single child, `None` if absent or if `node` is a leaf
pub fn child<'a>(node: &'a Node, selector: &Selector) -> Option<&'a Node> {
    match node {
        Node::Sequence(items) => items.get(selector.as_index()?),
        Node::Mapping(entries) => entries.get(selector.as_key().as_ref()),
        Node::Component(descriptor) => descriptor.init_params().get(selector.as_key().as_ref()),
        Node::Scalar(_) | Node::Reference(_) | Node::Live(_) => None,
    }
}

pub fn child_mut<'a>(node: &'a mut Node, selector: &Selector) -> Option<&'a mut Node> {
    match node {
        Node::Sequence(items) => items.get_mut(selector.as_index()?),
        Node::Mapping(entries) => entries.get_mut(selector.as_key().as_ref()),
        Node::Component(descriptor) => descriptor
            .init_params_mut()
            .get_mut(selector.as_key().as_ref()),
        Node::Scalar(_) | Node::Reference(_) | Node::Live(_) => None,
    }
}

/// The node at `path`, `None` when any selector along the way is absent
pub fn lookup<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
    path.selectors()
        .iter()
        .try_fold(root, |node, selector| child(node, selector))
}

/// Like [lookup] but reports where navigation stopped
pub fn get<'a>(root: &'a Node, path: &Path) -> Result<&'a Node, PathError> {
    let mut node = root;
    for (depth, selector) in path.selectors().iter().enumerate() {
        node = child(node, selector).ok_or_else(|| PathError::new(path, depth))?;
    }
    Ok(node)
}

pub fn get_mut<'a>(root: &'a mut Node, path: &Path) -> Result<&'a mut Node, PathError> {
    let mut node = root;
    for (depth, selector) in path.selectors().iter().enumerate() {
        node = child_mut(node, selector).ok_or_else(|| PathError::new(path, depth))?;
    }
    Ok(node)
}

/// Replace the node at `path`
///
/// The parent must exist. A missing final field of a mapping or component is inserted, sequence elements must
/// already exist. Returns the replaced node.
pub fn set(root: &mut Node, path: &Path, value: Node) -> Result<Option<Node>, PathError> {
    let Some((selector, parent_selectors)) = path.selectors().split_last() else {
        return Ok(Some(std::mem::replace(root, value)));
    };
    let parent_path = Path::new(parent_selectors.to_vec());

    let parent = get_mut(root, &parent_path)?;
    let missing = || PathError::new(path, parent_path.len());

    match parent {
        Node::Sequence(items) => {
            let slot = selector
                .as_index()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(missing)?;
            Ok(Some(std::mem::replace(slot, value)))
        }
        Node::Mapping(entries) => Ok(entries.insert(selector.as_key().into_owned(), value)),
        Node::Component(descriptor) => Ok(descriptor
            .init_params_mut()
            .insert(selector.as_key().into_owned(), value)),
        Node::Scalar(_) | Node::Reference(_) | Node::Live(_) => Err(missing()),
    }
}

/// Lazily walk the whole tree
pub fn traverse(root: &Node, order: TraversalOrder) -> Traversal<'_> {
    Traversal::new(Path::root(), root, order)
}

/// Lazily walk the subtree at `base`, yielded paths are absolute
pub fn traverse_at<'a>(
    root: &'a Node,
    base: &Path,
    order: TraversalOrder,
) -> Result<Traversal<'a>, PathError> {
    Ok(Traversal::new(base.clone(), get(root, base)?, order))
}

/// Iterator over `(path, node)` pairs, see [traverse]
pub struct Traversal<'a> {
    order: TraversalOrder,
    /// `expanded` is only used in post-order: children of that entry were already pushed
    stack: Vec<(Path, &'a Node, bool)>,
}

impl<'a> Traversal<'a> {
    fn new(base: Path, node: &'a Node, order: TraversalOrder) -> Self {
        Self {
            order,
            stack: vec![(base, node, false)],
        }
    }

    fn push_children(&mut self, path: &Path, node: &'a Node) {
        for (selector, child) in children_of(node, false).into_iter().rev() {
            self.stack.push((path.child(selector), child, false));
        }
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = (Path, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            TraversalOrder::PreOrder => {
                let (path, node, _) = self.stack.pop()?;
                self.push_children(&path, node);
                Some((path, node))
            }
            TraversalOrder::PostOrder => loop {
                let (path, node, expanded) = self.stack.pop()?;
                if expanded || children_of(node, false).is_empty() {
                    return Some((path, node));
                }

                self.stack.push((path.clone(), node, true));
                self.push_children(&path, node);
            },
        }
    }
}

/// One line per node: `path<TAB>summary`
pub fn hierarchy(root: &Node, order: TraversalOrder) -> String {
    traverse(root, order)
        .map(|(path, node)| format!("{path}\t{}\n", node.summary()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::{ComponentDescriptor, Reference};
    use pretty_assertions::assert_eq;

    fn sample() -> Node {
        let enc = ComponentDescriptor::new("Encoder")
            .with_shared_id("dim1")
            .with("layers", Node::Sequence(vec![1.into(), 2.into()]));

        Node::Mapping(indexmap::IndexMap::from([
            ("enc".to_string(), Node::from(enc)),
            ("dec".to_string(), Node::from(Reference::by_name("dim1"))),
        ]))
    }

    fn paths(root: &Node, order: TraversalOrder) -> Vec<String> {
        traverse(root, order)
            .map(|(path, _)| path.to_string())
            .collect()
    }

    #[test]
    fn pre_order_visits_parents_first() {
        assert_eq!(
            paths(&sample(), TraversalOrder::PreOrder),
            vec![".", "enc", "enc.layers", "enc.layers.0", "enc.layers.1", "dec"]
        );
    }

    #[test]
    fn post_order_visits_children_first() {
        assert_eq!(
            paths(&sample(), TraversalOrder::PostOrder),
            vec!["enc.layers.0", "enc.layers.1", "enc.layers", "enc", "dec", "."]
        );
    }

    #[test]
    fn traversal_is_restartable() {
        let root = sample();
        let first: Vec<_> = traverse(&root, TraversalOrder::PostOrder).collect();
        let second: Vec<_> = traverse(&root, TraversalOrder::PostOrder).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn traverse_subtree_yields_absolute_paths() {
        let root = sample();
        let paths: Vec<_> = traverse_at(&root, &Path::from("enc"), TraversalOrder::PostOrder)
            .unwrap()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(paths, vec!["enc.layers.0", "enc.layers.1", "enc.layers", "enc"]);
    }

    #[test]
    fn reserved_children_only_on_request() {
        let root = sample();
        let enc = get(&root, &Path::from("enc")).unwrap();
        let names = |include| -> Vec<String> {
            children_of(enc, include)
                .into_iter()
                .map(|(selector, _)| selector.to_string())
                .collect()
        };
        assert_eq!(names(false), vec!["layers"]);
        assert_eq!(names(true), vec!["_id", "layers"]);
    }

    #[test]
    fn get_reports_missing_selector() {
        let root = sample();
        assert_eq!(
            get(&root, &Path::from("enc.layers.1")).unwrap(),
            &Node::scalar(2)
        );

        let err = get(&root, &Path::from("enc.heads.0")).unwrap_err();
        assert_eq!(err.depth, 1);
        assert!(lookup(&root, &Path::from("dec.name")).is_none());
    }

    #[test]
    fn set_replaces_and_inserts() {
        let mut root = sample();

        let old = set(&mut root, &Path::from("enc.layers.0"), 10.into()).unwrap();
        assert_eq!(old, Some(Node::scalar(1)));

        let old = set(&mut root, &Path::from("enc.hidden_size"), 256.into()).unwrap();
        assert_eq!(old, None);
        assert_eq!(
            lookup(&root, &Path::from("enc.hidden_size")),
            Some(&Node::scalar(256))
        );

        assert!(set(&mut root, &Path::from("enc.layers.5"), 0.into()).is_err());
        assert!(set(&mut root, &Path::from("missing.field"), 0.into()).is_err());
        assert!(set(&mut root, &Path::from("dec.name"), 0.into()).is_err());
    }

    #[test]
    fn set_root() {
        let mut root = sample();
        set(&mut root, &Path::root(), 1.into()).unwrap();
        assert_eq!(root, Node::scalar(1));
    }

    #[test]
    fn hierarchy_lines() {
        let rendered = hierarchy(&sample(), TraversalOrder::PreOrder);
        assert_eq!(
            rendered,
            ".\t{2}\nenc\t!Encoder (_id=dim1)\nenc.layers\t[2]\nenc.layers.0\t1\nenc.layers.1\t2\ndec\t!Ref name=dim1\n"
        );
    }
}
