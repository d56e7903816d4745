//! Shared ids and reference targets
use crate::error::UnresolvedReferenceError;
use crate::node::{Node, Reference};
use crate::path::Path;
use crate::tree::{self, TraversalOrder};
use indexmap::IndexMap;

/// Shared id to the path of the first component declaring it
///
/// Collected once from the tree as parsed. Components that only appear later (e.g. through propagation) are not
/// part of it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamedPaths {
    paths: IndexMap<String, Path>,
}

impl NamedPaths {
    pub fn collect(root: &Node) -> Self {
        let mut named = Self::default();

        for (path, node) in tree::traverse(root, TraversalOrder::PreOrder) {
            let Some(id) = node.as_component().and_then(|d| d.shared_id()) else {
                continue;
            };

            if let Some(existing) = named.paths.get(id) {
                tracing::debug!(%id, %existing, duplicate=%path, "shared id declared more than once");
                continue;
            }

            tracing::trace!(%id, %path, "named path");
            named.paths.insert(id.to_string(), path);
        }

        named
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.paths.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths.iter().map(|(id, path)| (id.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Path a reference points to, an explicit path takes priority over the name
pub fn resolve(reference: &Reference, named: &NamedPaths) -> Result<Path, UnresolvedReferenceError> {
    if let Some(path) = &reference.path {
        return Ok(path.clone());
    }

    let Some(name) = &reference.name else {
        return Err(UnresolvedReferenceError::Empty);
    };

    named
        .get(name)
        .cloned()
        .ok_or_else(|| UnresolvedReferenceError::UnknownName(name.clone()))
}

/// Follow `path` through references until it names something that is not a reference
///
/// Returns `None` when a reference along the way does not resolve or the chain loops.
pub(crate) fn follow(root: &Node, path: Path, named: &NamedPaths) -> Option<Path> {
    let mut current = path;
    let mut seen = vec![];

    while let Some(Node::Reference(reference)) = tree::lookup(root, &current) {
        if seen.contains(&current) {
            return None;
        }
        let next = resolve(reference, named).ok()?;
        seen.push(std::mem::replace(&mut current, next));
    }

    Some(current)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::ComponentDescriptor;
    use pretty_assertions::assert_eq;

    fn tree() -> Node {
        Node::Mapping(IndexMap::from([
            (
                "enc".to_string(),
                ComponentDescriptor::new("Encoder").with_shared_id("dim1").into(),
            ),
            (
                "other".to_string(),
                ComponentDescriptor::new("Encoder").with_shared_id("dim1").into(),
            ),
            ("ref".to_string(), Reference::by_name("dim1").into()),
            ("ref_ref".to_string(), Reference::by_path("ref").into()),
            ("a".to_string(), Reference::by_path("b").into()),
            ("b".to_string(), Reference::by_path("a").into()),
        ]))
    }

    #[test]
    fn first_declaration_wins() {
        let named = NamedPaths::collect(&tree());
        assert_eq!(named.len(), 1);
        assert_eq!(named.get("dim1"), Some(&Path::from("enc")));
    }

    #[test]
    fn path_has_priority() {
        let named = NamedPaths::collect(&tree());
        let both = Reference {
            name: Some("dim1".into()),
            path: Some(Path::from("other")),
        };
        assert_eq!(resolve(&both, &named), Ok(Path::from("other")));
        assert_eq!(
            resolve(&Reference::by_name("dim1"), &named),
            Ok(Path::from("enc"))
        );
    }

    #[test]
    fn unresolved() {
        let named = NamedPaths::collect(&tree());
        assert_eq!(
            resolve(&Reference::by_name("nope"), &named),
            Err(UnresolvedReferenceError::UnknownName("nope".into()))
        );
        assert_eq!(
            resolve(&Reference::default(), &named),
            Err(UnresolvedReferenceError::Empty)
        );
    }

    #[test]
    fn follow_chains() {
        let root = tree();
        let named = NamedPaths::collect(&root);
        assert_eq!(
            follow(&root, Path::from("ref_ref"), &named),
            Some(Path::from("enc"))
        );
        assert_eq!(follow(&root, Path::from("a"), &named), None);
        assert_eq!(
            follow(&root, Path::from("missing"), &named),
            Some(Path::from("missing"))
        );
    }
}
