//! Parameter staging
//!
//! Runs once over the freshly copied tree, before shared parameters are propagated:
//! - every component gets its `serialize_params` snapshot
//! - a declared parameter that is not given but defaults to a [crate::node::Reference] is written into the
//!   component, so sharing and initialization see that reference like any authored one
//! - components are checked for a known kind and a well formed shared id
use crate::error::Error;
use crate::node::{ComponentDescriptor, Node, SHARED_ID_KEY};
use crate::path::Path;
use crate::registry::Registry;
use crate::tree::{self, TraversalOrder};

pub fn stage(root: &mut Node, registry: &Registry) -> Result<(), Error> {
    let components: Vec<Path> = tree::traverse(root, TraversalOrder::PreOrder)
        .filter(|(_, node)| node.as_component().is_some())
        .map(|(path, _)| path)
        .collect();

    for path in components {
        let Node::Component(descriptor) = tree::get_mut(root, &path)? else {
            continue;
        };
        stage_component(descriptor, &path, registry)?;
    }

    Ok(())
}

fn stage_component(
    descriptor: &mut ComponentDescriptor,
    path: &Path,
    registry: &Registry,
) -> Result<(), Error> {
    let malformed = |reason: String| Error::TreeShape {
        path: path.clone(),
        reason,
    };

    if descriptor.kind().is_empty() {
        return Err(malformed("component without kind".to_string()));
    }

    let Some(factory) = registry.get(descriptor.kind()) else {
        return Err(malformed(format!(
            "unknown component kind `{}`",
            descriptor.kind()
        )));
    };

    if let Some(id) = descriptor.meta().get(SHARED_ID_KEY) {
        if descriptor.shared_id().is_none() {
            return Err(malformed(format!(
                "`{SHARED_ID_KEY}` must be a string, found {}",
                id.summary()
            )));
        }
    }

    descriptor.stage();

    for param in factory.parameters() {
        let Some(default @ Node::Reference(_)) = &param.default else {
            continue;
        };

        if descriptor.init_params().contains_key(&param.name) {
            continue;
        }

        tracing::trace!(%path, param=%param.name, default=%default.summary(), "reference default");
        descriptor
            .init_params_mut()
            .insert(param.name.clone(), default.clone());
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::Reference;
    use crate::testing;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_before_defaults() {
        let mut root: Node = ComponentDescriptor::new("Tied").into();
        stage(&mut root, &testing::registry()).unwrap();

        let descriptor = root.as_component().unwrap();
        assert!(descriptor.serialize_params().unwrap().is_empty());
        assert_eq!(
            descriptor.init_params().get("target"),
            Some(&Reference::by_name("dim1").into())
        );
    }

    #[test]
    fn given_value_beats_reference_default() {
        let mut root: Node = ComponentDescriptor::new("Tied").with("target", 1).into();
        stage(&mut root, &testing::registry()).unwrap();

        let descriptor = root.as_component().unwrap();
        assert_eq!(descriptor.init_params().get("target"), Some(&Node::scalar(1)));
    }

    #[test]
    fn plain_defaults_stay_implicit() {
        let mut root: Node = ComponentDescriptor::new("Linear").with("size", 4).into();
        stage(&mut root, &testing::registry()).unwrap();

        let descriptor = root.as_component().unwrap();
        assert!(!descriptor.init_params().contains_key("bias"));
    }

    #[test]
    fn nested_components_are_staged() {
        let mut root = Node::Sequence(vec![ComponentDescriptor::new("Holder")
            .with("ref", ComponentDescriptor::new("Linear").with("size", 1))
            .into()]);
        stage(&mut root, &testing::registry()).unwrap();

        let inner = tree::get(&root, &Path::from("0.ref")).unwrap();
        assert!(inner.as_component().unwrap().is_staged());
    }

    #[test]
    fn unknown_kind() {
        let mut root = Node::Sequence(vec![ComponentDescriptor::new("Nope").into()]);
        let err = stage(&mut root, &testing::registry()).unwrap_err();
        assert!(matches!(err, Error::TreeShape { path, .. } if path == Path::from("0")));
    }

    #[test]
    fn shared_id_must_be_a_string() {
        let mut root: Node = ComponentDescriptor::new("Linear")
            .with_meta(SHARED_ID_KEY, 3.into())
            .into();
        let err = stage(&mut root, &testing::registry()).unwrap_err();
        assert!(matches!(err, Error::TreeShape { .. }));
    }
}
