//! Nodes of a configuration tree
//!
//! A parsed document is a tree of [Node]s. Besides plain values and containers there are two node kinds that
//! only exist before materialization:
//! - [ComponentDescriptor]: something that can be constructed (a kind plus named parameters)
//! - [Reference]: a placeholder for "the object at this path" or "the object with this shared id"
//!
//! Materialization replaces both with [Node::Live] objects.
use crate::path::Path;
use crate::value::Value;
use indexmap::IndexMap;
use serde_yaml::value::{Tag, TaggedValue};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Named parameters of a component
pub type Params = IndexMap<String, Node>;

/// Reserved metadata key holding the shared id of a component
pub const SHARED_ID_KEY: &str = "_id";

/// Tag used for references in yaml documents
pub const REFERENCE_TAG: &str = "Ref";

#[derive(Debug, Clone)]
pub enum Node {
    Scalar(Value),
    Sequence(Vec<Node>),
    Mapping(IndexMap<String, Node>),
    Component(ComponentDescriptor),
    Reference(Reference),
    Live(Live),
}

impl Node {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Node::Scalar(value.into())
    }

    pub fn null() -> Self {
        Node::Scalar(Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentDescriptor> {
        match self {
            Node::Component(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn as_live(&self) -> Option<&Live> {
        match self {
            Node::Live(live) => Some(live),
            _ => None,
        }
    }

    /// Single line description used when printing hierarchies
    pub fn summary(&self) -> String {
        match self {
            Node::Scalar(value) => value.to_string(),
            Node::Sequence(items) => format!("[{}]", items.len()),
            Node::Mapping(entries) => format!("{{{}}}", entries.len()),
            Node::Component(descriptor) => match descriptor.shared_id() {
                Some(id) => format!("!{} ({SHARED_ID_KEY}={id})", descriptor.kind()),
                None => format!("!{}", descriptor.kind()),
            },
            Node::Reference(reference) => reference.to_string(),
            Node::Live(live) => format!("<{}>", live.kind()),
        }
    }

    /// yaml representation, components and references are tagged
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Node::Scalar(value) => value.to_yaml(),
            Node::Sequence(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Node::to_yaml).collect())
            }
            Node::Mapping(entries) => yaml_mapping(entries.iter()),
            Node::Component(descriptor) => tagged(
                descriptor.kind(),
                yaml_mapping(descriptor.meta.iter().chain(descriptor.init_params.iter())),
            ),
            Node::Reference(reference) => {
                let mut mapping = serde_yaml::Mapping::new();
                if let Some(name) = &reference.name {
                    mapping.insert("name".into(), name.as_str().into());
                }
                if let Some(path) = &reference.path {
                    mapping.insert("path".into(), path.to_string().into());
                }
                tagged(REFERENCE_TAG, serde_yaml::Value::Mapping(mapping))
            }
            Node::Live(live) => {
                let mut meta = Params::new();
                if let Some(id) = live.shared_id() {
                    meta.insert(SHARED_ID_KEY.to_string(), Node::scalar(id));
                }
                tagged(
                    live.kind(),
                    yaml_mapping(meta.iter().chain(live.serialize_params().iter())),
                )
            }
        }
    }
}

fn yaml_mapping<'a>(entries: impl Iterator<Item = (&'a String, &'a Node)>) -> serde_yaml::Value {
    serde_yaml::Value::Mapping(
        entries
            .map(|(key, node)| (serde_yaml::Value::String(key.clone()), node.to_yaml()))
            .collect(),
    )
}

/// `tag` empty: untagged, yaml has no empty tags
fn tagged(tag: &str, value: serde_yaml::Value) -> serde_yaml::Value {
    if tag.is_empty() {
        return value;
    }
    serde_yaml::Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value,
    }))
}

/// Structural equality, live objects compare by identity
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Scalar(a), Node::Scalar(b)) => a == b,
            (Node::Sequence(a), Node::Sequence(b)) => a == b,
            (Node::Mapping(a), Node::Mapping(b)) => a == b,
            (Node::Component(a), Node::Component(b)) => a == b,
            (Node::Reference(a), Node::Reference(b)) => a == b,
            (Node::Live(a), Node::Live(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl serde::ser::Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_yaml().serialize(serializer)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Scalar(value)
    }
}

macro_rules! scalar_into_node {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Scalar(value.into())
                }
            }
        )+
    };
}

scalar_into_node!(bool, i32, i64, f64, &str, String);

impl From<ComponentDescriptor> for Node {
    fn from(value: ComponentDescriptor) -> Self {
        Node::Component(value)
    }
}

impl From<Reference> for Node {
    fn from(value: Reference) -> Self {
        Node::Reference(value)
    }
}

impl From<Live> for Node {
    fn from(value: Live) -> Self {
        Node::Live(value)
    }
}

/// A constructible node: kind identity plus named children
///
/// Until staging, `init_params` holds the children as parsed. Staging snapshots them into `serialize_params`,
/// which is not touched afterwards. Default resolution, sharing and initialization only ever mutate `init_params`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    kind: String,
    /// reserved metadata fields (currently only [SHARED_ID_KEY])
    meta: IndexMap<String, Node>,
    init_params: Params,
    serialize_params: Option<Params>,
}

impl ComponentDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            meta: Default::default(),
            init_params: Default::default(),
            serialize_params: None,
        }
    }

    /// Builder style child insertion
    pub fn with(mut self, name: impl Into<String>, child: impl Into<Node>) -> Self {
        self.init_params.insert(name.into(), child.into());
        self
    }

    pub fn with_shared_id(mut self, id: impl Into<String>) -> Self {
        self.meta
            .insert(SHARED_ID_KEY.to_string(), Node::scalar(id.into()));
        self
    }

    /// Set a reserved metadata field, as found in a parsed document
    pub fn with_meta(mut self, key: impl Into<String>, node: Node) -> Self {
        self.meta.insert(key.into(), node);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Shared id, if it is present and a string
    pub fn shared_id(&self) -> Option<&str> {
        self.meta
            .get(SHARED_ID_KEY)
            .and_then(Node::as_scalar)
            .and_then(Value::as_str)
    }

    pub fn meta(&self) -> &IndexMap<String, Node> {
        &self.meta
    }

    pub fn init_params(&self) -> &Params {
        &self.init_params
    }

    pub fn init_params_mut(&mut self) -> &mut Params {
        &mut self.init_params
    }

    /// `None` before staging
    pub fn serialize_params(&self) -> Option<&Params> {
        self.serialize_params.as_ref()
    }

    pub fn is_staged(&self) -> bool {
        self.serialize_params.is_some()
    }

    /// Snapshot the current children. Later calls keep the first snapshot.
    pub(crate) fn stage(&mut self) {
        if self.serialize_params.is_none() {
            self.serialize_params = Some(self.init_params.clone());
        }
    }
}

/// "use the object at this path or with this shared id"
///
/// When both are present the path wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    pub name: Option<String>,
    pub path: Option<Path>,
}

impl Reference {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: None,
        }
    }

    pub fn by_path(path: impl Into<Path>) -> Self {
        Self {
            name: None,
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.name) {
            (Some(path), _) => write!(f, "!{REFERENCE_TAG} path={path}"),
            (None, Some(name)) => write!(f, "!{REFERENCE_TAG} name={name}"),
            (None, None) => write!(f, "!{REFERENCE_TAG} <empty>"),
        }
    }
}

/// Helper to get `&dyn Any` out of a trait object
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything a [crate::registry::Factory] constructs
pub trait Component: AsAny + fmt::Debug {
    /// Components that keep their own snapshot of the parameters they were built from return it here.
    /// Otherwise the descriptor's snapshot is attached to the [Live] object.
    fn serialize_params(&self) -> Option<&Params> {
        None
    }
}

/// A constructed object
///
/// Cloning is cheap and keeps identity, see [Live::ptr_eq].
#[derive(Clone)]
pub struct Live(Rc<LiveObject>);

struct LiveObject {
    kind: String,
    shared_id: Option<String>,
    object: Box<dyn Component>,
    /// empty when the object carries its own snapshot
    attached_params: Params,
}

impl Live {
    /// Wrap an object, `serialize_params` is only kept when the object does not carry its own
    pub fn new(
        kind: impl Into<String>,
        object: Box<dyn Component>,
        serialize_params: Params,
    ) -> Self {
        let attached_params = match object.serialize_params() {
            Some(_) => Params::new(),
            None => serialize_params,
        };

        Self(Rc::new(LiveObject {
            kind: kind.into(),
            shared_id: None,
            object,
            attached_params,
        }))
    }

    pub(crate) fn from_descriptor(
        descriptor: &ComponentDescriptor,
        object: Box<dyn Component>,
    ) -> Self {
        let attached_params = match object.serialize_params() {
            Some(_) => Params::new(),
            None => descriptor
                .serialize_params()
                .unwrap_or(descriptor.init_params())
                .clone(),
        };

        Self(Rc::new(LiveObject {
            kind: descriptor.kind().to_string(),
            shared_id: descriptor.shared_id().map(str::to_string),
            object,
            attached_params,
        }))
    }

    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    pub fn shared_id(&self) -> Option<&str> {
        self.0.shared_id.as_deref()
    }

    pub fn object(&self) -> &dyn Component {
        self.0.object.as_ref()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        AsAny::as_any(self.0.object.as_ref()).downcast_ref::<T>()
    }

    /// Parameters this object would be serialized with
    pub fn serialize_params(&self) -> &Params {
        self.0
            .object
            .serialize_params()
            .unwrap_or(&self.0.attached_params)
    }

    /// Object identity
    pub fn ptr_eq(&self, other: &Live) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Live {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Live")
            .field("kind", &self.0.kind)
            .field("object", &self.0.object)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Dummy(i64);
    impl Component for Dummy {}

    #[derive(Debug)]
    struct SelfDescribing(Params);
    impl Component for SelfDescribing {
        fn serialize_params(&self) -> Option<&Params> {
            Some(&self.0)
        }
    }

    #[test]
    fn descriptor_shared_id() {
        let descriptor = ComponentDescriptor::new("Encoder").with_shared_id("enc");
        assert_eq!(descriptor.shared_id(), Some("enc"));

        let not_a_string = ComponentDescriptor::new("Encoder").with_meta(SHARED_ID_KEY, 1.into());
        assert_eq!(not_a_string.shared_id(), None);
    }

    #[test]
    fn kindless_descriptor_renders_untagged() {
        let node: Node = ComponentDescriptor::new("").with("size", 3).into();
        let yaml = node.to_yaml();
        assert!(yaml.is_mapping());
        assert_eq!(yaml.get("size"), Some(&serde_yaml::Value::from(3)));
    }

    #[test]
    fn staging_snapshot_is_taken_once() {
        let mut descriptor = ComponentDescriptor::new("Linear").with("size", 3);
        descriptor.stage();
        descriptor.init_params_mut().insert("size".into(), 4.into());
        descriptor.stage();

        assert_eq!(descriptor.serialize_params().unwrap()["size"], Node::scalar(3));
        assert_eq!(descriptor.init_params()["size"], Node::scalar(4));
    }

    #[test]
    fn live_identity_and_downcast() {
        let live = Live::new("Dummy", Box::new(Dummy(7)), Params::new());
        let same = live.clone();
        let other = Live::new("Dummy", Box::new(Dummy(7)), Params::new());

        assert!(live.ptr_eq(&same));
        assert!(!live.ptr_eq(&other));
        assert_eq!(Node::Live(live.clone()), Node::Live(same));
        assert_ne!(Node::Live(live.clone()), Node::Live(other));
        assert_eq!(live.downcast_ref::<Dummy>().map(|d| d.0), Some(7));
        assert!(live.downcast_ref::<SelfDescribing>().is_none());
    }

    #[test]
    fn live_prefers_own_serialize_params() {
        let mut own = Params::new();
        own.insert("from".into(), "object".into());
        let mut attached = Params::new();
        attached.insert("from".into(), "descriptor".into());

        let live = Live::new("S", Box::new(SelfDescribing(own)), attached.clone());
        assert_eq!(live.serialize_params()["from"], Node::scalar("object"));

        let live = Live::new("D", Box::new(Dummy(0)), attached);
        assert_eq!(live.serialize_params()["from"], Node::scalar("descriptor"));
    }
}
