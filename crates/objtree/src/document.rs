//! yaml documents to [Node] trees
//!
//! - a tagged mapping `!Kind { ... }` is a [ComponentDescriptor] of that kind, a tagged empty value has no
//!   parameters
//! - the reserved key `_id` of a component is its shared id
//! - `!Ref { name: ... }`, `!Ref { path: ... }` (or the short form `!Ref name`) is a [Reference]
//! - everything else maps to scalars, sequences and mappings
//!
//! ```yaml
//! enc: !Encoder
//!   _id: dim1
//! dec: !Decoder
//!   hidden_size: 256
//!   encoder: !Ref { name: dim1 }
//! ```
use crate::node::{ComponentDescriptor, Node, Reference, REFERENCE_TAG, SHARED_ID_KEY};
use crate::path::Path;
use crate::value::Value;
use indexmap::IndexMap;

pub fn parse_str(document: &str) -> Result<Node, LoadError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(document)?;
    from_yaml(&yaml)
}

pub fn load_file(file_path: &std::path::Path) -> Result<Node, LoadError> {
    let file_path = file_path.canonicalize()?;
    tracing::info!(path=%file_path.display(), "loading file");

    let file_contents = std::fs::read_to_string(&file_path)?;
    parse_str(&file_contents)
}

pub fn from_yaml(yaml: &serde_yaml::Value) -> Result<Node, LoadError> {
    convert(yaml, &Path::root())
}

fn convert(yaml: &serde_yaml::Value, path: &Path) -> Result<Node, LoadError> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Node::null(),
        Yaml::Bool(value) => Node::scalar(*value),
        Yaml::Number(number) => Node::Scalar(Value::from(number)),
        Yaml::String(value) => Node::scalar(value.as_str()),
        Yaml::Sequence(items) => Node::Sequence(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| convert(item, &path.child(index)))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => Node::Mapping(entries(mapping, path)?),
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let tag = tag.strip_prefix('!').unwrap_or(&tag);

            if tag == REFERENCE_TAG {
                Node::Reference(reference(&tagged.value, path)?)
            } else {
                Node::Component(component(tag, &tagged.value, path)?)
            }
        }
    })
}

fn entries(mapping: &serde_yaml::Mapping, path: &Path) -> Result<IndexMap<String, Node>, LoadError> {
    mapping
        .iter()
        .map(|(key, value)| {
            let Some(key) = key.as_str() else {
                return Err(LoadError::shape(path, format!("mapping key {key:?} is not a string")));
            };
            Ok((key.to_string(), convert(value, &path.child(key))?))
        })
        .collect()
}

fn component(kind: &str, yaml: &serde_yaml::Value, path: &Path) -> Result<ComponentDescriptor, LoadError> {
    if kind.is_empty() {
        return Err(LoadError::shape(path, "empty component tag".to_string()));
    }

    let params = match yaml {
        serde_yaml::Value::Null => IndexMap::new(),
        serde_yaml::Value::Mapping(mapping) => entries(mapping, path)?,
        other => {
            return Err(LoadError::shape(
                path,
                format!("component `!{kind}` expects a mapping, found {}", kind_of(other)),
            ))
        }
    };

    let mut descriptor = ComponentDescriptor::new(kind);
    for (name, node) in params {
        descriptor = if name == SHARED_ID_KEY {
            descriptor.with_meta(name, node)
        } else {
            descriptor.with(name, node)
        };
    }

    Ok(descriptor)
}

fn reference(yaml: &serde_yaml::Value, path: &Path) -> Result<Reference, LoadError> {
    let mapping = match yaml {
        serde_yaml::Value::String(name) => return Ok(Reference::by_name(name.as_str())),
        serde_yaml::Value::Mapping(mapping) => mapping,
        other => {
            return Err(LoadError::shape(
                path,
                format!("`!{REFERENCE_TAG}` expects a name or a mapping, found {}", kind_of(other)),
            ))
        }
    };

    let mut reference = Reference::default();
    for (key, value) in mapping {
        let (Some(key), Some(value)) = (key.as_str(), value.as_str()) else {
            return Err(LoadError::shape(
                path,
                format!("`!{REFERENCE_TAG}` entries must be strings"),
            ));
        };

        match key {
            "name" => reference.name = Some(value.to_string()),
            "path" => reference.path = Some(Path::from(value)),
            other => {
                return Err(LoadError::shape(
                    path,
                    format!("unknown `!{REFERENCE_TAG}` key `{other}`, expected `name` or `path`"),
                ))
            }
        }
    }

    Ok(reference)
}

fn kind_of(yaml: &serde_yaml::Value) -> &'static str {
    match yaml {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml document")]
    YamlParseFailed(#[from] serde_yaml::Error),
    #[error("Unsupported document shape at `{path}`: {reason}")]
    Shape { path: Path, reason: String },
}

impl LoadError {
    fn shape(path: &Path, reason: String) -> Self {
        LoadError::Shape {
            path: path.clone(),
            reason,
        }
    }
}

/// Utility macro to create a [Node] tree from a yaml document
///
/// ```
/// # use objtree::yaml_tree;
/// let tree = yaml_tree!("linear: !Linear { size: 4 }");
/// assert!(tree.as_component().is_none());
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use objtree::yaml_tree;
/// yaml_tree!("broken: [1, 2");
/// ```
#[macro_export]
macro_rules! yaml_tree {
    { $expr:expr } => {
        $crate::document::parse_str($expr).expect("document must parse")
    };
}
