//! Addressing nodes from the tree root
//!
//! A [Path] is a sequence of [Selector]s. Paths are written dot-separated, where purely numeric segments
//! select a sequence element:
//!
//! | written            | selectors                                  |
//! |--------------------|--------------------------------------------|
//! | `.`                | root (no selectors)                        |
//! | `model.encoder`    | `Field(model)`, `Field(encoder)`           |
//! | `layers.0.dim`     | `Field(layers)`, `Index(0)`, `Field(dim)`  |
//!
//! Paths are used as cache keys during initialization and to declare shared parameters relative to a component.
use std::fmt;
use std::str::FromStr;

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selector {
    Field(String),
    Index(usize),
}

impl Selector {
    /// Field name as it would be written in a mapping key
    pub fn as_key(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Selector::Field(name) => name.as_str().into(),
            Selector::Index(index) => index.to_string().into(),
        }
    }

    /// Sequence index, fields that are numeric count as well
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Selector::Index(index) => Some(*index),
            Selector::Field(name) => name.parse().ok(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Field(name) => f.write_str(name),
            Selector::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(index) => Selector::Index(index),
            Err(_) => Selector::Field(value.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        match value.parse::<usize>() {
            Ok(index) => Selector::Index(index),
            Err(_) => Selector::Field(value),
        }
    }
}

impl From<usize> for Selector {
    fn from(value: usize) -> Self {
        Selector::Index(value)
    }
}

/// Absolute (or, for shared parameters, component-relative) address of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    selectors: Vec<Selector>,
}

impl Path {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// The empty path
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn last(&self) -> Option<&Selector> {
        self.selectors.last()
    }

    /// New path one level deeper
    pub fn child(&self, selector: impl Into<Selector>) -> Self {
        let mut selectors = self.selectors.clone();
        selectors.push(selector.into());
        Self { selectors }
    }

    /// Compose a path relative to `self` into an absolute one
    pub fn join(&self, relative: &Path) -> Self {
        let mut selectors = self.selectors.clone();
        selectors.extend(relative.selectors.iter().cloned());
        Self { selectors }
    }

    /// Returns `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.selectors.split_last()?;
        Some(Self::new(parent.to_vec()))
    }

    /// The first `len` selectors
    pub fn prefix(&self, len: usize) -> Self {
        Self::new(self.selectors[..len.min(self.selectors.len())].to_vec())
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.selectors.starts_with(&prefix.selectors)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.selectors.is_empty() {
            return f.write_str(".");
        }

        for (index, selector) in self.selectors.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{selector}")?;
        }

        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::from(s))
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        let trimmed = value.trim_matches('.');
        if trimmed.is_empty() {
            return Path::root();
        }

        Path::new(trimmed.split('.').map(Selector::from).collect())
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        Path::from(value.as_str())
    }
}

impl From<Vec<Selector>> for Path {
    fn from(selectors: Vec<Selector>) -> Self {
        Path::new(selectors)
    }
}

impl FromIterator<Selector> for Path {
    fn from_iter<T: IntoIterator<Item = Selector>>(iter: T) -> Self {
        Path::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_display() {
        let path = Path::from("layers.0.dim");
        assert_eq!(
            path.selectors(),
            &[
                Selector::Field("layers".into()),
                Selector::Index(0),
                Selector::Field("dim".into())
            ]
        );
        assert_eq!(path.to_string(), "layers.0.dim");
        assert_eq!(Path::from(".").to_string(), ".");
        assert_eq!(Path::from(""), Path::root());
    }

    #[test]
    fn join_relative_onto_declaring_node() {
        let declaring = Path::from("model.decoder");
        let relative = Path::from("attender.input_dim");
        assert_eq!(
            declaring.join(&relative),
            Path::from("model.decoder.attender.input_dim")
        );
        assert_eq!(Path::root().join(&relative), relative);
    }

    #[test]
    fn parent_and_prefix() {
        let path = Path::from("a.b.c");
        assert_eq!(path.parent(), Some(Path::from("a.b")));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(path.prefix(1), Path::from("a"));
        assert!(path.starts_with(&Path::from("a.b")));
        assert!(!path.starts_with(&Path::from("b")));
    }

    #[test]
    fn equal_selectors_hash_equal() {
        let mut set = std::collections::HashSet::new();
        set.insert(Path::from("a.0"));
        assert!(set.contains(&Path::root().child("a").child(0usize)));
    }
}
