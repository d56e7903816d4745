//! Errors that abort a materialization
//!
//! Every variant of [Error] is fatal: a materialization either returns the complete object graph or one of these.
//! Shared parameter conflicts are not errors, see [crate::materialize::Diagnostic].
use crate::path::Path;
use crate::share::SharedGroup;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("malformed component at `{path}`: {reason}")]
    TreeShape { path: Path, reason: String },

    #[error(
        "shared parameters {group} of `{path}` contain the component `{offending}` ({kind}) which is not permitted"
    )]
    SharingScope {
        path: Path,
        group: SharedGroup,
        offending: Path,
        kind: String,
    },

    #[error("reference at `{at}` could not be resolved")]
    UnresolvedReference {
        at: Path,
        #[source]
        source: UnresolvedReferenceError,
    },

    #[error("reference cycle detected: {}", display_cycle(.cycle))]
    CyclicReference { cycle: Vec<Path> },

    #[error(transparent)]
    ComponentInit(#[from] Box<ComponentInitError>),
}

fn display_cycle(cycle: &[Path]) -> String {
    cycle
        .iter()
        .map(|path| format!("`{path}`"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Navigation into a path that does not exist
#[derive(Debug, Clone, PartialEq)]
pub struct PathError {
    pub path: Path,
    /// number of selectors that could be followed
    pub depth: usize,
}

impl std::error::Error for PathError {}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path.selectors().get(self.depth) {
            Some(selector) => write!(
                f,
                "no node at `{}`: `{}` has no child `{selector}`",
                self.path,
                self.path.prefix(self.depth)
            ),
            None => write!(f, "no node at `{}`", self.path),
        }
    }
}

impl PathError {
    pub(crate) fn new(path: &Path, depth: usize) -> Self {
        Self {
            path: path.clone(),
            depth,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnresolvedReferenceError {
    #[error("reference names neither a path nor a shared id")]
    Empty,
    #[error("no component with shared id `{0}`")]
    UnknownName(String),
    #[error("nothing at referenced path `{0}`")]
    MissingTarget(Path),
    #[error("target `{0}` is not a component")]
    NotAComponent(Path),
}

/// A constructor rejected its parameters
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error(
    "{kind} at `{path}` could not be initialized using params [{}], expecting params [{}]: {reason}",
    .attempted.join(", "),
    .expected.join(", ")
)]
pub struct ComponentInitError {
    pub path: Path,
    pub kind: String,
    pub attempted: Vec<String>,
    pub expected: Vec<String>,
    /// required parameters that were neither given nor defaulted
    pub missing: Vec<String>,
    /// given parameters the kind does not declare
    pub unexpected: Vec<String>,
    pub reason: String,
}
