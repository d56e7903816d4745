//! # objtree - declarative object graphs
//!
//! Turns a tree of plain values and component descriptions into a graph of live objects.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `objtree` works internally.
//!
//! ### Terms
//!
//! - a document is parsed into a tree of [Node]s
//! - a `component` ([node::ComponentDescriptor]) is a node that can be constructed: it has a `kind` and named
//!   parameters, which are nodes themselves
//! - a `reference` ([node::Reference]) stands in for another component, either by shared id (`name`) or by
//!   [path::Path]
//! - a `shared id` (in yaml the reserved key `_id`) names a component so references can find it
//! - a `kind` is registered in a [Registry] together with its parameters, its defaults, its shared parameter
//!   groups and a constructor
//!
//! This is a valid document (see [document]):
//! ```yaml
//! enc: !Encoder
//!   _id: dim1
//! dec: !Decoder
//!   hidden_size: 256
//!   encoder: !Ref { name: dim1 }
//! ```
//!
//! ### Paths
//!
//! Every node is addressed by a [path::Path] from the root, written with dots: `dec.encoder`, `layers.0`.
//! The root itself is `.`.
//!
//! ### Materialization
//!
//! see [Materializer::materialize]
//!
//! The input is never modified, all steps work on a copy.
//!
//! 1. **named paths** ([resolve::NamedPaths]): shared id to path of the first component declaring it
//! 2. **staging** ([staging]): snapshot the parameters of every component as given and insert reference
//!    defaults
//! 3. **sharing** ([share]): top-down, parameters a kind declares as shared are unified. With exactly one value
//!    among the members that value is set on all of them, with more than one the group is ignored and a
//!    [Diagnostic] is emitted
//! 4. **initialization** ([init]): bottom-up, references are bound and components are constructed by their
//!    kind's factory once all of their children are live objects
//!
//! **Example**
//!
//! For the document above `Decoder` declares `["hidden_size", "encoder.hidden_size"]` as shared. Sharing follows
//! `dec.encoder` (a reference) to `enc` and sets `enc.hidden_size = 256`. Initialization builds `enc` first,
//! then binds `dec.encoder` to that very object and finally constructs `dec`:
//!
//! | **path**      | **before**            | **after**           |
//! |---------------|-----------------------|---------------------|
//! | `enc`         | `!Encoder (_id=dim1)` | `<Encoder>`         |
//! | `dec.encoder` | `!Ref name=dim1`      | `<Encoder>` (same)  |
//! | `dec`         | `!Decoder`            | `<Decoder>`         |
//!
//! A reference that leads back to a component still being built is a [Error::CyclicReference].
//!
//! ### Output
//!
//! A [node::Live] object serializes as its kind and the parameters it was configured with, so a materialized
//! tree renders (via [serde]) into a document that materializes into an equivalent tree.
//!
pub mod document;
pub mod error;
pub mod init;
pub mod materialize;
pub mod node;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod share;
pub mod staging;
pub mod tree;
pub mod value;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use materialize::{Diagnostic, Materialized, Materializer};
pub use node::Node;
pub use registry::Registry;
