//! Snapshot tests
//!
//! Renders the hierarchy of a document before and after materialization and compares it to the stored
//! snapshots.
use objtree::node::Component;
use objtree::registry::{Args, KindSpec, Registry};
use objtree::tree::{self, TraversalOrder};
use objtree::{yaml_tree, Materializer};

#[derive(Debug)]
struct Linear;
impl Component for Linear {}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("OBJTREE_LOG"))
        .with_writer(std::io::stderr)
        .try_init();
}

#[test]
fn parsed_hierarchy() {
    init_logging();

    let root = yaml_tree! {r#"
    model: !Model
      _id: main
      dim: 512
      encoder: !Encoder
        _id: dim1
        layers:
          - !Linear { size: 512 }
          - !Linear { size: 512, bias: false }
      decoder: !Decoder
        encoder: !Ref { name: dim1 }
        attender: !Ref { path: model.encoder }
    vocab: [a, b]
    "#};

    let rendered = tree::hierarchy(&root, TraversalOrder::PreOrder);
    insta::assert_snapshot!("parsed_hierarchy", rendered);
}

#[test]
fn materialized_hierarchy() {
    init_logging();

    let mut registry = Registry::default();
    registry.register(
        "Linear",
        KindSpec::new(|args: Args| {
            args.integer("size")?;
            Ok(Box::new(Linear))
        })
        .required("size"),
    );

    let root = yaml_tree! {r#"
    layers:
      - !Linear { _id: first, size: 2 }
      - !Ref { name: first }
    sizes: [2, 2.5]
    "#};

    let materialized = Materializer::new(registry).materialize(&root).unwrap();
    let rendered = tree::hierarchy(&materialized.root, TraversalOrder::PreOrder);
    insta::assert_snapshot!("materialized_hierarchy", rendered);
}
