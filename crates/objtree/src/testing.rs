//! Kinds used by unit tests
use crate::node::{Component, Live, Node, Params, Reference};
use crate::registry::{Args, KindSpec, ParamError, Registry, CONTEXT_PARAM};
use std::cell::Cell;
use std::rc::Rc;

/// Generic component that keeps whatever it was constructed with
#[derive(Debug)]
pub(crate) struct Built {
    pub kind: String,
    pub params: Params,
}

impl Built {
    pub fn live(&self, name: &str) -> Option<&Live> {
        self.params.get(name).and_then(Node::as_live)
    }
}

impl Component for Built {}

fn keep(args: Args) -> Result<Box<dyn Component>, ParamError> {
    Ok(Box::new(Built {
        kind: args.kind().to_string(),
        params: args.into_params(),
    }))
}

type Construct = Rc<dyn Fn(Args) -> Result<Box<dyn Component>, ParamError>>;

fn kind(construct: &Construct) -> KindSpec {
    let construct = Rc::clone(construct);
    KindSpec::new(move |args| construct(args))
}

pub(crate) fn registry() -> Registry {
    registry_counting(Rc::new(Cell::new(0)))
}

/// Same as [registry], `constructed` counts constructor invocations
pub(crate) fn registry_counting(constructed: Rc<Cell<usize>>) -> Registry {
    let counting: Construct = Rc::new(move |args: Args| {
        constructed.set(constructed.get() + 1);
        keep(args)
    });

    let mut registry = Registry::default();
    registry
        .register(
            "Linear",
            kind(&counting).required("size").optional("bias", true),
        )
        .register(
            "Attender",
            kind(&counting)
                .optional("input_dim", Node::null())
                .optional("state_dim", Node::null()),
        )
        .register(
            "Encoder",
            kind(&counting)
                .optional("hidden_size", Node::null())
                .optional("input_dim", Node::null()),
        )
        .register(
            "Decoder",
            kind(&counting)
                .optional("hidden_size", Node::null())
                .optional("attender", Node::null())
                .optional("encoder", Node::null())
                .shared(["hidden_size", "attender.input_dim"])
                .shared(["hidden_size", "encoder.hidden_size"]),
        )
        .register(
            "Model",
            kind(&counting)
                .optional("dim", Node::null())
                .optional("encoder", Node::null())
                .optional("decoder", Node::null())
                .shared(["dim", "decoder.hidden_size"])
                .shared(["dim", "encoder.hidden_size"]),
        )
        .register(
            "Holder",
            kind(&counting)
                .optional("ref", Node::null())
                .optional("items", Node::null()),
        )
        .register(
            "Stack",
            kind(&counting)
                .optional("dim", Node::null())
                .optional("layers", Node::null())
                .shared(["dim", "layers.size"])
                .shared(["dim", "layers.3"]),
        )
        .register(
            "Tied",
            kind(&counting).optional("target", Reference::by_name("dim1")),
        )
        .register(
            "Contextual",
            kind(&counting).optional(CONTEXT_PARAM, Node::null()),
        );

    registry
}
