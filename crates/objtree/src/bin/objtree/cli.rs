//! objtree cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one line per node: path and a short summary
    ///
    /// Reads yaml from stdin unless a file is provided (via --input-file)
    Hierarchy(HierarchyCommand),

    /// Print the shared ids of a document and the path each one resolves to
    Ids(IdsCommand),

    /// Print the subtree at a path
    Get(GetCommand),
}

#[derive(Parser, Debug)]
pub struct HierarchyCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Order in which nodes are listed
    #[arg(short = 'o', long = "order", default_value_t)]
    pub order: Order,
}

#[derive(Parser, Debug)]
pub struct IdsCommand {
    #[clap(flatten)]
    pub input: InputArgs,
}

#[derive(Parser, Debug)]
pub struct GetCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Dotted path, `.` is the whole document
    pub path: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a yaml file
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum Order {
    /// parents before children
    #[default]
    Pre,
    /// children before parents, the order components are constructed in
    Post,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Pre => f.write_str("pre"),
            Order::Post => f.write_str("post"),
        }
    }
}

impl From<Order> for objtree::tree::TraversalOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::Pre => objtree::tree::TraversalOrder::PreOrder,
            Order::Post => objtree::tree::TraversalOrder::PostOrder,
        }
    }
}
