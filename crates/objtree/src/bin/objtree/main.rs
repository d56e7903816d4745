mod cli;

use objtree::path::Path;
use objtree::resolve::NamedPaths;
use objtree::{tree, Node};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("OBJTREE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let command_result = match cli.command {
        cli::Command::Hierarchy(hierarchy_cli) => hierarchy(hierarchy_cli),
        cli::Command::Ids(ids_cli) => ids(ids_cli),
        cli::Command::Get(get_cli) => get(get_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn hierarchy(cli: cli::HierarchyCommand) -> anyhow::Result<()> {
    let root = load(&cli.input)?;
    print!("{}", tree::hierarchy(&root, cli.order.into()));
    Ok(())
}

pub fn ids(cli: cli::IdsCommand) -> anyhow::Result<()> {
    let root = load(&cli.input)?;
    for (id, path) in NamedPaths::collect(&root).iter() {
        println!("{id}\t{path}");
    }
    Ok(())
}

pub fn get(cli: cli::GetCommand) -> anyhow::Result<()> {
    let root = load(&cli.input)?;
    let path: Path = cli.path.as_str().into();
    let node = tree::get(&root, &path)?;

    output(&cli.output, node)?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Node> {
    let Some(file_path) = &input.file else {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        return Ok(objtree::document::parse_str(&stdin)?);
    };

    Ok(objtree::document::load_file(file_path)?)
}

fn output(output: &cli::OutputArgs, node: &Node) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), node)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), node)?,
    };

    Ok(())
}
