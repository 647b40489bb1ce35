use crate::cmd::ParseArgs;
use crate::config::load_registry;
use crate::utils::read_source;
use anyhow::{Context, Result};
use tg_bbcode_parser::Parser;
use tracing::trace;

pub async fn run_parse_command(args: ParseArgs) -> Result<()> {
    let registry = load_registry(args.registry.as_deref()).await?;
    let source = read_source(args.file.as_deref()).await?;
    trace!(len = source.len(), tags = registry.len(), "parsing source");

    let root = Parser::with_registry(registry)
        .parse(&source)
        .context("when parsing source")?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&root)?
    } else {
        serde_json::to_string(&root)?
    };
    println!("{output}");
    Ok(())
}
