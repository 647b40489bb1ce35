use crate::cmd::RenderArgs;
use crate::config::load_registry;
use crate::utils::read_source;
use anyhow::{Context, Result};
use tg_bbcode_parser::{bbcode_to_string, Parser};

pub async fn run_render_command(args: RenderArgs) -> Result<()> {
    let registry = load_registry(args.registry.as_deref()).await?;
    let source = read_source(args.file.as_deref()).await?;
    let root = Parser::with_registry(registry)
        .parse(&source)
        .context("when parsing source")?;
    print!("{}", bbcode_to_string(&root));
    Ok(())
}
