use crate::cmd::TokensArgs;
use crate::utils::read_source;
use anyhow::{Context, Result};
use tg_bbcode_parser::Lexer;

pub async fn run_tokens_command(args: TokensArgs) -> Result<()> {
    let source = read_source(args.file.as_deref()).await?;
    for token in Lexer::new(&source) {
        let token = token.context("when scanning source")?;
        println!("{}", serde_json::to_string(&token)?);
    }
    Ok(())
}
