use crate::parse::run_parse_command;
use crate::render::run_render_command;
use crate::tokens::run_tokens_command;
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};

///////// Args /////////

#[derive(Clone, Debug, Args)]
pub struct ParseArgs {
    #[arg(help = "File path to parse content, read from stdin if absent")]
    pub file: Option<String>,

    #[arg(
        short = 'p',
        long = "pretty",
        help = "Pretty print the json output",
        action = ArgAction::SetTrue,
    )]
    pub pretty: bool,

    #[arg(
        short = 'r',
        long = "registry",
        help = "Path to the toml file defining known tags. Use the built-in tags if absent"
    )]
    pub registry: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct TokensArgs {
    #[arg(help = "File path to scan content, read from stdin if absent")]
    pub file: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct RenderArgs {
    #[arg(help = "File path to parse content, read from stdin if absent")]
    pub file: Option<String>,

    #[arg(
        short = 'r',
        long = "registry",
        help = "Path to the toml file defining known tags. Use the built-in tags if absent"
    )]
    pub registry: Option<String>,
}

///////// Subcommand /////////

#[derive(Clone, Debug, Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    #[command(about = "parse bbcode and print the token tree as json")]
    Parse(ParseArgs),

    #[command(about = "print lexed tokens as json, one token per line")]
    Tokens(TokensArgs),

    #[command(about = "parse bbcode and print it back from the token tree")]
    Render(RenderArgs),
}

/// Main entry of all subcommands.
pub async fn run_command_with_args(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Parse(parse_args) => run_parse_command(parse_args).await,
        Command::Tokens(tokens_args) => run_tokens_command(tokens_args).await,
        Command::Render(render_args) => run_render_command(render_args).await,
    }
}
