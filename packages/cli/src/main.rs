mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{eval, options, tree, EvalArgs, OptionsArgs, TreeArgs};
use tracing_subscriber::EnvFilter;

/// formbind - evaluate form expressions against nested form data
#[derive(Parser, Debug)]
#[command(name = "formbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an expression, optionally inside a repeating-group row
    Eval(EvalArgs),

    /// Print the component tree of a layout with its rows expanded
    Tree(TreeArgs),

    /// Build the options of an option source
    Options(OptionsArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Eval(args) => eval(args, &cwd),
        Command::Tree(args) => tree(args, &cwd),
        Command::Options(args) => options(args, &cwd),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
