//! Command line front end for Try It widgets.
//!
//! Usage:
//!   tryit <file.js>              # Run a file as a widget and show the result
//!   tryit -e "code"              # Same for inline code
//!   tryit --html -e "code"       # Print the result panel markup instead
//!   tryit [-i] [file.js]         # Interactive widget session

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use log::LevelFilter;

use tryit::sandbox::{ResultPresenter, SandboxConfig, TryItWidget};

#[derive(Parser, Debug)]
#[command(name = "tryit", about = "Run JavaScript snippets the way a Try It widget does", version)]
#[command(group(ArgGroup::new("source").args(["file", "eval"]).multiple(false)))]
struct Cli {
    /// JavaScript file to run. In interactive mode it seeds the editor.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Code to run instead of a file.
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    eval: Option<String>,

    /// Print the result panel as HTML.
    #[arg(long)]
    html: bool,

    /// Keep the widget open and read edits from stdin.
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Sandbox settings file (a `[sandbox]` section of `key = value` lines).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v, -vv, -vvv). Overrides TRYIT_LOG.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::new().filter_or("TRYIT_LOG", "warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => SandboxConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => SandboxConfig::default(),
    };

    let seed = match (&cli.file, &cli.eval) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("Error reading file '{}'", path.display()))?,
        (None, Some(code)) => code.clone(),
        (None, None) => String::new(),
    };

    let mut widget = TryItWidget::with_config(seed, config);

    if cli.interactive || (cli.file.is_none() && cli.eval.is_none()) {
        run_interactive(&mut widget, cli.html)?;
        return Ok(ExitCode::SUCCESS);
    }

    let succeeded = widget.run().map_or(false, |r| r.is_success());
    show(&widget, cli.html);
    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn show(widget: &TryItWidget, html: bool) {
    if html {
        println!("{}", widget.to_html());
    } else {
        print!("{}", ResultPresenter::to_terminal(&widget.render()));
    }
}

fn print_help() {
    println!("Type JavaScript lines to append them to the editor.");
    println!("  .run     run the editor content");
    println!("  .reset   restore the seed text and clear the result");
    println!("  .show    print the editor content");
    println!("  .clear   empty the editor");
    println!("  .exit    quit");
}

fn run_interactive(widget: &mut TryItWidget, html: bool) -> Result<()> {
    println!("tryit v{} - Try It widget {}", env!("CARGO_PKG_VERSION"), widget.id());
    print_help();
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        stdout.flush().context("Error writing prompt")?;

        let input = match lines.next() {
            None => break,
            Some(line) => line.context("Error reading input")?,
        };

        match input.trim() {
            ".exit" | ".quit" => break,
            ".run" => {
                widget.run();
                show(widget, html);
            }
            ".reset" => {
                widget.reset();
                println!("Editor reset.");
            }
            ".show" => println!("{}", widget.snippet().get_text()),
            ".clear" => widget.snippet_mut().set_text(""),
            ".help" => print_help(),
            _ => {
                let text = widget.snippet().get_text();
                let next = if text.is_empty() {
                    input
                } else {
                    format!("{}\n{}", text, input)
                };
                widget.snippet_mut().set_text(next);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
