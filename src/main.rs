//! Umbra CLI
//!
//! Inspect templates and toolbar layouts without a host process.
//!
//! Usage:
//!   umbra tokens "[a] > 1 ? [b]"     # Token stream with byte ranges
//!   umbra parse "[a] > 1 ? [b]"      # Expression tree
//!   umbra eval "[x]!" --set x=hi     # Render a template
//!   umbra layout --width 800         # Lay out the configured toolbar
//!   umbra placeholders               # List registered placeholders

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use umbra_ui::config::Settings;
use umbra_ui::dump::{format_placeholders, print_tree, DumpOptions};
use umbra_ui::script::{parse, tokenize};
use umbra_ui::{Session, SessionBuilder};

#[derive(Parser)]
#[command(name = "umbra")]
#[command(about = "Toolbar template and layout tools")]
struct Cli {
    /// Settings file (defaults to the user data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tokens of a template
    Tokens { template: String },

    /// Print the parsed expression of a template
    Parse { template: String },

    /// Render a template against the configured placeholders
    Eval {
        template: String,

        /// Set a placeholder before rendering (repeatable)
        #[arg(short, long, value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Number of update ticks to run first
        #[arg(long, default_value_t = 1)]
        ticks: u32,
    },

    /// Lay out the configured toolbar and dump the node tree
    Layout {
        /// Available width (defaults to the configured viewport)
        #[arg(long)]
        width: Option<f32>,

        /// Available height (defaults to the configured viewport)
        #[arg(long)]
        height: Option<f32>,

        /// Filter by node name (substring match)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show only visible nodes
        #[arg(long)]
        visible_only: bool,

        /// Print the draw list instead of the tree
        #[arg(long)]
        draw: bool,
    },

    /// List placeholders after one tick
    Placeholders,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tokens { template } => {
            let stream = tokenize(&template);
            for token in &stream.tokens {
                println!("{:>4}..{:<4} {:<12} {:?}", token.start, token.end, token.kind, token.text);
            }
            for warning in &stream.warnings {
                eprintln!("warning at {}: {}", warning.offset, warning.message);
            }
        }
        Commands::Parse { template } => {
            let stream = tokenize(&template);
            let expr = parse(&stream)?;
            println!("{}", expr);
            println!("{:#?}", expr);
        }
        Commands::Eval {
            template,
            set,
            ticks,
        } => {
            let mut session = build_session(&settings)?;
            for _ in 0..ticks {
                session.on_tick(0);
            }
            for assignment in &set {
                let Some((name, value)) = assignment.split_once('=') else {
                    return Err(format!("expected NAME=VALUE, got '{}'", assignment).into());
                };
                let placeholders = session.placeholders_mut();
                if placeholders.has(name) {
                    placeholders.set(name, value)?;
                } else {
                    placeholders.register(name, value, "Set on the command line")?;
                }
            }
            println!("{}", session.render_template(&template)?);
        }
        Commands::Layout {
            width,
            height,
            filter,
            visible_only,
            draw,
        } => {
            let mut session = build_session(&settings)?;
            session.on_tick(0);
            let width = width.unwrap_or(settings.viewport_width);
            let height = height.unwrap_or(settings.viewport_height);
            let list = session.on_draw(width, height);
            if draw {
                for command in list.commands() {
                    println!("{:?}", command);
                }
            } else if let Some(root) = session.toolbar_root() {
                let options = DumpOptions {
                    filter: filter.as_deref(),
                    visible_only,
                };
                print_tree(session.tree(), root, &options);
            }
        }
        Commands::Placeholders => {
            let mut session = build_session(&settings)?;
            session.on_tick(0);
            print!("{}", format_placeholders(session.placeholders()));
        }
    }

    Ok(())
}

fn build_session(settings: &Settings) -> umbra_ui::Result<Session> {
    SessionBuilder::from_settings(settings).build()
}
