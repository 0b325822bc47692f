use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vssr_render::RenderOptions;

#[derive(Parser)]
#[command(name = "vssr", version, about = "Render Vue-style templates to HTML")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template file to HTML.
    Render {
        /// Path to the root template (.vue or .html)
        template: PathBuf,
        /// JSON file holding the root data object
        #[arg(long)]
        data: Option<PathBuf>,
        /// Directory of component templates, registered by file stem
        #[arg(long)]
        components: Option<PathBuf>,
        /// Maximum component nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Evaluate a single expression and print its JSON value.
    Eval {
        expression: String,
        /// JSON file holding the data object
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    vssr_cli::init_tracing(cli.verbose);

    match cli.command {
        Commands::Render {
            template,
            data,
            components,
            max_depth,
            out,
        } => {
            let mut options = RenderOptions::default();
            if let Some(depth) = max_depth {
                options.max_component_depth = depth;
            }
            let html =
                vssr_cli::render_cmd(&template, data.as_deref(), components.as_deref(), options)?;
            vssr_cli::write_output(&html, out.as_deref())?;
        }
        Commands::Eval { expression, data } => {
            let json = vssr_cli::eval_cmd(&expression, data.as_deref())?;
            vssr_cli::write_output(&json, None)?;
        }
    }
    Ok(())
}
