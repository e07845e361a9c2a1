//! CLI for contentgraph - resolves a delivery response into a JSON graph

use std::path::PathBuf;
use std::str::FromStr;
use std::{fs, process};

use clap::Parser;
use contentgraph::config::load_config;
use contentgraph::{Error, ItemResponse, JsonRenderer, ListingResponse, Renderer, Result};
use log::{debug, error, info, LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input response JSON file path
    input: PathBuf,

    /// Output JSON file path (optional, prints to stdout if not specified)
    output: Option<PathBuf>,

    /// Configuration file describing content types and link patterns
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat the input as a listing response (`items` array)
    #[arg(long)]
    listing: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let resolver = config.resolver();
    let renderer = JsonRenderer::new(!args.compact);

    let json = fs::read_to_string(&args.input)?;
    let rendered = if args.listing {
        let response = ListingResponse::from_json(&json)?;
        let graphs = resolver.resolve_listing(&response);
        renderer.render_all(&graphs)?
    } else {
        let response = ItemResponse::from_json(&json)?;
        let graph = resolver.resolve_response(&response).ok_or_else(|| {
            Error::Unresolvable(format!(
                "item '{}' of type '{}' has no configured content type",
                response.item.codename().unwrap_or("<no system>"),
                response.item.item_type().unwrap_or("<no type>")
            ))
        })?;
        renderer.render(&graph)?
    };

    match &args.output {
        Some(output) => {
            fs::write(output, &rendered)?;
            info!(output_file = output.display().to_string(); "Graph written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    if let Err(err) = run(&args) {
        error!(err:err; "Run failed");
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
