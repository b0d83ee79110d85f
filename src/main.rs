use clap::{Parser, Subcommand, ValueEnum};
use objinv::fetch::HttpFetcher;
use objinv::fileops;
use objinv::intersphinx::infer_mapping;
use objinv::inventory::{Inventory, Source};
use objinv::suggest::{SuggestOptions, DEFAULT_SUGGEST_THRESHOLD};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "objinv", about = "Sphinx objects.inv inventory toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Plain,
    Zlib,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an inventory between plaintext, zlib and JSON forms
    Convert {
        #[arg(value_enum)]
        mode: Mode,
        /// Input file, or a URL with --url
        infile: String,
        outfile: PathBuf,
        /// Treat INFILE as a URL
        #[arg(short, long)]
        url: bool,
        /// Expand all abbreviations in the output
        #[arg(short, long, conflicts_with = "contract")]
        expand: bool,
        /// Abbreviate uri/dispname where possible
        #[arg(short, long)]
        contract: bool,
        /// Replace OUTFILE if it exists
        #[arg(short, long)]
        overwrite: bool,
        /// Fetch timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Fuzzy-search an inventory for objects
    Suggest {
        /// Input file, or a URL with --url
        infile: String,
        search: String,
        #[arg(short, long, default_value_t = DEFAULT_SUGGEST_THRESHOLD)]
        thresh: u8,
        /// Show match scores
        #[arg(short = 's', long)]
        with_score: bool,
        /// Show object indices
        #[arg(short = 'i', long)]
        with_index: bool,
        #[arg(short, long)]
        url: bool,
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Infer an intersphinx mapping entry from a docs page URL
    Infer {
        page_url: String,
        inventory_url: String,
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {

        // ── Convert ──────────────────────────────────────────────────────────
        Commands::Convert { mode, infile, outfile, url, expand, contract, overwrite, timeout } => {
            if outfile.exists() && !overwrite {
                return Err(format!("{} exists; pass --overwrite to replace it", outfile.display()).into());
            }
            let inv = open_inventory(&infile, url, timeout)?;

            match mode {
                Mode::Plain => fileops::write_bytes(&outfile, &inv.data_file(expand, contract)?)?,
                Mode::Zlib  => {
                    // The compressed form is contracted unless expansion is asked for.
                    let plain = inv.data_file(expand, !expand)?;
                    fileops::write_bytes(&outfile, &objinv::compress(&plain)?)?
                }
                Mode::Json  => fileops::write_json(&outfile, &inv.json_dict(), true)?,
            }
            println!("Conversion completed.");
            println!("'{}' converted to '{}' ({} objects)", infile, outfile.display(), inv.count());
        }

        // ── Suggest ──────────────────────────────────────────────────────────
        Commands::Suggest { infile, search, thresh, with_score, with_index, url, timeout } => {
            let inv  = open_inventory(&infile, url, timeout)?;
            let opts = SuggestOptions { threshold: thresh, with_score, with_index };
            let hits = inv.suggest(&search, opts)?;
            if hits.is_empty() {
                println!("No results found.");
            }
            for hit in hits {
                let score = hit.score.map(|s| format!("{s:>4}  ")).unwrap_or_default();
                let index = hit.index.map(|i| format!("{i:>6}  ")).unwrap_or_default();
                println!("{score}{index}{}", hit.rst);
            }
        }

        // ── Infer ────────────────────────────────────────────────────────────
        Commands::Infer { page_url, inventory_url, timeout } => {
            let inv = open_inventory(&inventory_url, true, timeout)?;
            let (base, inv_url) = infer_mapping(&page_url, &inventory_url, &inv)?;
            match inv_url {
                Some(u) => println!("(\"{base}\", \"{u}\")"),
                None    => println!("(\"{base}\", None)"),
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn open_inventory(input: &str, is_url: bool, timeout: u64) -> Result<Inventory, Box<dyn std::error::Error>> {
    let source = if is_url {
        Source::Url(input.to_string())
    } else if Path::new(input).extension().is_some_and(|e| e == "json") {
        Source::Dict(fileops::read_json(input)?)
    } else {
        Source::Path(PathBuf::from(input))
    };
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(timeout));
    Ok(Inventory::load_with(Some(source), &fetcher)?)
}
