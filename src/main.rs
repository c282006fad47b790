mod app;
mod clipboard;
mod config;
mod logging;
mod render;
mod theme;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use papercut::blocks::{derive_blocks, SegmentationRule};
use papercut::codec::WireFormat;
use papercut::id::SequentialIdGen;
use papercut::record::{format_timestamp, plain_text};
use papercut::transcript;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "papercut", version, about = "Cut speaker excerpts out of transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transcript JSON files or directories to open
    sources: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in $EDITOR
    Config,
    /// Print the clipboard encoding of every word in SOURCES
    Encode {
        /// Use the compact seven-field format
        #[arg(long)]
        compact: bool,
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// Decode clipboard text from stdin and print the records as JSON
    Decode {
        /// Read the compact seven-field format
        #[arg(long)]
        compact: bool,
    },
    /// Print the speaker blocks of SOURCES
    Blocks {
        /// Also break blocks on silences longer than SECONDS
        #[arg(long, value_name = "SECONDS")]
        gap: Option<f64>,
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
}

fn wire_format(compact: bool) -> WireFormat {
    if compact {
        WireFormat::Compact
    } else {
        WireFormat::PaperCut
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        logging::init_stderr();
        match command {
            Commands::Config => return config::open_config_in_editor(),
            Commands::Encode { compact, sources } => {
                let records: Vec<_> = transcript::load_sources(&sources)
                    .into_iter()
                    .flat_map(|source| source.records)
                    .collect();
                println!("{}", wire_format(compact).encode(&records));
                return Ok(());
            }
            Commands::Decode { compact } => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
                let records = wire_format(compact).decode(&text);
                let json =
                    serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
                println!("{json}");
                return Ok(());
            }
            Commands::Blocks { gap, sources } => {
                let rule = match gap {
                    Some(max_gap) if max_gap.is_finite() && max_gap >= 0.0 => {
                        SegmentationRule::SpeakerOrGap { max_gap }
                    }
                    Some(max_gap) => anyhow::bail!("Invalid gap: {max_gap}"),
                    None => config::load_config()?.rule(),
                };
                let mut ids = SequentialIdGen::default();
                for source in transcript::load_sources(&sources) {
                    println!("== {} ==", source.name);
                    for block in derive_blocks(&source.records, rule, &mut ids) {
                        let start = block.start_time().unwrap_or(-1.0);
                        println!(
                            "[{}] {}: {}",
                            format_timestamp(start),
                            block.speaker,
                            plain_text(&block.items)
                        );
                    }
                }
                return Ok(());
            }
        }
    }

    let log_path = logging::init_file()?;
    let cfg = config::load_config()?;
    app::run_app(cli.sources, cfg, log_path)
}
