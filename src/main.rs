//! inkpress CLI - Wattpad story downloader and PDF press.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkpress::config::Config;
use inkpress::console::Console;
use inkpress::utils::sanitize_filename;
use inkpress::wattpad::{StoryBundle, WattpadClient};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Wattpad story downloader and PDF press.
#[derive(Parser, Debug)]
#[command(name = "inkpress")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a story and press it into a PDF file.
    Fetch {
        /// Story URL or numeric story id.
        story: String,

        /// Output file path (defaults to the story title in the configured
        /// output directory).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start at chapter N (1-based).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        start: Option<u32>,

        /// Stop at chapter N (1-based, inclusive).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        end: Option<u32>,
    },

    /// Run the HTTP service with the browser progress page.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("inkpress=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match args.command {
        Command::Fetch {
            story,
            output,
            start,
            end,
        } => fetch_story(config, &story, output, start, end).await,
        Command::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            inkpress::server::serve(config).await
        }
    }
}

async fn fetch_story(
    config: Config,
    story: &str,
    output: Option<PathBuf>,
    start: Option<u32>,
    end: Option<u32>,
) -> Result<()> {
    let console = Console::new();
    console.section("inkpress - Wattpad story press");

    let client = WattpadClient::new(config.scraping.clone())
        .context("Failed to create content host client")?;

    console.step("Fetching story information...");
    let mut info = client
        .story(story)
        .await
        .context("Failed to fetch story info")?;

    console.success(&format!("Found: {} by {}", info.title, info.author));
    console.info(&format!(
        "{} chapters listed",
        console.count(info.parts.len())
    ));

    let total = info.parts.len() as u32;
    let (start_chapter, end_chapter) = validate_chapter_range(start, end, total)?;
    if (start_chapter, end_chapter) != (1, total) {
        console.info(&format!(
            "Downloading chapters {} to {} of {}",
            start_chapter, end_chapter, total
        ));
        info.parts = info.parts[(start_chapter as usize - 1)..(end_chapter as usize)].to_vec();
    }

    console.step(&format!("Downloading {} chapters...", info.parts.len()));
    let chapters = client.fetch_all(&info.parts).await;

    let failed = chapters.iter().filter(|c| c.is_unavailable()).count();
    if failed > 0 {
        console.warning(&format!(
            "{} of {} chapters could not be retrieved; placeholders were inserted",
            failed,
            chapters.len()
        ));
    } else {
        console.success(&format!("Downloaded {} chapters", chapters.len()));
    }

    let path = output.unwrap_or_else(|| {
        config
            .paths
            .output_directory
            .join(format!("{}.pdf", sanitize_filename(&info.title)))
    });

    console.step("Assembling PDF...");
    let bundle = StoryBundle { info, chapters };
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    inkpress::pdf::assemble(&bundle, &config.output, BufWriter::new(file))
        .context("Failed to assemble PDF")?;

    console.success(&format!("Wrote {}", path.display()));
    Ok(())
}

/// Validates the chapter range arguments against the chapter list.
fn validate_chapter_range(
    start: Option<u32>,
    end: Option<u32>,
    total_chapters: u32,
) -> Result<(u32, u32)> {
    if total_chapters == 0 {
        anyhow::bail!("Story has no chapters");
    }

    let start_chapter = start.unwrap_or(1);
    let end_chapter = end.unwrap_or(total_chapters);

    if start_chapter > end_chapter {
        anyhow::bail!(
            "Start chapter ({}) cannot be greater than end chapter ({})",
            start_chapter,
            end_chapter
        );
    }

    if end_chapter > total_chapters {
        anyhow::bail!(
            "End chapter ({}) exceeds total chapters ({})",
            end_chapter,
            total_chapters
        );
    }

    Ok((start_chapter, end_chapter))
}
