use clap::{Parser, Subcommand};
use env_logger::Env;
use linkpage::config::{self, FetchPolicy};
use linkpage::{output, page};
use log::{info, warn};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "linkpage")]
#[command(about = "Static generator for link-in-bio pages")]
#[command(long_about = "\
Static generator for link-in-bio pages

A site directory holds the page content as JSON plus a folder of SVG icons.
The build renders everything into a single index.html with inline favicons,
metadata and behaviour, and copies the remaining static assets beside it.

Site structure:

  site/
  ├── linkpage.toml                # Build settings (optional)
  └── assets/
      ├── js/
      │   ├── data.json            # mainLinks, socialLinks, projects, affiliateLinks,
      │   │                        # sponsorsAffiliates, openSourceSoftware, books
      │   └── config.json          # site metadata, favicon emoji, profile, footer
      └── img/
          ├── avatar.jpg           # Copied as-is
          └── icons/
              └── github.svg       # Referenced by \"icon\": \"github\"

Entries of type \"discord\" copy their username instead of navigating.
Missing icons render as a circle and are listed by 'linkpage check'.

Run 'linkpage gen-config' to generate a documented linkpage.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render index.html and copy static assets
    Build,
    /// Validate the site directory without building
    Check,
    /// Print a stock linkpage.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let options = config::load_config(&cli.source)?;
            if options.render.fetch_policy == FetchPolicy::Concurrent {
                init_thread_pool(&options.processing);
            }
            println!(
                "==> Building {} → {}",
                cli.source.display(),
                cli.output.display()
            );
            let report = page::build(&cli.source, &cli.output, &options)?;
            output::print_build_output(&report);
            if report.failed {
                warn!("page rendered with the failure message; see errors above");
            }
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let options = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let report = page::check(&cli.source, &options)?;
            output::print_check_output(&report);
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
    info!("using {threads} icon fetch threads");
}
