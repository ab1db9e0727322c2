//! webdriver-tools: mock test data and screenshots from the command line

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use webdriver_tools::mockdata::{self, oib, text};

#[derive(Parser)]
#[command(name = "webdriver-tools")]
#[command(about = "Helpers for end-to-end UI tests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic users as JSON
    MockUsers {
        /// Number of users
        #[arg(long, default_value = "1")]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate an OIB, or check one
    Oib {
        /// OIB to validate instead of generating one
        #[arg(long)]
        validate: Option<String>,
    },

    /// Print the URL slug of a text
    Slug {
        text: String,
    },

    /// Save a screenshot of a page
    #[cfg(feature = "cdp")]
    Screenshot {
        /// Page to open
        #[arg(long)]
        url: String,

        /// Output directory
        #[arg(long, default_value = "test-results")]
        out: std::path::PathBuf,

        /// Stitch the whole scrollable page instead of the viewport
        #[arg(long)]
        full_page: bool,

        /// Emulate a mobile device
        #[arg(long)]
        mobile: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::MockUsers { count, seed } => {
            let users = match seed {
                Some(seed) => mockdata::create_mock_users_with_rng(&mut StdRng::seed_from_u64(seed), count)?,
                None => mockdata::create_mock_users(count)?,
            };
            println!("{}", serde_json::to_string_pretty(&users)?);
        }
        Commands::Oib { validate: Some(candidate) } => {
            if !oib::is_valid(&candidate) {
                bail!("{} is not a valid OIB", candidate);
            }
            println!("{} is valid", candidate);
        }
        Commands::Oib { validate: None } => {
            println!("{}", oib::generate(&mut rand::thread_rng()));
        }
        Commands::Slug { text: raw } => {
            println!("{}", text::sanitize_for_url(&raw));
        }
        #[cfg(feature = "cdp")]
        Commands::Screenshot { url, out, full_page, mobile } => {
            screenshot(url, out, full_page, mobile)?;
        }
    }
    Ok(())
}

#[cfg(feature = "cdp")]
fn screenshot(url: String, out: std::path::PathBuf, full_page: bool, mobile: bool) -> Result<()> {
    use webdriver_tools::cdp::CdpDriver;
    use webdriver_tools::{Driver, EmulationProfile, SessionConfig, TestOutcome, UiTestSession};

    let config = SessionConfig {
        base_url: url.clone(),
        profile: if mobile { EmulationProfile::Mobile } else { EmulationProfile::Desktop },
        artifacts_dir: out.clone(),
        ..Default::default()
    };
    let mut session = UiTestSession::<CdpDriver>::start(config, "cli")?;
    session.driver_mut().navigate(&url)?;
    let path = session.take_screenshot(&out, full_page)?;
    session.finish(TestOutcome::Passed)?;
    println!("{}", path.display());
    Ok(())
}
