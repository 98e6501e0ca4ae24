//! Ecommerce Tracking. Replays recorded shop events through the Enhanced
//! Ecommerce tracker and prints the resulting analytics snippet.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracking_core::code_buffer::{code_buffer, CodeBlock};
use tracking_core::config::TrackingConfig;
use tracking_core::templates::TemplateRenderer;
use tracking_google::events::{replay, TrackingEvent};
use tracking_google::{EnhancedEcommerceTracker, TrackerOptions};

#[derive(Parser, Debug)]
#[command(name = "ecommerce-tracking")]
#[command(about = "Render Google Analytics Enhanced Ecommerce tags for shop events")]
#[command(version)]
struct Cli {
    /// JSON file holding an array of tracking events
    #[arg(long)]
    events: PathBuf,

    /// TOML configuration file (environment variables still override it)
    #[arg(long, env = "ECOMMERCE_TRACKING_CONFIG")]
    config: Option<PathBuf>,

    /// Template prefix (overrides config)
    #[arg(long, env = "ECOMMERCE_TRACKING__ENHANCED__TEMPLATE_PREFIX")]
    template_prefix: Option<String>,

    /// Analytics property id used in the `create` call (overrides config)
    #[arg(long)]
    tracking_id: Option<String>,

    /// Print only the fragments queued before the tracking call
    #[arg(long, default_value_t = false)]
    block_only: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean snippet
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecommerce_tracking=info,tracking_google=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = TrackingConfig::load_from(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        TrackingConfig::default()
    });

    // Apply CLI overrides
    if let Some(prefix) = cli.template_prefix {
        config.enhanced.template_prefix = prefix;
    }
    let tracking_id = cli
        .tracking_id
        .or_else(|| config.google.as_ref().and_then(|g| g.tracking_id.clone()))
        .unwrap_or_default();

    info!(
        template_prefix = %config.enhanced.template_prefix,
        dependencies = ?config.enhanced.dependencies,
        global_site_tag = config.google.as_ref().is_some_and(|g| g.gtagcode),
        "Configuration loaded"
    );

    let raw = std::fs::read_to_string(&cli.events)
        .with_context(|| format!("reading events from {}", cli.events.display()))?;
    let events: Vec<TrackingEvent> =
        serde_json::from_str(&raw).context("parsing tracking events")?;

    let options = TrackerOptions::from(&config.enhanced);
    let renderer = TemplateRenderer::enhanced_ecommerce(&options.template_prefix);
    let buffer = code_buffer();
    let mut tracker = EnhancedEcommerceTracker::new(
        options,
        Arc::new(renderer),
        Arc::new(config),
        buffer.clone(),
    );

    replay(&events, &mut tracker)?;
    info!(
        session_id = %tracker.session_id(),
        fragments = buffer.count(),
        "Events tracked"
    );

    if cli.block_only {
        for part in buffer.block(CodeBlock::BeforeTrack) {
            print!("{part}");
        }
    } else {
        print!("{}", buffer.render_script(&tracking_id));
    }

    Ok(())
}
