use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use newsgrab::feed::{RssSource, VkSource};
use newsgrab::{
    Clock, Config, Database, FeedSource, GroupRepository, ItemRepository, Notifier,
    PollScheduler, SyncEngine, SystemClock, TelegramNotifier,
};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = newsgrab::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        newsgrab::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("newsgrab stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> newsgrab::Result<()> {
    config.validate()?;
    info!("newsgrab {}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.database.path).await?;
    let client = newsgrab::http::build_client(&config.http)?;

    let mut sources: Vec<Arc<dyn FeedSource>> = Vec::new();
    if config.vk.enabled {
        sources.push(Arc::new(VkSource::new(&config.vk, client.clone())));
    }
    if config.rss.enabled {
        sources.push(Arc::new(RssSource::new(&config.rss, client.clone())));
    }
    if sources.is_empty() {
        warn!("No feed source is enabled; nothing will be polled");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&config.telegram, client));
    let groups = Arc::new(GroupRepository::new(db.pool().clone()));
    let items = Arc::new(ItemRepository::new(db.pool().clone()));
    let delay = Duration::from_secs(config.grabber.sleep_secs);

    let mut scheduler = PollScheduler::new(Arc::clone(&clock));
    for source in sources {
        info!(source = source.name(), "Registering feed source");
        let engine = SyncEngine::new(
            source,
            groups.clone(),
            items.clone(),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        );
        scheduler.register(Arc::new(engine), delay);
    }

    let handle = scheduler.start();
    info!(
        sleep_secs = config.grabber.sleep_secs,
        "Poll scheduler started; press Ctrl-C to stop"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    handle.shutdown();
    handle.wait().await;
    db.close().await;
    info!("Shutdown complete");

    Ok(())
}
