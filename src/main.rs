//! ghfolio - A terminal portfolio page
//!
//! Shows a GitHub profile card and pinned repositories, served from a local
//! cache and refreshed from the GitHub GraphQL API when stale.

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use ghfolio::analytics::{Analytics, CaptureSink, EventSink, TracingSink};
use ghfolio::app::App;
use ghfolio::cache::{default_cache_dir, CachedFetcher, FileStore, KeyValueStore, MemoryStore};
use ghfolio::cli::{Cli, StartupConfig};
use ghfolio::github::{GithubClient, PortfolioSource};
use ghfolio::logging::{init_logging, LogTarget};
use ghfolio::ui;

type Source = PortfolioSource<Arc<dyn KeyValueStore + Send + Sync>>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

fn build_source(config: &StartupConfig) -> Source {
    let store: Arc<dyn KeyValueStore + Send + Sync> =
        match config.cache_dir.clone().or_else(default_cache_dir) {
            Some(dir) => Arc::new(FileStore::with_dir(dir)),
            None => {
                warn!("no cache directory available, cache will not persist");
                Arc::new(MemoryStore::new())
            }
        };

    let client = GithubClient::new(config.token.clone())
        .with_endpoint(config.portfolio.github.endpoint.clone());
    PortfolioSource::new(client, CachedFetcher::new(store), config.source_settings())
}

fn build_analytics(config: &StartupConfig) -> Analytics {
    let analytics = &config.portfolio.analytics;
    let sink: Arc<dyn EventSink> = match analytics.capture_target() {
        Some((key, host)) => Arc::new(CaptureSink::new(host, key)),
        None => Arc::new(TracingSink),
    };
    Analytics::new(sink, analytics.path())
}

/// Runs the event loop until the user quits
async fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    source: &Source,
) -> io::Result<()> {
    // Initial render to show loading state
    terminal.draw(|f| {
        ui::render(f, app);
    })?;

    app.load(source).await;

    loop {
        let mut layout = None;
        terminal.draw(|f| layout = ui::render(f, app))?;
        if let Some(layout) = layout {
            app.set_layout(layout.content_height, layout.viewport_height);
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let log_target = if config.plain {
        LogTarget::Stderr
    } else {
        match config.cache_dir.clone().or_else(default_cache_dir) {
            Some(dir) => LogTarget::in_cache_dir(&dir),
            None => LogTarget::Off,
        }
    };
    if let Err(e) = init_logging(&log_target) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    info!(
        user = %config.portfolio.github.username,
        offline = config.offline,
        "starting ghfolio"
    );

    let source = build_source(&config);
    let mut app = App::new(config.portfolio.clone(), build_analytics(&config));

    if config.plain {
        app.load(&source).await;
        print!("{}", ui::plain_text(&app));
        app.flush_analytics().await;
        return Ok(());
    }

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &mut app, &source).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    app.flush_analytics().await;
    result?;
    Ok(())
}
