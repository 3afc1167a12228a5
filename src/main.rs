use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use crossterm::event::{Event, EventStream, KeyCode};
use ratatui::{DefaultTerminal, Frame};
use tokio_stream::StreamExt;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gridmate::ai::{self, DirectGateway, RelayGateway, RelayOptions, Transformer};
use gridmate::io::Cache;

mod subcommands;
mod util;
mod widgets;

use widgets::Widget;

#[derive(clap::Parser)]
#[command(
    name = "gridmate",
    version,
    about = "CSV table editor with AI-assisted transforms",
    long_about = None
)]
struct Cli {
    /// Increase output verbosity (-v, -vv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// CSV file to open; without one the last session is restored
    file: Option<PathBuf>,

    /// Base URL of the chat-completion endpoint
    #[arg(long, default_value = ai::DEFAULT_BASE_URL)]
    endpoint_url: String,

    /// Model requested from the completion endpoint
    #[arg(long, default_value = ai::DEFAULT_MODEL)]
    model: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP relay forwarding transform requests upstream
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Convert a CSV file to CSV or JSON without opening the editor
    Convert {
        input: PathBuf,
        /// Emit a pretty-printed JSON array instead of CSV
        #[arg(long)]
        json: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = <Cli as clap::Parser>::parse();
    match cli.command {
        Some(Commands::Serve { port }) => {
            init_tracing(cli.verbose, false)?;
            subcommands::serve::command(subcommands::serve::Options { port }).await
        }
        Some(Commands::Convert {
            input,
            json,
            output,
        }) => {
            init_tracing(cli.verbose, false)?;
            subcommands::convert::command(subcommands::convert::Options {
                input,
                json,
                output,
            })
        }
        None => {
            init_tracing(cli.verbose, true)?;
            let transformer = transformer_from_env(&cli);
            if transformer.is_none() {
                tracing::info!("no AI credential configured; transforms disabled");
            }
            App::default().run_tui(cli.file, transformer).await
        }
    }
}

/// Subcommands log to stderr; the TUI logs to a file so the alternate screen
/// stays clean. `RUST_LOG` overrides the `-v` mapping.
fn init_tracing(verbose: u8, to_file: bool) -> Result<()> {
    let default = match verbose {
        0 => "gridmate=info",
        1 => "gridmate=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default.to_string()));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());
    if to_file {
        if let Some(path) = util::log_file_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file)
                        .with_ansi(false),
                )
                .init();
        } else {
            registry.init();
        }
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

/// Picks the transform backend: a relay job API when `GRIDMATE_RELAY_URL` is
/// set, otherwise the completion endpoint with the key from
/// `OPENROUTER_API_KEY`. No credential, no transforms.
fn transformer_from_env(cli: &Cli) -> Option<Arc<dyn Transformer>> {
    if let Ok(relay_url) = std::env::var("GRIDMATE_RELAY_URL") {
        let job = std::env::var("GRIDMATE_RELAY_JOB")
            .unwrap_or_else(|_| "table-transform".to_string());
        let token = std::env::var("GRIDMATE_RELAY_TOKEN").ok();
        match RelayGateway::new(&relay_url, &job, token, RelayOptions::default()) {
            Ok(gateway) => return Some(Arc::new(gateway)),
            Err(err) => {
                tracing::warn!(error = %err, "failed to set up relay gateway");
                return None;
            }
        }
    }
    let api_key = std::env::var(gridmate::proxy::API_KEY_ENV).ok()?;
    match DirectGateway::new(&cli.endpoint_url, &api_key, &cli.model) {
        Ok(gateway) => Some(Arc::new(gateway)),
        Err(err) => {
            tracing::warn!(error = %err, "failed to set up direct gateway");
            None
        }
    }
}

#[derive(Default)]
struct App {
    should_quit: bool,
    widgets: Vec<Arc<dyn Widget>>,
}

impl App {
    const FRAMES_PER_SECOND: f32 = 60.0;

    pub async fn run_tui(
        self,
        file: Option<PathBuf>,
        transformer: Option<Arc<dyn Transformer>>,
    ) -> Result<()> {
        let terminal = ratatui::init();
        let app_result = self.run(terminal, file, transformer).await;
        ratatui::restore();
        app_result
    }

    pub async fn run(
        mut self,
        mut terminal: DefaultTerminal,
        file: Option<PathBuf>,
        transformer: Option<Arc<dyn Transformer>>,
    ) -> Result<()> {
        let cache = Cache::new();
        let widget = Arc::new(widgets::EditorWidget::new(file, transformer, cache));
        widget.start();
        self.widgets.push(widget);

        let period = Duration::from_secs_f32(1.0 / Self::FRAMES_PER_SECOND);
        let mut interval = tokio::time::interval(period);
        let mut events = EventStream::new();

        while !self.should_quit {
            tokio::select! {
                _ = interval.tick() => { terminal.draw(|frame| self.render(frame))?; },
                Some(Ok(event)) = events.next() => self.handle_event(&event),
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        if let Some(widget) = self.widgets.last() {
            widget.render(frame, frame.area());
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if let Some(widget) = self.widgets.last() {
            if widget.handle_event(event) {
                return;
            }
        }
        if let Some(key) = event.as_key_press_event() {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            }
        }
    }
}
