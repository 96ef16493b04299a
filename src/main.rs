mod app;
mod camera;
mod config;
mod coords;
mod geo;
mod globe;
mod label;
mod picking;
mod rotation;
mod satellite;
mod scene;
mod speech;
mod stars;
mod tui;
mod ui;

use app::App;
use config::Config;
use crossterm::event::EventStream;
use futures::StreamExt;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 || args.iter().any(|a| a == "-h" || a == "--help") {
        println!("Usage: {} [locations.json | url]", args[0]);
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(path) = args.get(1) {
        config.locations = path.clone();
    }

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = File::create(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let (mut app, tracker) = App::launch(&config).await;

    let mut terminal = tui::init()?;
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let res = run_app(&mut terminal, &mut app, config.frame_interval()).await;

    tui::restore()?;
    if let Some(handle) = tracker {
        handle.abort();
    }
    res?;
    Ok(())
}

async fn run_app(terminal: &mut tui::Tui, app: &mut App, frame_interval: Duration) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while !app.should_quit {
        tokio::select! {
            _ = frames.tick() => {
                app.tick();
                terminal.draw(|f| ui::render(f, app))?;
            }
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event),
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }
    }
    Ok(())
}
