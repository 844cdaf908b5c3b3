use std::sync::Arc;
use anyhow::Result;
use tokio::sync::mpsc;
use vts_chat::{Config, HttpGateway, ReplyGateway};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _log_guard = vts_chat::logging::init(&config)?;
    tracing::info!(endpoint = %config.endpoint, "starting vts-chat");

    let gateway: Arc<dyn ReplyGateway> =
        Arc::new(HttpGateway::new(&config.endpoint, config.request_timeout())?);
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let size = terminal.size()?;
    let mut app = App::new(&config, gateway, reply_tx, (size.width, size.height));
    let mut events = EventHandler::new(reply_rx);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(err) = &result {
        tracing::error!(error = %err, "vts-chat exited with an error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
