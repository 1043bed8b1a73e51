use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::signal;

use crate::huemor::joke::JokeService;
use crate::huemor::message_bus::{Message, MessageBus, UiCommand};
use crate::huemor::{store, Huemor};
use crate::utils::{print_err, unwrap_or_def_verbose};

mod api;
mod huemor;
mod logging;
mod utils;

async fn terminate_on_signal() -> Result<()> {
    let interrupt_signal: Pin<Box<dyn Future<Output = _>>> = Box::pin(async {
        signal::unix::signal(signal::unix::SignalKind::interrupt())
            .context("Failed to register terminate signal handlers!")?
            .recv()
            .await;
        Ok(())
    });
    let terminate_signal = Box::pin(async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to register terminate signal handlers!")?
            .recv()
            .await;
        Ok(())
    });
    futures_util::future::select_all([interrupt_signal, terminate_signal])
        .await
        .0
}

#[tokio::main]
async fn main() {
    let _logger = logging::init();
    let config = unwrap_or_def_verbose(store::load_config());
    let message_bus = MessageBus::new();
    let joke_service = JokeService::openai(&config);
    let huemor = Huemor::new(&config, joke_service.clone(), message_bus.clone());
    let worker_task = tokio::spawn(huemor.dispatch_messages(message_bus.subscribe()));

    tokio::spawn({
        let message_bus = message_bus.clone();
        let config = config.clone();
        async move { api::serve(message_bus, joke_service, &config).await }
    });

    info!("Running");
    let _ = terminate_on_signal().await.inspect_err(print_err);
    info!("Terminating.");
    message_bus.send(Message::UiCommand(UiCommand::CloseApplication));

    debug!("Waiting for workers to stop...");
    let _ = worker_task.await.inspect_err(print_err);
    debug!("All workers stopped.")
}
