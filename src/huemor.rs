use std::time::Duration;

use futures_util::stream::{StreamExt as _, TryStreamExt as _};
use log::{debug, info, warn};
use tokio::time::timeout;

use crate::utils::print_err;
use huemor_model::{pool, ColourCard};
use joke::{ColourDescription, JokeService};
use message_bus::{Event, Message, MessageBus, MessageBusSubscription, UiCommand};
use session::{JokeRequest, Session};
use ui_state::UiState;

pub(crate) mod config;
pub(crate) mod joke;
pub(crate) mod message_bus;
pub(crate) mod session;
pub(crate) mod store;
pub(crate) mod ui_state;

/// Slack on top of the transport timeout so Loading always terminates even
/// if the HTTP stack stalls.
const JOKE_DEADLINE_MARGIN: Duration = Duration::from_secs(5);

pub struct Huemor {
    session: Session,
    pool: Vec<ColourCard>,
    joke_service: JokeService,
    joke_deadline: Duration,
    message_bus: MessageBus,
}

impl Huemor {
    pub fn new(config: &config::Config, joke_service: JokeService, message_bus: MessageBus) -> Self {
        Huemor {
            session: Session::new(),
            pool: pool::standard_pool(),
            joke_service,
            joke_deadline: config.joke_timeout() + JOKE_DEADLINE_MARGIN,
            message_bus,
        }
    }

    /// Worker loop: commands and events are applied to the session strictly
    /// in arrival order, and a fresh UiState is broadcast after each one.
    /// The subscription is created by the caller so no command sent between
    /// construction and the first poll of this future can be missed.
    pub async fn dispatch_messages(mut self, subscription: MessageBusSubscription) {
        let message_bus = self.message_bus.clone();
        let mut messages = subscription.stream().boxed();
        info!("Huemor worker started.");
        loop {
            match messages.try_next().await {
                Ok(Some(Message::UiCommand(UiCommand::CloseApplication))) => {
                    break;
                }
                Ok(Some(Message::UiCommand(command))) => {
                    self.dispatch_ui_command(command);
                    message_bus.send(self.ui_state().into());
                }
                Ok(Some(Message::Event(event))) => {
                    self.handle_event(event);
                    message_bus.send(self.ui_state().into());
                }
                Ok(Some(Message::UiUpdate(_))) => {}
                Ok(None) => {
                    break;
                }
                Err(e) => {
                    print_err(&e);
                    break;
                }
            }
        }
        info!("Huemor worker stopped.");
    }

    fn dispatch_ui_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::InitializeUi => {}
            UiCommand::PressButton => self.session.draw(&self.pool),
            UiCommand::ToggleColour(name) => {
                if let Some(request) = self.session.toggle(&name) {
                    self.spawn_joke_request(request);
                }
            }
            UiCommand::Reset => self.session.reset(),
            UiCommand::CloseApplication => {}
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::JokeSettled { generation, joke } => {
                if !self.session.settle(generation, joke) {
                    debug!("Dropped stale joke response (generation {generation})");
                }
            }
        }
    }

    fn spawn_joke_request(&self, request: JokeRequest) {
        let JokeRequest {
            generation,
            first,
            second,
        } = request;
        let service = self.joke_service.clone();
        let message_bus = self.message_bus.clone();
        let deadline = self.joke_deadline;
        tokio::spawn(async move {
            let first = ColourDescription::from(&first);
            let second = ColourDescription::from(&second);
            let joke = match timeout(deadline, service.generate(&first, &second)).await {
                Ok(outcome) => Some(outcome.joke),
                Err(_) => {
                    warn!("Joke request exceeded the {deadline:?} deadline");
                    None
                }
            };
            message_bus.send(Message::Event(Event::JokeSettled { generation, joke }));
        });
    }

    pub fn ui_state(&self) -> UiState {
        self.session.ui_state()
    }
}
