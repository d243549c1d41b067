//! Unified UI output interface.
//!
//! Commands and the core operations (through [`Reporter`]) talk to the
//! terminal only via [`Output`], which forwards events to the UI actor.

use super::actor::{UiActor, UiEvent};
use four_core::Reporter;
use std::sync::{OnceLock, mpsc};

/// Singleton instance of the UI actor channel.
static UI_ACTOR: OnceLock<mpsc::Sender<UiEvent>> = OnceLock::new();

/// Lazily initializes the UI actor and returns a sender handle.
fn get_actor_sender() -> mpsc::Sender<UiEvent> {
    UI_ACTOR
        .get_or_init(|| {
            let actor = UiActor::spawn();
            let sender = actor.sender();

            // Keep actor alive for program duration
            std::mem::forget(actor);

            sender
        })
        .clone()
}

/// A cloneable handle for sending UI events to the terminal actor.
#[derive(Debug, Clone)]
pub struct Output {
    sender: mpsc::Sender<UiEvent>,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            sender: get_actor_sender(),
        }
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        let _ = self.sender.send(UiEvent::Header(title.to_string()));
    }

    pub fn step(&self, msg: &str) {
        let _ = self.sender.send(UiEvent::Step(msg.to_string()));
    }

    pub fn info(&self, msg: &str) {
        let _ = self.sender.send(UiEvent::Info(msg.to_string()));
    }

    pub fn success(&self, msg: &str) {
        let _ = self.sender.send(UiEvent::Success(msg.to_string()));
    }

    pub fn warning(&self, msg: &str) {
        let _ = self.sender.send(UiEvent::Warning(msg.to_string()));
    }

    pub fn error(&self, msg: &str) {
        let _ = self.sender.send(UiEvent::Error(msg.to_string()));
    }

    /// Block until all pending UI events are rendered.
    ///
    /// Must not be called from inside the async runtime; use
    /// [`Output::wait_async`] there.
    pub fn wait(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _ = self.sender.send(UiEvent::Sync(tx));
        let _ = rx.blocking_recv();
    }

    /// Async version of wait.
    pub async fn wait_async(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _ = self.sender.send(UiEvent::Sync(tx));
        let _ = rx.await;
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.section(title);
    }

    fn step(&self, msg: &str) {
        self.step(msg);
    }

    fn info(&self, msg: &str) {
        self.info(msg);
    }

    fn success(&self, msg: &str) {
        self.success(msg);
    }

    fn warning(&self, msg: &str) {
        self.warning(msg);
    }

    fn error(&self, msg: &str) {
        self.error(msg);
    }
}
