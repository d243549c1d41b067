//! UI actor: a single thread owns the terminal and renders events in order.
//! Errors go to stderr, everything else to stdout.
//!
//! Reporter calls may come from the blocking worker while `main` prints
//! errors; funnelling everything through one channel keeps lines whole and
//! ordered.

use std::io::{self, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crossterm::style::Stylize;

use super::theme::Theme;

/// Events rendered by the actor.
#[derive(Debug)]
pub enum UiEvent {
    /// Section header for an operation phase
    Header(String),
    Step(String),
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Acknowledged once every earlier event is rendered
    Sync(tokio::sync::oneshot::Sender<()>),
}

#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    handle: Option<JoinHandle<()>>,
}

impl UiActor {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = std::thread::spawn(move || run_loop(&receiver));
        Self {
            sender,
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let (tx, _rx) = mpsc::channel();
        // Replace our sender so the loop ends once every clone is gone.
        drop(std::mem::replace(&mut self.sender, tx));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_loop(receiver: &mpsc::Receiver<UiEvent>) {
    let theme = Theme::default();
    while let Ok(event) = receiver.recv() {
        match event {
            UiEvent::Sync(ack) => {
                let _ = ack.send(());
            }
            UiEvent::Error(_) => {
                let mut err = io::stderr().lock();
                let _ = render(&mut err, &theme, &event).and_then(|()| err.flush());
            }
            _ => {
                let mut out = io::stdout().lock();
                let _ = render(&mut out, &theme, &event).and_then(|()| out.flush());
            }
        }
    }
}

/// Write one event as styled text.
pub fn render(out: &mut impl Write, theme: &Theme, event: &UiEvent) -> io::Result<()> {
    let c = &theme.colors;
    let i = &theme.icons;
    match event {
        UiEvent::Header(title) => {
            writeln!(out)?;
            writeln!(
                out,
                "{} {}",
                title.as_str().with(c.header).bold(),
                "─".repeat(40).with(c.secondary)
            )
        }
        UiEvent::Step(msg) => writeln!(out, "  {} {}", i.step.with(c.secondary), msg),
        UiEvent::Info(msg) => writeln!(out, "  {} {}", i.info.with(c.primary), msg),
        UiEvent::Success(msg) => writeln!(out, "{} {}", i.success.with(c.success), msg),
        UiEvent::Warning(msg) => writeln!(
            out,
            "{} {}",
            i.warning.with(c.warning),
            msg.as_str().with(c.warning)
        ),
        UiEvent::Error(msg) => writeln!(
            out,
            "{} {}",
            i.error.with(c.error),
            msg.as_str().with(c.error)
        ),
        UiEvent::Sync(_) => Ok(()),
    }
}
