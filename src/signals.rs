//! Signal handling for the long-running watch loop.
//!
//! Signals are converted into [`SignalMessage`] values on a dedicated thread and
//! delivered over an mpsc channel, so the watch loop can wait for "next timer
//! due OR a signal arrived" with a single `recv_timeout`.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender},
    thread,
};

/// Messages delivered to the watch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// Stop the loop (SIGINT, SIGTERM)
    Shutdown,
    /// Recompute immediately, e.g. after settings changed (SIGHUP, SIGUSR2)
    Refresh,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal has been received
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Kept so the channel never disconnects while the loop is alive
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Translate a raw signal number into a loop message.
pub fn message_for_signal(sig: i32) -> Option<SignalMessage> {
    match sig {
        SIGINT | SIGTERM => Some(SignalMessage::Shutdown),
        SIGHUP | SIGUSR2 => Some(SignalMessage::Refresh),
        _ => None,
    }
}

/// Register handlers and spawn the forwarding thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = running.clone();
    let sender_clone = signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = message_for_signal(sig) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {sig}: {message:?}");
            }

            if message == SignalMessage::Shutdown {
                running_clone.store(false, Ordering::SeqCst);
            }

            if sender_clone.send(message.clone()).is_err() || message == SignalMessage::Shutdown
            {
                break;
            }
        }
    });

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_for_signal() {
        assert_eq!(message_for_signal(SIGINT), Some(SignalMessage::Shutdown));
        assert_eq!(message_for_signal(SIGTERM), Some(SignalMessage::Shutdown));
        assert_eq!(message_for_signal(SIGHUP), Some(SignalMessage::Refresh));
        assert_eq!(message_for_signal(SIGUSR2), Some(SignalMessage::Refresh));
        assert_eq!(message_for_signal(0), None);
    }
}
