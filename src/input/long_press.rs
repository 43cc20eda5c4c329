//! Background long-press detection.
//!
//! A dedicated thread owns the timer so the input thread never blocks: the
//! gesture handler arms the detector on pointer down and disarms it on
//! movement, lift or a second pointer. While idle the thread sleeps in a
//! blocking receive; while armed it waits with a deadline and fires the
//! callback when the deadline passes without a disarm.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use instant::Instant;

use crate::core::geo::Point;

enum Command {
    Arm { position: Point, deadline: Instant },
    Disarm,
    Shutdown,
}

/// Fires a callback when a press is held without moving for the configured
/// timeout.
///
/// The callback runs on the detector thread and returns whether anything
/// consumed the long press; the gesture handler reads that flag on pointer
/// up to suppress the tap that would otherwise follow.
pub struct LongPressDetector {
    sender: Sender<Command>,
    timeout: Duration,
    handled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LongPressDetector {
    pub fn new<F>(timeout: Duration, callback: F) -> Self
    where
        F: Fn(Point) -> bool + Send + 'static,
    {
        let (sender, receiver) = unbounded::<Command>();
        let handled = Arc::new(AtomicBool::new(false));
        let handled_in_thread = Arc::clone(&handled);

        let handle = thread::Builder::new()
            .name("long-press".into())
            .spawn(move || {
                let mut armed: Option<(Point, Instant)> = None;
                loop {
                    let command = match armed {
                        None => match receiver.recv() {
                            Ok(command) => command,
                            Err(_) => return,
                        },
                        Some((position, deadline)) => {
                            let now = Instant::now();
                            if deadline <= now {
                                armed = None;
                                let consumed = callback(position);
                                handled_in_thread.store(consumed, Ordering::SeqCst);
                                continue;
                            }
                            match receiver.recv_timeout(deadline - now) {
                                Ok(command) => command,
                                Err(RecvTimeoutError::Timeout) => {
                                    armed = None;
                                    let consumed = callback(position);
                                    handled_in_thread.store(consumed, Ordering::SeqCst);
                                    continue;
                                }
                                Err(RecvTimeoutError::Disconnected) => return,
                            }
                        }
                    };

                    match command {
                        Command::Arm { position, deadline } => {
                            // arming while armed keeps the first deadline
                            if armed.is_none() {
                                armed = Some((position, deadline));
                            }
                        }
                        Command::Disarm => armed = None,
                        Command::Shutdown => return,
                    }
                }
            })
            .expect("failed to spawn long-press thread");

        Self {
            sender,
            timeout,
            handled,
            handle: Some(handle),
        }
    }

    /// Starts the timer for a press at `position`. Arming while already
    /// armed is a no-op; the original deadline stands.
    pub fn arm(&self, position: Point) {
        self.handled.store(false, Ordering::SeqCst);
        let _ = self.sender.send(Command::Arm {
            position,
            deadline: Instant::now() + self.timeout,
        });
    }

    /// Cancels the pending press. Harmless when nothing is armed.
    pub fn disarm(&self) {
        let _ = self.sender.send(Command::Disarm);
    }

    /// Whether the most recent press fired a long press that was consumed.
    /// Reset on each [`LongPressDetector::arm`].
    pub fn was_press_handled(&self) -> bool {
        self.handled.load(Ordering::SeqCst)
    }
}

impl Drop for LongPressDetector {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
