//! Animated zoom transitions.
//!
//! A dedicated thread interpolates the fractional zoom level over the
//! configured duration and applies the per-frame scale change to the shared
//! view transform. Each frame applies the scale RELATIVE to the zoom level
//! applied by the previous frame, so the composed transform always reflects
//! the current interpolated level exactly, independent of frame jitter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use instant::Instant;

use crate::core::config::ZoomAnimationConfig;
use crate::core::geo::Point;
use crate::core::viewport::MapViewState;
use crate::layers::overlay::OverlayStack;

enum Command {
    Start {
        zoom_start: f64,
        zoom_end: f64,
        pivot: Point,
    },
    Shutdown,
}

struct Animation {
    started: Instant,
    zoom_start: f64,
    zoom_end: f64,
    /// Zoom level the transform currently reflects.
    applied: f64,
    pivot: Point,
}

/// Drives animated zoom transitions on a background thread.
///
/// Starting a new transition while one is running preempts it from the
/// current frame's state, so rapid double taps chain smoothly instead of
/// jumping.
pub struct ZoomAnimator {
    sender: Sender<Command>,
    executing: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ZoomAnimator {
    pub fn new(
        view: Arc<MapViewState>,
        overlays: Arc<OverlayStack>,
        config: ZoomAnimationConfig,
    ) -> Self {
        let (sender, receiver) = unbounded::<Command>();
        let executing = Arc::new(AtomicBool::new(false));
        let executing_in_thread = Arc::clone(&executing);

        let handle = thread::Builder::new()
            .name("zoom-animator".into())
            .spawn(move || {
                let mut animation: Option<Animation> = None;
                loop {
                    let command = match &animation {
                        None => match receiver.recv() {
                            Ok(command) => Some(command),
                            Err(_) => return,
                        },
                        Some(_) => match receiver.recv_timeout(config.frame_length) {
                            Ok(command) => Some(command),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => return,
                        },
                    };

                    match command {
                        Some(Command::Start {
                            zoom_start,
                            zoom_end,
                            pivot,
                        }) => {
                            // preempt from whatever level is currently applied
                            let applied = animation
                                .take()
                                .map(|running| running.applied)
                                .unwrap_or(zoom_start);
                            animation = Some(Animation {
                                started: Instant::now(),
                                zoom_start,
                                zoom_end,
                                applied,
                                pivot,
                            });
                            executing_in_thread.store(true, Ordering::SeqCst);
                            continue;
                        }
                        Some(Command::Shutdown) => return,
                        None => {}
                    }

                    let Some(running) = &mut animation else {
                        continue;
                    };

                    let elapsed = running.started.elapsed().as_secs_f64();
                    let fraction = (elapsed / config.duration.as_secs_f64()).clamp(0.0, 1.0);
                    let current =
                        running.zoom_start + fraction * (running.zoom_end - running.zoom_start);

                    let factor = 2f64.powf(current - running.applied);
                    view.scale_around(factor, running.pivot);
                    running.applied = current;
                    view.request_redraw();

                    if fraction >= 1.0 {
                        animation = None;
                        executing_in_thread.store(false, Ordering::SeqCst);
                        overlays.notify_redraw_all();
                    }
                }
            })
            .expect("failed to spawn zoom-animator thread");

        Self {
            sender,
            executing,
            handle: Some(handle),
        }
    }

    /// Begins a transition from `zoom_start` to `zoom_end`, scaling about
    /// `pivot` in screen pixels.
    pub fn start(&self, zoom_start: f64, zoom_end: f64, pivot: Point) {
        let _ = self.sender.send(Command::Start {
            zoom_start,
            zoom_end,
            pivot,
        });
    }

    /// Whether a transition is currently running.
    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }
}

impl Drop for ZoomAnimator {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
