use crate::core::session::{ButtonEvent, ButtonSink, Error, Result};

use log::{debug, error, trace, warn};
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::{fmt, mem, panic, thread};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

const WORKER_THREAD_NAME: &str = "button-events";

/// The application supplied handler of pressed transport buttons.
/// The handler is always invoked on the event worker thread of the [EventBridge].
pub type ButtonHandler = Box<dyn FnMut(ButtonEvent) + Send + 'static>;

/// The bridge between the OS notification thread(s) and the application's button handler.
///
/// The bridge starts unbound, in which state all pressed buttons are
/// discarded. Binding a handler moves it once, and only once, into the bound state, after which
/// each pressed button is queued and delivered in order on a dedicated worker thread.
/// The handler can't be replaced or removed, only [EventBridge::abort] ends the delivery.
///
/// # Examples
///
/// ```no_run
/// use nowplaying_core::core::session::{ButtonEvent, EventBridge};
///
/// let bridge = EventBridge::new();
/// let sink = bridge.sink();
///
/// bridge.bind(Box::new(|event| println!("{} has been pressed", event))).unwrap();
/// sink.press(ButtonEvent::Play);
///
/// bridge.abort();
/// ```
#[derive(Debug, Clone)]
pub struct EventBridge {
    inner: Arc<InnerEventBridge>,
}

impl EventBridge {
    /// Create a new unbound event bridge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InnerEventBridge {
                state: RwLock::new(BridgeState::Unbound),
                cancellation_token: Default::default(),
            }),
        }
    }

    /// Get the sink through which the OS delivers pressed buttons to this bridge.
    pub fn sink(&self) -> ButtonSink {
        ButtonSink::new(self.clone())
    }

    /// Bind the given handler to the bridge.
    ///
    /// It returns [Error::AlreadyBound] when a handler has been bound before,
    /// or [Error::Aborted] when the bridge is being torn down.
    pub fn bind(&self, handler: ButtonHandler) -> Result<()> {
        let mut state = self.inner.write_state();

        match &*state {
            BridgeState::Unbound => {}
            BridgeState::Bound(_) => return Err(Error::AlreadyBound),
            BridgeState::Aborted => return Err(Error::Aborted),
        }

        let (sender, receiver) = unbounded_channel();
        let cancellation_token = self.inner.cancellation_token.clone();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || Self::run(receiver, handler, cancellation_token))
            .map_err(|e| Error::Platform(format!("failed to start the event worker, {}", e)))?;

        *state = BridgeState::Bound(Delivery { sender, worker });
        debug!("Button handler has been bound to the event bridge");
        Ok(())
    }

    /// Check if a button handler has been bound to the bridge.
    pub fn is_bound(&self) -> bool {
        matches!(*self.inner.read_state(), BridgeState::Bound(_))
    }

    /// Abort the delivery of any further button events.
    ///
    /// Events which are still queued are discarded and the call blocks until the worker has
    /// stopped. A single handler invocation may still start while the abort is in progress, if
    /// the worker dequeued its event just before, but no invocation is in flight once this
    /// returns. Aborting is irreversible.
    pub fn abort(&self) {
        self.inner.cancellation_token.cancel();
        let previous = mem::replace(&mut *self.inner.write_state(), BridgeState::Aborted);

        match previous {
            BridgeState::Bound(delivery) => {
                debug!("Aborting the event bridge delivery");
                delivery.join();
            }
            BridgeState::Unbound => debug!("Event bridge aborted before a handler was bound"),
            BridgeState::Aborted => trace!("Event bridge has already been aborted"),
        }
    }

    pub(crate) fn press(&self, button: ButtonEvent) {
        if self.inner.cancellation_token.is_cancelled() {
            trace!("Event bridge has been aborted, discarding {}", button);
            return;
        }

        let state = self.inner.read_state();
        match &*state {
            BridgeState::Bound(delivery) => {
                if delivery.sender.send(button).is_err() {
                    warn!("Event worker is no longer running, dropping {}", button);
                } else {
                    trace!("Queued button event {}", button);
                }
            }
            BridgeState::Unbound => trace!("No button handler has been bound, discarding {}", button),
            BridgeState::Aborted => trace!("Event bridge has been aborted, discarding {}", button),
        }
    }

    fn run(
        mut receiver: UnboundedReceiver<ButtonEvent>,
        mut handler: ButtonHandler,
        cancellation_token: CancellationToken,
    ) {
        debug!("Event worker has started");
        let mut discarded = 0usize;

        while let Some(event) = receiver.blocking_recv() {
            if cancellation_token.is_cancelled() {
                discarded += 1;
                break;
            }

            trace!("Invoking button handler for {}", event);
            if let Err(e) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                error!(
                    "Button handler panicked while handling {}, {}",
                    event,
                    panic_message(e.as_ref())
                );
            }
        }

        receiver.close();
        while receiver.try_recv().is_ok() {
            discarded += 1;
        }

        if discarded > 0 {
            debug!("Discarded a total of {} undelivered button events", discarded);
        }
        debug!("Event worker has stopped");
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

enum BridgeState {
    Unbound,
    Bound(Delivery),
    Aborted,
}

impl Debug for BridgeState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Unbound => write!(f, "Unbound"),
            BridgeState::Bound(_) => write!(f, "Bound"),
            BridgeState::Aborted => write!(f, "Aborted"),
        }
    }
}

struct Delivery {
    sender: UnboundedSender<ButtonEvent>,
    worker: JoinHandle<()>,
}

impl Delivery {
    /// Close the queue and wait for the worker to stop.
    fn join(self) {
        let Delivery { sender, worker } = self;
        drop(sender);

        // a handler tearing down the session runs on the worker itself
        if worker.thread().id() == thread::current().id() {
            warn!("Event bridge aborted from within the button handler, not waiting for the worker");
            return;
        }

        if worker.join().is_err() {
            error!("Event worker terminated unexpectedly");
        }
    }
}

#[derive(Debug)]
struct InnerEventBridge {
    state: RwLock<BridgeState>,
    cancellation_token: CancellationToken,
}

impl InnerEventBridge {
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BridgeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BridgeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
