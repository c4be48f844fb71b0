//! Document access for the stability monitor.
//!
//! A [`DocumentSource`] hands out HTML snapshots of a live page and a stream of
//! mutation events. The engine only ever reads snapshots: what it parses is a
//! copy, and the page itself is never touched.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use url::Url;

/// A content change on the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    /// Nodes were added to or removed from the subtree.
    ChildList,
    /// A text node changed.
    CharacterData,
}

/// Receiving end of a mutation stream. Dropping it unsubscribes.
#[derive(Debug)]
pub struct MutationSubscription {
    receiver: mpsc::UnboundedReceiver<MutationEvent>,
}

impl MutationSubscription {
    /// Creates a connected sender and subscription pair.
    pub fn channel() -> (mpsc::UnboundedSender<MutationEvent>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Waits for the next event. `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<MutationEvent> {
        self.receiver.recv().await
    }
}

/// A page the engine can observe.
pub trait DocumentSource: Send + Sync + 'static {
    /// Serialized HTML of the current document.
    fn snapshot(&self) -> String;

    /// URL the document was loaded from.
    fn url(&self) -> Option<Url>;

    /// Starts a new mutation stream covering the whole document.
    fn subscribe(&self) -> MutationSubscription;
}

struct LiveState {
    html: String,
    subscribers: Vec<mpsc::UnboundedSender<MutationEvent>>,
}

/// In-memory mutable document that broadcasts its own changes.
///
/// Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct LiveDocument {
    state: Arc<Mutex<LiveState>>,
    url: Option<Url>,
}

impl LiveDocument {
    pub fn new(html: impl Into<String>, url: Option<Url>) -> Self {
        let state = LiveState { html: html.into(), subscribers: Vec::new() };
        Self { state: Arc::new(Mutex::new(state)), url }
    }

    fn lock(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the whole document.
    pub fn replace_html(&self, html: impl Into<String>) {
        self.lock().html = html.into();
        self.notify(MutationEvent::ChildList);
    }

    /// Inserts `fragment` at the end of `<body>`, or at the end of the document
    /// when there is no closing body tag.
    pub fn append_html(&self, fragment: &str) {
        {
            let mut state = self.lock();
            match state.html.rfind("</body>") {
                Some(idx) => state.html.insert_str(idx, fragment),
                None => state.html.push_str(fragment),
            }
        }
        self.notify(MutationEvent::ChildList);
    }

    /// Sends `event` to every live subscriber, pruning closed ones.
    pub fn notify(&self, event: MutationEvent) {
        let mut state = self.lock();
        state.subscribers.retain(|subscriber| subscriber.send(event).is_ok());
    }

    /// Number of subscriptions that have not been dropped.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.iter().filter(|s| !s.is_closed()).count()
    }
}

impl DocumentSource for LiveDocument {
    fn snapshot(&self) -> String {
        self.lock().html.clone()
    }

    fn url(&self) -> Option<Url> {
        self.url.clone()
    }

    fn subscribe(&self) -> MutationSubscription {
        let (sender, subscription) = MutationSubscription::channel();
        self.lock().subscribers.push(sender);
        subscription
    }
}
