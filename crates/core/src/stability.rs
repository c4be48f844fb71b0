//! Content stability detection.
//!
//! Pages rendered by client-side frameworks keep changing after load. The
//! [`StabilityMonitor`] watches a [`DocumentSource`] and decides when its
//! content is safe to read, using three triggers:
//!
//! - **Debounce**: no mutation for 800ms. Armed at start, so static pages
//!   settle after one quiet window.
//! - **Word count jump**: while the page still has fewer than 50 main-content
//!   words, every mutation re-measures it; crossing 200 words settles at once.
//! - **Kill switch**: 5000ms after start the page is declared stable no matter
//!   what.
//!
//! The first trigger to fire wins. The transition clears every deadline, drops
//! the mutation subscription, runs the analysis once more and delivers it to
//! every waiting requester in the order they asked.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::source::LiveDocument;
//! use pagesense_core::stability::{StabilityConfig, StabilityMonitor, StableReason};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let doc = LiveDocument::new("<html><body><main><p>Static page</p></main></body></html>", None);
//! let handle = StabilityMonitor::new(Arc::new(doc), StabilityConfig::default()).start();
//!
//! let analysis = handle.wait_for_stable().await.unwrap();
//! assert_eq!(analysis.word_count, 2);
//! assert_eq!(handle.reason(), Some(StableReason::Debounce));
//! # });
//! ```

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};

use crate::analyzer::{Analyzer, PageAnalysis};
use crate::parse::Document;
use crate::source::{DocumentSource, MutationEvent, MutationSubscription};

/// Timing and threshold settings for the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityConfig {
    /// Quiet window after the last mutation (default: 800ms).
    pub debounce: Duration,
    /// Hard ceiling on watching (default: 5000ms).
    pub kill_switch: Duration,
    /// Mutations re-measure while the word count is below this (default: 50).
    pub low_word_threshold: usize,
    /// A re-measured count above this settles immediately (default: 200).
    pub jump_word_threshold: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            kill_switch: Duration::from_millis(5000),
            low_word_threshold: 50,
            jump_word_threshold: 200,
        }
    }
}

impl StabilityConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_kill_switch(mut self, kill_switch: Duration) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    pub fn with_word_thresholds(mut self, low: usize, jump: usize) -> Self {
        self.low_word_threshold = low;
        self.jump_word_threshold = jump;
        self
    }
}

/// Monitor lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StabilityState {
    Watching,
    Stable,
}

/// Trigger that ended watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StableReason {
    Debounce,
    WordCountJump,
    KillSwitch,
}

/// Completion callback, invoked exactly once.
pub type PendingRequest = Box<dyn FnOnce(Arc<PageAnalysis>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Status {
    state: StabilityState,
    reason: Option<StableReason>,
}

enum Command {
    Request(PendingRequest),
}

/// Source plus analyzer, shared by the monitor task and its handles.
struct PageReader {
    source: Arc<dyn DocumentSource>,
    analyzer: Analyzer,
}

impl PageReader {
    fn measure(&self) -> usize {
        match Document::parse(&self.source.snapshot()) {
            Ok(doc) => self.analyzer.word_count(&doc),
            Err(err) => {
                tracing::warn!(error = %err, "snapshot failed to parse, counting 0 words");
                0
            }
        }
    }

    fn analyze(&self) -> PageAnalysis {
        let url = self.source.url();
        match Document::parse_with_url(&self.source.snapshot(), url.clone()) {
            Ok(doc) => self.analyzer.analyze(&doc),
            Err(err) => {
                tracing::warn!(error = %err, "snapshot failed to parse, reporting an empty page");
                PageAnalysis::empty(url.map(|u| u.to_string()))
            }
        }
    }
}

/// Decides when a document's content has settled.
pub struct StabilityMonitor {
    reader: Arc<PageReader>,
    config: StabilityConfig,
    subscription: Option<MutationSubscription>,
}

impl StabilityMonitor {
    pub fn new(source: Arc<dyn DocumentSource>, config: StabilityConfig) -> Self {
        Self::with_analyzer(source, config, Analyzer::new())
    }

    /// Uses `analyzer` for the final and post-stable analyses.
    pub fn with_analyzer(source: Arc<dyn DocumentSource>, config: StabilityConfig, analyzer: Analyzer) -> Self {
        Self { reader: Arc::new(PageReader { source, analyzer }), config, subscription: None }
    }

    /// Subscribes to mutation events. Calling it again keeps the first
    /// subscription.
    pub fn observe(&mut self) -> &mut Self {
        if self.subscription.is_none() {
            self.subscription = Some(self.reader.source.subscribe());
        }
        self
    }

    /// Takes the initial measurement, arms the deadlines and spawns the monitor
    /// onto the current tokio runtime.
    ///
    /// Subscribes first if [`observe`](Self::observe) was not called.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(mut self) -> StabilityHandle {
        self.observe();

        let now = Instant::now();
        let word_count = self.reader.measure();
        tracing::debug!(word_count, "stability monitor started");

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(Status { state: StabilityState::Watching, reason: None });

        let task = MonitorTask {
            reader: Arc::clone(&self.reader),
            config: self.config.clone(),
            subscription: self.subscription.take(),
            word_count,
            debounce: Some(now + self.config.debounce),
            kill_switch: Some(now + self.config.kill_switch),
            pending: Vec::new(),
            status: status_tx,
        };
        tokio::spawn(task.run(command_rx));

        StabilityHandle { commands, status, reader: self.reader }
    }
}

/// Host-side handle to a running monitor. Cheap to clone.
#[derive(Clone)]
pub struct StabilityHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<Status>,
    reader: Arc<PageReader>,
}

impl StabilityHandle {
    /// Registers `callback` for the analysis.
    ///
    /// While watching, the callback is queued and runs when the page settles,
    /// after every callback registered before it. Once stable, it runs on a fresh
    /// analysis of the current snapshot.
    pub fn request<F>(&self, callback: F)
    where
        F: FnOnce(Arc<PageAnalysis>) + Send + 'static,
    {
        if let Err(mpsc::error::SendError(Command::Request(callback))) =
            self.commands.send(Command::Request(Box::new(callback)))
        {
            tracing::debug!("monitor gone, analyzing inline");
            callback(Arc::new(self.reader.analyze()));
        }
    }

    /// Waits until the page settles and returns the analysis.
    ///
    /// `None` only when the monitor task died before delivering.
    pub async fn wait_for_stable(&self) -> Option<Arc<PageAnalysis>> {
        let (tx, rx) = oneshot::channel();
        self.request(move |analysis| {
            let _ = tx.send(analysis);
        });
        rx.await.ok()
    }

    pub fn state(&self) -> StabilityState {
        self.status.borrow().state
    }

    /// Winning trigger, once stable.
    pub fn reason(&self) -> Option<StableReason> {
        self.status.borrow().reason
    }
}

enum Wake {
    Mutation(Option<MutationEvent>),
    Debounce,
    KillSwitch,
    Command(Option<Command>),
}

struct MonitorTask {
    reader: Arc<PageReader>,
    config: StabilityConfig,
    subscription: Option<MutationSubscription>,
    word_count: usize,
    debounce: Option<Instant>,
    kill_switch: Option<Instant>,
    pending: Vec<PendingRequest>,
    status: watch::Sender<Status>,
}

impl MonitorTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut handles_open = true;

        loop {
            let wake = tokio::select! {
                event = next_mutation(&mut self.subscription) => Wake::Mutation(event),
                _ = until(self.debounce) => Wake::Debounce,
                _ = until(self.kill_switch) => Wake::KillSwitch,
                command = next_command(&mut commands, handles_open) => Wake::Command(command),
            };

            match wake {
                Wake::Mutation(Some(event)) => self.on_mutation(event),
                Wake::Mutation(None) => {
                    tracing::debug!("mutation stream closed");
                    self.subscription = None;
                }
                Wake::Debounce => self.settle(StableReason::Debounce),
                Wake::KillSwitch => self.settle(StableReason::KillSwitch),
                Wake::Command(Some(Command::Request(callback))) => self.on_request(callback),
                Wake::Command(None) => handles_open = false,
            }

            if !handles_open && self.is_stable() {
                break;
            }
        }
    }

    fn is_stable(&self) -> bool {
        self.status.borrow().state == StabilityState::Stable
    }

    fn on_mutation(&mut self, event: MutationEvent) {
        if self.is_stable() {
            return;
        }

        if self.word_count < self.config.low_word_threshold {
            self.word_count = self.reader.measure();
            tracing::debug!(?event, word_count = self.word_count, "re-measured after mutation");
            if self.word_count > self.config.jump_word_threshold {
                self.settle(StableReason::WordCountJump);
                return;
            }
        }

        self.debounce = Some(Instant::now() + self.config.debounce);
    }

    fn on_request(&mut self, callback: PendingRequest) {
        if self.is_stable() {
            callback(Arc::new(self.reader.analyze()));
        } else {
            self.pending.push(callback);
        }
    }

    /// Stable transition; repeated calls are no-ops.
    fn settle(&mut self, reason: StableReason) {
        if self.is_stable() {
            return;
        }

        self.debounce = None;
        self.kill_switch = None;
        self.subscription = None;
        self.status.send_replace(Status { state: StabilityState::Stable, reason: Some(reason) });

        let analysis = Arc::new(self.reader.analyze());
        tracing::info!(?reason, word_count = analysis.word_count, pending = self.pending.len(), "content stable");

        for callback in self.pending.drain(..) {
            callback(Arc::clone(&analysis));
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_mutation(subscription: &mut Option<MutationSubscription>) -> Option<MutationEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_command(commands: &mut mpsc::UnboundedReceiver<Command>, open: bool) -> Option<Command> {
    if open { commands.recv().await } else { std::future::pending().await }
}
