//! One exchange, end to end:
//! lock identity → load history → generate → segment → send → append → save.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use relay_channels::{send_chunks, Channel, Pacing, Segmenter};
use relay_core::{Turn, UserIdentity};
use relay_history::{HistoryStore, LoadOutcome};

use crate::generator::ReplyGenerator;

use super::apology::reply_text;

/// Result of a completed exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSummary {
    pub identity: UserIdentity,
    /// Reply text (or apology) that was segmented and sent.
    pub reply: String,
    pub chunks_total: usize,
    pub chunks_delivered: usize,
    /// Number of turns persisted after this exchange. Unchanged when the
    /// reply was empty.
    pub history_len: usize,
}

impl ExchangeSummary {
    pub fn fully_delivered(&self) -> bool {
        self.chunks_delivered == self.chunks_total
    }
}

pub struct RelayPipeline {
    generator: ReplyGenerator,
    history: HistoryStore,
    channel: Arc<dyn Channel>,
    segmenter: Segmenter,
    pacing: Pacing,
    /// Per-identity serialization. Exchanges for different identities run
    /// concurrently; two for the same identity never interleave their
    /// load/save pair.
    locks: DashMap<UserIdentity, Arc<Mutex<()>>>,
}

impl RelayPipeline {
    pub fn new(
        generator: ReplyGenerator,
        history: HistoryStore,
        channel: Arc<dyn Channel>,
        segmenter: Segmenter,
        pacing: Pacing,
    ) -> Self {
        Self {
            generator,
            history,
            channel,
            segmenter,
            pacing,
            locks: DashMap::new(),
        }
    }

    pub fn generator(&self) -> &ReplyGenerator {
        &self.generator
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn lock_for(&self, identity: &UserIdentity) -> Arc<Mutex<()>> {
        self.locks.entry(identity.clone()).or_default().clone()
    }

    /// Drop the identity's lock entry once no other exchange holds or waits on it.
    fn release_lock(&self, identity: &UserIdentity, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(identity, |_, l| Arc::strong_count(l) == 1);
    }

    /// Identities with an exchange in flight or queued.
    pub fn active_identities(&self) -> usize {
        self.locks.len()
    }

    /// Run one exchange for a text message from `sender`.
    ///
    /// Never fails: generation problems become apology replies, delivery
    /// failures stop the remaining chunks, and history problems are logged.
    pub async fn handle_text(&self, sender: &str, text: &str) -> ExchangeSummary {
        let identity = UserIdentity::from_address(sender);
        let lock = self.lock_for(&identity);
        let summary = {
            let _guard = lock.lock().await;
            self.exchange(identity, sender, text).await
        };
        self.release_lock(&summary.identity, lock);
        summary
    }

    async fn exchange(&self, identity: UserIdentity, sender: &str, text: &str) -> ExchangeSummary {
        info!(sender = %sender, identity = %identity, "processing text message");

        let mut turns = match self.history.load(&identity).await {
            LoadOutcome::Found(turns) => {
                debug!(identity = %identity, turns = turns.len(), "loaded history");
                turns
            }
            LoadOutcome::NotFound => {
                debug!(identity = %identity, "no history yet, starting fresh");
                Vec::new()
            }
            LoadOutcome::Corrupt(e) => {
                warn!(
                    identity = %identity,
                    path = %self.history.path_for(&identity).display(),
                    error = %e,
                    "history unreadable, starting fresh"
                );
                Vec::new()
            }
        };

        let outcome = self.generator.generate(text, &turns).await;
        let reply = reply_text(outcome);

        if reply.is_empty() {
            warn!(identity = %identity, "empty reply, nothing to send");
            return ExchangeSummary {
                identity,
                reply,
                chunks_total: 0,
                chunks_delivered: 0,
                history_len: turns.len(),
            };
        }

        let chunks = self.segmenter.split(&reply);
        let report = send_chunks(self.channel.as_ref(), sender, &chunks, self.pacing).await;
        if !report.is_complete() {
            warn!(
                identity = %identity,
                delivered = report.delivered,
                total = report.total,
                "reply only partially delivered; recording full reply"
            );
        }

        turns.push(Turn::user(text));
        turns.push(Turn::model(reply.as_str()));
        self.history.save(&identity, &turns).await;

        info!(
            identity = %identity,
            chunks = report.total,
            delivered = report.delivered,
            history_turns = turns.len(),
            "exchange complete"
        );

        ExchangeSummary {
            identity,
            reply,
            chunks_total: report.total,
            chunks_delivered: report.delivered,
            history_len: turns.len(),
        }
    }
}
