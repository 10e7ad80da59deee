use std::sync::Arc;
use std::time::Duration;

use courier_core::{update, ArticleLink, BatchMsg, BatchRequest, BatchResult, BatchState, ItemStep, ProgressEvent};
use courier_logging::{courier_info, courier_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ContentExtractor, DocumentRenderer, Fetcher, LinkDiscoverer, Mailer, PipelineError};

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Courtesy pause between two items.
    pub item_pause: Duration,
    /// Capacity of the event channel used by [`Orchestrator::spawn`].
    pub channel_capacity: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            item_pause: Duration::from_millis(500),
            channel_capacity: 32,
        }
    }
}

/// Receives progress events as they happen.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Returns `false` once nobody is listening any more.
    async fn emit(&self, event: ProgressEvent) -> bool;
}

/// Bounded channel sink: `emit` waits while the consumer is behind.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: ProgressEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// A batch running in the background.
pub struct BatchHandle {
    /// Progress events in emission order; closed when the batch ends.
    pub events: mpsc::Receiver<ProgressEvent>,
    pub result: JoinHandle<BatchResult>,
}

/// Drives discovery, extraction, rendering and delivery for one batch at a
/// time, one item after another.
pub struct Orchestrator {
    discoverer: LinkDiscoverer,
    extractor: ContentExtractor,
    renderer: DocumentRenderer,
    mailer: Arc<dyn Mailer>,
    settings: BatchSettings,
}

/// Per-run bookkeeping threaded through the item loop.
struct Run<'a> {
    state: BatchState,
    sink: &'a dyn EventSink,
    listening: bool,
}

impl Run<'_> {
    async fn apply(&mut self, msg: BatchMsg) {
        let state = std::mem::take(&mut self.state);
        let (state, events) = update(state, msg);
        self.state = state;
        for event in events {
            if self.listening && !self.sink.emit(event).await {
                courier_warn!("Progress consumer went away; finishing current item only");
                self.listening = false;
            }
        }
    }
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        renderer: DocumentRenderer,
        mailer: Arc<dyn Mailer>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            discoverer: LinkDiscoverer::new(fetcher.clone()),
            extractor: ContentExtractor::new(fetcher),
            renderer,
            mailer,
            settings,
        }
    }

    pub fn discoverer(&self) -> &LinkDiscoverer {
        &self.discoverer
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    pub fn renderer(&self) -> &DocumentRenderer {
        &self.renderer
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Runs one batch to completion, forwarding every event to `sink`, and
    /// returns the final tally. Item failures never abort the batch.
    pub async fn run(&self, request: &BatchRequest, sink: &dyn EventSink) -> BatchResult {
        let mut run = Run {
            state: BatchState::new(),
            sink,
            listening: true,
        };
        let seed = request.seed.origin().to_string();
        run.apply(BatchMsg::DiscoveryStarted { seed: seed.clone() }).await;

        let links = match self.discoverer.discover(&request.seed).await {
            Ok(links) => links,
            Err(err) => {
                courier_warn!("Discovery failed for {}: {}", seed, err);
                run.apply(BatchMsg::DiscoveryFailed {
                    message: err.to_string(),
                })
                .await;
                return run.state.into_result();
            }
        };

        run.apply(BatchMsg::LinksDiscovered { count: links.len() }).await;
        if run.state.is_done() {
            courier_warn!("No blog posts found on {}", seed);
            return run.state.into_result();
        }

        for (offset, link) in links.iter().enumerate() {
            if !run.listening {
                break;
            }
            if offset > 0 && !self.settings.item_pause.is_zero() {
                tokio::time::sleep(self.settings.item_pause).await;
            }
            let index = offset + 1;
            match self.process_item(&mut run, index, link, &request.destination).await {
                Ok(title) => run.apply(BatchMsg::ItemSucceeded { index, title }).await,
                Err(err) => {
                    courier_warn!("Error processing post {} ({}): {}", index, link, err);
                    run.apply(BatchMsg::ItemFailed {
                        index,
                        message: err.to_string(),
                    })
                    .await;
                }
            }
        }

        run.apply(BatchMsg::Finished).await;
        let result = run.state.into_result();
        courier_info!(
            "Batch for {} finished: {} sent, {} failed",
            seed,
            result.succeeded,
            result.failed
        );
        result
    }

    /// Runs the batch on a Tokio task, streaming events through a bounded
    /// channel.
    pub fn spawn(self: Arc<Self>, request: BatchRequest) -> BatchHandle {
        let (tx, events) = mpsc::channel(self.settings.channel_capacity.max(1));
        let result = tokio::spawn(async move {
            let sink = ChannelSink::new(tx);
            self.run(&request, &sink).await
        });
        BatchHandle { events, result }
    }

    async fn process_item(
        &self,
        run: &mut Run<'_>,
        index: usize,
        link: &ArticleLink,
        destination: &str,
    ) -> Result<String, PipelineError> {
        run.apply(BatchMsg::StepStarted {
            index,
            step: ItemStep::Extracting,
            title: None,
        })
        .await;
        let article = self.extractor.extract(link.as_str()).await?;
        let title = article.title().to_string();

        run.apply(BatchMsg::StepStarted {
            index,
            step: ItemStep::Rendering,
            title: Some(title.clone()),
        })
        .await;
        // Layout is CPU-bound; keep it off the async workers.
        let renderer = self.renderer.clone();
        let document = tokio::task::spawn_blocking(move || {
            renderer.render(article.title(), article.body(), Some(article.source_url()))
        })
        .await
        .map_err(|err| PipelineError::Render(format!("render task failed: {err}")))??;

        run.apply(BatchMsg::StepStarted {
            index,
            step: ItemStep::Delivering,
            title: Some(title.clone()),
        })
        .await;
        self.mailer
            .deliver(destination, &document.bytes, &document.filename, &title)
            .await?;

        Ok(title)
    }
}
