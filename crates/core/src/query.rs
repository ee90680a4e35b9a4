use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::PhotoRecord;
use crate::search;
use crate::store::Snapshot;
use crate::timestamp::{effective_date, year_month_key};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Records sharing one year-month key, in filtered-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineGroup {
    pub label: String,
    pub records: Vec<PhotoRecord>,
}

/// What a timeline shows for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryView {
    /// Every matching record, most recent first.
    pub records: Vec<PhotoRecord>,
    /// Matching records grouped by effective month, newest month first.
    /// Records without a valid timestamp are absent here.
    pub groups: Vec<TimelineGroup>,
}

impl QueryView {
    pub fn build(records: &[PhotoRecord], query: &str) -> Self {
        let matched: Vec<PhotoRecord> = search::filter(records, query).into_iter().cloned().collect();
        let groups = group_by_month(&matched);
        Self {
            records: matched,
            groups,
        }
    }
}

/// Group records by effective year-month, newest month first. Order inside a
/// group follows the input.
pub fn group_by_month(records: &[PhotoRecord]) -> Vec<TimelineGroup> {
    let mut buckets: BTreeMap<String, Vec<PhotoRecord>> = BTreeMap::new();
    for record in records {
        if let Ok(date) = effective_date(record) {
            buckets
                .entry(year_month_key(&date))
                .or_default()
                .push(record.clone());
        }
    }
    buckets
        .into_iter()
        .rev()
        .map(|(label, records)| TimelineGroup { label, records })
        .collect()
}

struct Memo {
    snapshot: Snapshot,
    query: String,
    view: Arc<QueryView>,
}

/// Produces [`QueryView`]s, recomputing only when the snapshot or the query
/// text differs from the previous call.
#[derive(Default)]
pub struct QueryLayer {
    memo: Mutex<Option<Memo>>,
}

impl QueryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, snapshot: &Snapshot, query: &str) -> Arc<QueryView> {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(m) = memo.as_ref() {
            if m.snapshot.same_as(snapshot) && m.query == query {
                debug!(query, "query view unchanged");
                return m.view.clone();
            }
        }

        let view = Arc::new(QueryView::build(snapshot, query));
        *memo = Some(Memo {
            snapshot: snapshot.clone(),
            query: query.to_string(),
            view: view.clone(),
        });
        view
    }
}

// ── Debouncing ───────────────────────────────────────────────────

enum Input {
    /// A keystroke; settles after the quiet period.
    Typed(String),
    /// A picked facet value; published at once.
    Selected(String),
}

/// Write side of a debounced query channel.
#[derive(Clone)]
pub struct QueryInput {
    tx: mpsc::UnboundedSender<Input>,
}

impl QueryInput {
    /// Record raw input. Restarts the quiet-period timer.
    pub fn set(&self, text: impl Into<String>) {
        // a send error means the reader is gone and nobody is listening
        let _ = self.tx.send(Input::Typed(text.into()));
    }

    /// Publish a selected bucket, location, camera or tag immediately,
    /// dropping any input still waiting to settle.
    pub fn select(&self, value: impl Into<String>) {
        let _ = self.tx.send(Input::Selected(value.into()));
    }
}

/// Read side: the last settled query.
#[derive(Clone)]
pub struct DebouncedQuery {
    rx: watch::Receiver<String>,
}

impl DebouncedQuery {
    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    /// Wait for the next settled value. `None` once the input side is gone
    /// and everything pending has been published.
    pub async fn changed(&mut self) -> Option<String> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Create a debounced query channel with the given quiet period.
///
/// Spawns a task on the current tokio runtime. The task ends when every
/// [`QueryInput`] is dropped, after publishing any value still pending.
pub fn debounce(window: Duration) -> (QueryInput, DebouncedQuery) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (settled_tx, settled_rx) = watch::channel(String::new());
    tokio::spawn(run_debounce(window, input_rx, settled_tx));
    (QueryInput { tx: input_tx }, DebouncedQuery { rx: settled_rx })
}

enum Step {
    Received(Option<Input>),
    Settled,
}

async fn run_debounce(
    window: Duration,
    mut input: mpsc::UnboundedReceiver<Input>,
    settled: watch::Sender<String>,
) {
    let mut pending: Option<(String, Instant)> = None;

    loop {
        let deadline = pending.as_ref().map(|(_, at)| *at);
        let step = match deadline {
            Some(at) => tokio::select! {
                msg = input.recv() => Step::Received(msg),
                () = tokio::time::sleep_until(at) => Step::Settled,
            },
            None => Step::Received(input.recv().await),
        };

        match step {
            Step::Settled => {
                if let Some((value, _)) = pending.take() {
                    publish(&settled, value);
                }
            }
            Step::Received(Some(Input::Typed(text))) => {
                pending = Some((text, Instant::now() + window));
            }
            Step::Received(Some(Input::Selected(value))) => {
                pending = None;
                publish(&settled, value);
            }
            Step::Received(None) => {
                if let Some((value, _)) = pending.take() {
                    publish(&settled, value);
                }
                break;
            }
        }
    }
}

fn publish(settled: &watch::Sender<String>, value: String) {
    settled.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}
