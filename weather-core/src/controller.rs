//! Query lifecycle: validate, fetch in the background, decode, publish.
//!
//! State lives in a single `watch` cell. Each write replaces the whole
//! [`FetchState`] variant, so readers always see a consistent snapshot.
//! Subscribers are woken after a write but only observe the latest value;
//! a slow reader may skip intermediate states such as `Loading`.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    client::WeatherSource,
    decoder,
    error::{FetchError, ValidationError},
    model::{FetchState, WeatherModel},
};

/// City queried once when an application starts.
pub const DEFAULT_CITY: &str = "Sao Paulo";

#[derive(Debug, Default)]
struct Cell {
    state: FetchState,
    /// Bumped on every accepted submission.
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct WeatherFetchController {
    source: Arc<dyn WeatherSource>,
    cell: Arc<watch::Sender<Cell>>,
}

impl WeatherFetchController {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        let (cell, _) = watch::channel(Cell::default());
        Self {
            source,
            cell: Arc::new(cell),
        }
    }

    /// Start a new fetch lifecycle for `city_name`.
    ///
    /// Moves to `Loading` synchronously and returns at once; the network call
    /// and decoding run on a spawned task. Must be called from within a Tokio
    /// runtime. An empty name is rejected without touching the state.
    ///
    /// Overlapping submissions are not cancelled, but once a newer query has
    /// been submitted the result of an older one is dropped instead of
    /// published.
    pub fn submit_query(&self, city_name: &str) -> Result<JoinHandle<()>, ValidationError> {
        if city_name.is_empty() {
            tracing::debug!("ignoring query with empty city name");
            return Err(ValidationError::EmptyCityName);
        }

        let mut generation = 0;
        self.cell.send_modify(|cell| {
            cell.generation += 1;
            generation = cell.generation;
            cell.state = FetchState::Loading;
        });

        let source = Arc::clone(&self.source);
        let cell = Arc::clone(&self.cell);
        let city = city_name.to_string();

        Ok(tokio::spawn(async move {
            let state = match run_pipeline(source.as_ref(), &city).await {
                Ok(model) => FetchState::Ready(model),
                Err(err) => {
                    tracing::warn!(city = %city, reason = %err.reason(), "weather fetch failed");
                    FetchState::Failed(err)
                }
            };

            let published = cell.send_if_modified(|cell| {
                if cell.generation != generation {
                    return false;
                }
                cell.state = state;
                true
            });

            if !published {
                tracing::debug!(city = %city, "discarding result of superseded query");
            }
        }))
    }

    pub fn current_state(&self) -> FetchState {
        self.cell.borrow().state.clone()
    }

    /// Receiver woken on state writes. Writes made while it is not looking
    /// are merged, so only the most recent state is guaranteed to be seen.
    pub fn subscribe(&self) -> StateReceiver {
        StateReceiver {
            inner: self.cell.subscribe(),
        }
    }

    /// Wait until the state is `Ready` or `Failed` and return it. Resolves at
    /// once if it already is, so call this after [`Self::submit_query`].
    pub async fn wait_settled(&self) -> FetchState {
        self.subscribe().wait_settled().await
    }
}

async fn run_pipeline(source: &dyn WeatherSource, city: &str) -> Result<WeatherModel, FetchError> {
    tracing::debug!(city, "fetching current weather");
    let raw = source.fetch(city).await?;
    let model = decoder::decode(raw)?;
    Ok(model)
}

/// Read side of the controller's state cell.
#[derive(Debug, Clone)]
pub struct StateReceiver {
    inner: watch::Receiver<Cell>,
}

impl StateReceiver {
    pub fn current(&self) -> FetchState {
        self.inner.borrow().state.clone()
    }

    /// Wait until the state has been written since the last look and return
    /// the latest value. Returns `None` once the controller has been dropped.
    pub async fn changed(&mut self) -> Option<FetchState> {
        self.inner.changed().await.ok()?;
        Some(self.inner.borrow_and_update().state.clone())
    }

    pub async fn wait_settled(&mut self) -> FetchState {
        let settled = self
            .inner
            .wait_for(|cell| cell.state.is_settled())
            .await
            .map(|cell| cell.state.clone());

        // sender gone; report whatever was last published
        settled.unwrap_or_else(|_| self.inner.borrow().state.clone())
    }
}
