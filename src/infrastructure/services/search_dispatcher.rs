//! Debounced, cancelable search dispatcher
//!
//! One task owns the [`SearchSession`] and serializes every UI event through a
//! command channel. Network calls run in spawned tasks tagged with a
//! generation number; a newer dispatch aborts the older task and any response
//! that still arrives with an old generation is dropped unrendered.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::dispatch::{
    DispatchState, Renderer, ResultSource, SearchSession, SearchView,
};
use crate::domain::search::{meets_min_length, SearchIntent, SearchKind};
use crate::domain::DomainError;

use super::search_pipeline::SearchPipeline;

/// Quiet period after the last keystroke before a typed query is searched
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum Command {
    Submit(Option<SearchIntent>),
    InputChanged(String),
    SetKind(SearchKind),
    SetModels(BTreeSet<String>),
    ToggleModel(String),
    SelectExample(String),
    SearchRelated(String),
    WaitIdle(oneshot::Sender<()>),
    Shutdown,
}

#[derive(Debug)]
struct Completion {
    generation: u64,
    intent: SearchIntent,
    result: Result<Value, DomainError>,
}

/// Cloneable front end to a running [`SearchDispatcher`]
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<DispatchState>,
}

impl DispatcherHandle {
    fn send(&self, command: Command) -> Result<(), DomainError> {
        self.commands
            .send(command)
            .map_err(|_| DomainError::internal("Search dispatcher has stopped"))
    }

    /// Adopts the intent as the current session state and searches now
    pub fn submit(&self, intent: SearchIntent) -> Result<(), DomainError> {
        self.send(Command::Submit(Some(intent)))
    }

    /// Searches the current session state now
    pub fn submit_current(&self) -> Result<(), DomainError> {
        self.send(Command::Submit(None))
    }

    /// Records typed text and restarts the debounce window
    pub fn input_changed(&self, text: impl Into<String>) -> Result<(), DomainError> {
        self.send(Command::InputChanged(text.into()))
    }

    pub fn set_kind(&self, kind: SearchKind) -> Result<(), DomainError> {
        self.send(Command::SetKind(kind))
    }

    pub fn set_models<I, M>(&self, models: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.send(Command::SetModels(
            models.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn toggle_model(&self, model: impl Into<String>) -> Result<(), DomainError> {
        self.send(Command::ToggleModel(model.into()))
    }

    /// Replaces the query with an example and searches it
    pub fn select_example(&self, example: impl Into<String>) -> Result<(), DomainError> {
        self.send(Command::SelectExample(example.into()))
    }

    /// Searches a related word as a words query
    pub fn search_related(&self, word: impl Into<String>) -> Result<(), DomainError> {
        self.send(Command::SearchRelated(word.into()))
    }

    /// Resolves once no typed text awaits its debounce and no request is in
    /// flight
    pub async fn wait_idle(&self) -> Result<(), DomainError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::WaitIdle(tx))?;

        rx.await
            .map_err(|_| DomainError::internal("Search dispatcher has stopped"))
    }

    /// Stops the dispatcher and aborts any in-flight request
    pub fn shutdown(&self) -> Result<(), DomainError> {
        self.send(Command::Shutdown)
    }

    pub fn state(&self) -> DispatchState {
        *self.state.borrow()
    }
}

/// Event loop turning UI events into searches
#[derive(Debug)]
pub struct SearchDispatcher {
    pipeline: SearchPipeline,
    renderer: Arc<dyn Renderer>,
    session: SearchSession,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    state: watch::Sender<DispatchState>,
    debounce: Option<Instant>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl SearchDispatcher {
    /// Starts the dispatcher on the current runtime
    ///
    /// The result cache is swept once before the first event is handled.
    pub fn spawn(
        pipeline: SearchPipeline,
        renderer: Arc<dyn Renderer>,
        session: SearchSession,
    ) -> (DispatcherHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(DispatchState::Idle);

        let dispatcher = Self {
            pipeline,
            renderer,
            session,
            commands,
            completions_tx,
            completions,
            state,
            debounce: None,
            generation: 0,
            in_flight: None,
            idle_waiters: Vec::new(),
        };

        let handle = DispatcherHandle {
            commands: commands_tx,
            state: state_rx,
        };

        (handle, tokio::spawn(dispatcher.run()))
    }

    async fn run(mut self) {
        let report = self.pipeline.cache().sweep().await;
        debug!(
            "Startup sweep kept {} cache entries, removed {}",
            report.kept, report.removed
        );

        loop {
            let deadline = self.debounce;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command).await,
                },

                Some(done) = self.completions.recv() => {
                    self.complete(done).await;
                }

                _ = wait_until(deadline) => {
                    self.debounce = None;
                    self.debounce_elapsed().await;
                }
            }

            self.notify_if_idle();
        }

        self.supersede();
        info!("Search dispatcher stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Submit(intent) => {
                if let Some(intent) = intent {
                    self.session.adopt(&intent);
                }
                self.dispatch().await;
            }
            Command::InputChanged(text) => {
                self.session.set_query(text);
                self.debounce = Some(Instant::now() + DEBOUNCE_WINDOW);
            }
            Command::SetKind(kind) => {
                self.session.set_kind(kind);
                self.kind_changed().await;
            }
            Command::SetModels(models) => {
                self.session.set_models(models);
                self.filter_changed().await;
            }
            Command::ToggleModel(model) => {
                self.session.toggle_model(&model);
                self.filter_changed().await;
            }
            Command::SelectExample(example) => {
                self.session.forget(self.session.kind());
                self.session.set_query(example);
                self.dispatch().await;
            }
            Command::SearchRelated(word) => {
                self.session.set_kind(SearchKind::Words);
                self.session.set_query(word);
                self.dispatch().await;
            }
            Command::WaitIdle(waiter) => self.idle_waiters.push(waiter),
            Command::Shutdown => {}
        }
    }

    /// Releases `wait_idle` callers once nothing is armed or in flight
    fn notify_if_idle(&mut self) {
        if self.debounce.is_some() || self.in_flight.is_some() {
            return;
        }

        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Restores the remembered result for the new kind when it still applies
    async fn kind_changed(&mut self) {
        let kind = self.session.kind();
        let query = self.session.query().trim().to_string();

        if let Some(last) = self.session.last_search(kind).cloned() {
            if last.intent == self.session.intent() || !meets_min_length(&query) {
                debug!("Restoring last {} search '{}'", kind, last.intent.query());
                self.debounce = None;
                self.supersede();
                self.session.set_query(last.intent.query());

                self.render(SearchView::Results {
                    intent: last.intent,
                    payload: last.payload,
                    source: ResultSource::Memory,
                });
                return;
            }
        }

        if meets_min_length(&query) {
            self.dispatch().await;
        } else {
            self.debounce = None;
            self.supersede();
            self.render(SearchView::Cleared);
        }
    }

    /// Model selection changes search immediately, but only for real queries
    async fn filter_changed(&mut self) {
        if meets_min_length(self.session.query()) {
            self.dispatch().await;
        }
    }

    async fn debounce_elapsed(&mut self) {
        if meets_min_length(self.session.query()) {
            self.dispatch().await;
        } else {
            self.supersede();
            self.render(SearchView::Cleared);
        }
    }

    async fn dispatch(&mut self) {
        self.debounce = None;
        self.supersede();

        let intent = self.session.intent();

        if let Some(view) = self.pipeline.lookup(&intent).await {
            if let SearchView::Results { payload, .. } = &view {
                debug!("Serving '{}' from cache", intent.query());
                self.session.remember(&intent, payload);
            }
            self.render(view);
            return;
        }

        self.transition(DispatchState::Pending);
        self.render(SearchView::Loading {
            intent: intent.clone(),
        });

        let generation = self.generation;
        let pipeline = self.pipeline.clone();
        let completions = self.completions_tx.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let result = pipeline.fetch(&intent).await;
            let _ = completions.send(Completion {
                generation,
                intent,
                result,
            });
        }));
    }

    async fn complete(&mut self, done: Completion) {
        if done.generation != self.generation {
            debug!("Dropping stale response for '{}'", done.intent.query());
            return;
        }

        self.in_flight = None;

        let view = SearchPipeline::settle(&done.intent, done.result);

        if let SearchView::Results { payload, .. } = &view {
            let payload = payload.clone();

            self.transition(DispatchState::Succeeded);
            self.session.remember(&done.intent, &payload);
            self.render(view);
            self.pipeline.store(&done.intent, &payload).await;
        } else {
            self.transition(DispatchState::Failed);
            self.render(view);
        }

        self.transition(DispatchState::Idle);
    }

    /// Invalidates whatever request is outstanding
    fn supersede(&mut self) {
        self.generation += 1;

        if let Some(task) = self.in_flight.take() {
            task.abort();
            debug!("Aborted superseded request");
        }

        if *self.state.borrow() == DispatchState::Pending {
            self.transition(DispatchState::Idle);
        }
    }

    fn transition(&self, next: DispatchState) {
        self.state.send_replace(next);
    }

    fn render(&self, view: SearchView) {
        self.renderer.render(&view);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
