/// Main TUI application
///
/// Owns the single piece of client-side state, `ViewState`, and drives it
/// through the loading -> ready/failed -> refresh cycle. The two backend
/// reads of one refresh are treated as a unit: a spawned task buffers both
/// payloads and reports once, so the view can never show half of a refresh.

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::core::client::DashboardApi;
use crate::core::config::Settings;
use crate::core::metrics::{GreetingPayload, SystemSnapshot};
use crate::screens::Dashboard;

// How long the event loop blocks waiting for a key before redrawing
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Both payloads of one completed refresh
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub greeting: GreetingPayload,
    pub snapshot: SystemSnapshot,
}

/// The one client-side state variable. Replaced wholesale on every
/// transition, never mutated field by field.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready(DashboardData),
    Failed(String),
}

type FetchOutcome = Result<DashboardData, String>;

pub struct App {
    api: Arc<dyn DashboardApi>,
    dashboard: Dashboard,
    state: ViewState,
    // Fetch tasks report through this channel; each result is tagged with
    // the generation that started it so superseded attempts are dropped
    fetch_tx: UnboundedSender<(u64, FetchOutcome)>,
    fetch_rx: UnboundedReceiver<(u64, FetchOutcome)>,
    generation: u64,
    fetch_task: Option<JoinHandle<()>>,
    refresh_interval: Duration,
    last_refresh: Instant,
    last_updated: Option<DateTime<Local>>,
    should_quit: bool,
    show_help: bool,
}

impl App {
    pub fn new(api: Arc<dyn DashboardApi>, settings: &Settings) -> Self {
        let (fetch_tx, fetch_rx) = unbounded_channel();

        Self {
            api,
            dashboard: Dashboard::new(),
            state: ViewState::Loading,
            fetch_tx,
            fetch_rx,
            generation: 0,
            fetch_task: None,
            refresh_interval: settings.refresh_interval,
            last_refresh: Instant::now(),
            last_updated: None,
            should_quit: false,
            show_help: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start a refresh. A still-running attempt is superseded: its task is
    /// aborted and any result it already queued is dropped by the
    /// generation check in `apply_fetch_outcome`.
    pub fn begin_fetch(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }

        self.generation += 1;
        self.state = ViewState::Loading;
        self.last_refresh = Instant::now();

        let api = Arc::clone(&self.api);
        let tx = self.fetch_tx.clone();
        let generation = self.generation;

        self.fetch_task = Some(tokio::spawn(async move {
            let outcome = fetch_sequence(api.as_ref()).await;
            let _ = tx.send((generation, outcome));
        }));
    }

    /// Drain completed fetches without blocking
    fn poll_fetch_results(&mut self) {
        while let Ok((generation, outcome)) = self.fetch_rx.try_recv() {
            self.apply_fetch_outcome(generation, outcome);
        }
    }

    fn apply_fetch_outcome(&mut self, generation: u64, outcome: FetchOutcome) {
        if generation != self.generation {
            // A newer refresh superseded this one
            return;
        }

        self.fetch_task = None;
        self.state = match outcome {
            Ok(data) => {
                self.last_updated = Some(Local::now());
                ViewState::Ready(data)
            }
            Err(message) => ViewState::Failed(message),
        };
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.begin_fetch(),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
    }

    fn tick(&mut self) {
        if self.last_refresh.elapsed() >= self.refresh_interval {
            self.begin_fetch();
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Initial fetch on mount
        self.begin_fetch();

        let result = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            self.poll_fetch_results();

            terminal.draw(|frame| {
                self.dashboard.render(
                    frame,
                    &self.state,
                    self.is_fetching(),
                    self.last_updated,
                    self.show_help,
                );
            })?;

            if event::poll(EVENT_POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.on_key(key.code);
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }

            self.tick();
        }
    }
}

/// The two dependent reads of one refresh, greeting first. Both results
/// are buffered locally; the caller sees a single all-or-nothing outcome,
/// so a failed second call discards whatever the first one returned.
async fn fetch_sequence(api: &dyn DashboardApi) -> FetchOutcome {
    let greeting = api.fetch_greeting().await.map_err(|e| e.to_string())?;
    let snapshot = api.fetch_snapshot().await.map_err(|e| e.to_string())?;
    Ok(DashboardData { greeting, snapshot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::{ApiError, MockDashboardApi};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn greeting() -> GreetingPayload {
        GreetingPayload {
            message: Some("hi".to_string()),
            version: Some("1.0.0".to_string()),
            timestamp: Some("2026-01-01T00:00:00Z".to_string()),
        }
    }

    fn snapshot() -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: Some(42.0),
            memory_percent: Some(55.0),
            disk_percent: Some(10.0),
            hostname: Some("pi".to_string()),
            environment: Some("production".to_string()),
        }
    }

    fn app_with(api: MockDashboardApi) -> App {
        App::new(Arc::new(api), &Settings::default())
    }

    /// Receive the next fetch result and apply it, like one loop turn
    async fn complete_fetch(app: &mut App) {
        let (generation, outcome) = app.fetch_rx.recv().await.unwrap();
        app.apply_fetch_outcome(generation, outcome);
    }

    #[tokio::test]
    async fn test_starts_loading_without_fetching() {
        let app = app_with(MockDashboardApi::new());
        assert_eq!(*app.state(), ViewState::Loading);
        assert!(!app.is_fetching());
    }

    #[tokio::test]
    async fn test_successful_fetch_reaches_ready() {
        let mut api = MockDashboardApi::new();
        api.expect_fetch_greeting().returning(|| Ok(greeting()));
        api.expect_fetch_snapshot().returning(|| Ok(snapshot()));

        let mut app = app_with(api);
        app.begin_fetch();
        complete_fetch(&mut app).await;

        match app.state() {
            ViewState::Ready(data) => {
                assert_eq!(data.greeting.message.as_deref(), Some("hi"));
                assert_eq!(data.snapshot.cpu_percent, Some(42.0));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert!(app.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_partial_failure_discards_greeting() {
        let mut api = MockDashboardApi::new();
        api.expect_fetch_greeting().returning(|| Ok(greeting()));
        api.expect_fetch_snapshot()
            .returning(|| Err(ApiError::Status(500)));

        let mut app = app_with(api);
        app.begin_fetch();
        complete_fetch(&mut app).await;

        // The greeting succeeded, but the view must not keep any of it
        match app.state() {
            ViewState::Failed(message) => assert!(message.contains("500")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_fetch_failure_reaches_failed() {
        let mut api = MockDashboardApi::new();
        api.expect_fetch_greeting()
            .returning(|| Err(ApiError::Status(502)));
        // fetch_snapshot must not be called once the greeting failed
        api.expect_fetch_snapshot().times(0);

        let mut app = app_with(api);
        app.begin_fetch();
        complete_fetch(&mut app).await;

        assert!(matches!(app.state(), ViewState::Failed(_)));
    }

    #[tokio::test]
    async fn test_retry_clears_stale_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut api = MockDashboardApi::new();
        api.expect_fetch_greeting().returning(|| Ok(greeting()));
        api.expect_fetch_snapshot().returning(move || {
            if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApiError::Status(500))
            } else {
                Ok(snapshot())
            }
        });

        let mut app = app_with(api);
        app.begin_fetch();
        complete_fetch(&mut app).await;
        assert!(matches!(app.state(), ViewState::Failed(_)));

        // Retry re-enters Loading immediately, then succeeds
        app.begin_fetch();
        assert_eq!(*app.state(), ViewState::Loading);
        complete_fetch(&mut app).await;

        match app.state() {
            ViewState::Ready(data) => {
                assert_eq!(data.snapshot.memory_percent, Some(55.0))
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_superseded_results_are_dropped() {
        let mut app = app_with(MockDashboardApi::new());
        app.generation = 2;

        // A result from generation 1 arrives after generation 2 started
        let stale = DashboardData {
            greeting: greeting(),
            snapshot: snapshot(),
        };
        app.apply_fetch_outcome(1, Ok(stale));
        assert_eq!(*app.state(), ViewState::Loading);

        let current = DashboardData {
            greeting: greeting(),
            snapshot: snapshot(),
        };
        app.apply_fetch_outcome(2, Ok(current));
        assert!(matches!(app.state(), ViewState::Ready(_)));
    }

    #[tokio::test]
    async fn test_refresh_supersedes_in_flight_fetch() {
        let mut api = MockDashboardApi::new();
        api.expect_fetch_greeting().returning(|| Ok(greeting()));
        api.expect_fetch_snapshot().returning(|| Ok(snapshot()));

        let mut app = app_with(api);
        app.begin_fetch();
        let first_generation = app.generation;
        app.begin_fetch();

        assert_eq!(app.generation, first_generation + 1);
        assert_eq!(*app.state(), ViewState::Loading);

        // Only the newer generation may complete the refresh
        while let Some((generation, outcome)) = app.fetch_rx.recv().await {
            app.apply_fetch_outcome(generation, outcome);
            if generation == app.generation {
                break;
            }
        }
        assert!(matches!(app.state(), ViewState::Ready(_)));
    }
}
