//! TUI application state and event loop.
//!
//! Sampling runs on a background thread so the UI never blocks on a slow
//! probe. At most one tick is in flight; the render loop only reads the
//! last published chart snapshots.

use std::io;
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use hostscope_core::{ChartSnapshot, Diagnostic, Inventory, Sampler, SharedSampler, TickOutcome};

const MIN_REFRESH: Duration = Duration::from_millis(100);
const MAX_REFRESH: Duration = Duration::from_secs(10);

/// Published by the sampling thread, read by the renderer.
#[derive(Default)]
struct Published {
    charts: Vec<ChartSnapshot>,
    tick: Option<u64>,
    last_ms: u128,
    skipped: u64,
    diagnostics: Vec<Diagnostic>,
    sampling: bool,
}

fn lock(state: &Mutex<Published>) -> MutexGuard<'_, Published> {
    state.lock().unwrap_or_else(|p| p.into_inner())
}

/// Only the thread that drives the UI may tear the terminal down; panics
/// caught on the sampling thread must leave it alone.
fn owns_terminal(ui_thread: ThreadId) -> bool {
    thread::current().id() == ui_thread
}

/// Halve (`faster`) or double the refresh period within bounds.
pub fn adjust_refresh(current: Duration, faster: bool) -> Duration {
    let next = if faster { current / 2 } else { current * 2 };
    next.clamp(MIN_REFRESH, MAX_REFRESH)
}

pub struct App {
    sampler: SharedSampler,
    inventory: Inventory,
    refresh_rate: Duration,
    running: bool,
    paused: bool,
    published: Arc<Mutex<Published>>,
    collector_flag: Arc<AtomicBool>,
    last_export: Option<String>,
}

impl App {
    pub fn new(sampler: Sampler, inventory: Inventory, refresh: Duration) -> Self {
        let charts = sampler.snapshots();
        Self {
            sampler: SharedSampler::new(sampler),
            inventory,
            refresh_rate: refresh.clamp(MIN_REFRESH, MAX_REFRESH),
            running: true,
            paused: false,
            published: Arc::new(Mutex::new(Published {
                charts,
                ..Published::default()
            })),
            collector_flag: Arc::new(AtomicBool::new(false)),
            last_export: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before a UI-thread panic message is printed.
        let ui_thread = thread::current().id();
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if owns_terminal(ui_thread) {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            }
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if let Some(path) = &self.last_export {
            println!("Charts exported to {path}");
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.kick_tick();
        let mut last_tick = Instant::now();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if last_tick.elapsed() >= self.refresh_rate {
                if !self.paused {
                    self.kick_tick();
                }
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('p') => self.paused = !self.paused,
            KeyCode::Char('s') => self.export_snapshot(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.refresh_rate = adjust_refresh(self.refresh_rate, true);
            }
            KeyCode::Char('-') => {
                self.refresh_rate = adjust_refresh(self.refresh_rate, false);
            }
            _ => {}
        }
    }

    fn kick_tick(&self) {
        if self.collector_flag.load(Ordering::Relaxed) {
            lock(&self.published).skipped += 1;
            return;
        }

        let sampler = self.sampler.clone();
        let published = Arc::clone(&self.published);
        let flag = Arc::clone(&self.collector_flag);

        flag.store(true, Ordering::Relaxed);

        thread::spawn(move || {
            lock(&published).sampling = true;

            let inner = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                match sampler.try_tick() {
                    TickOutcome::Completed(report) => {
                        let charts = sampler.snapshots();
                        let mut p = lock(&published);
                        p.charts = charts;
                        p.tick = Some(report.tick);
                        p.last_ms = report.elapsed.as_millis();
                        p.diagnostics = report.diagnostics;
                    }
                    TickOutcome::Skipped => lock(&published).skipped += 1,
                }
            }));

            let mut p = lock(&published);
            p.sampling = false;
            if inner.is_err() {
                p.skipped += 1;
            }
            drop(p);
            flag.store(false, Ordering::Relaxed);
        });
    }

    fn export_snapshot(&mut self) {
        let charts = lock(&self.published).charts.clone();
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = format!("hostscope-{ts}.json");
        let written = serde_json::to_string_pretty(&charts)
            .map_err(io::Error::other)
            .and_then(|json| std::fs::write(&path, json));
        self.last_export = match written {
            Ok(()) => Some(path),
            Err(e) => {
                log::warn!("export to {path} failed: {e}");
                None
            }
        };
    }

    // --- read accessors for ui ---

    pub fn charts(&self) -> Vec<ChartSnapshot> {
        lock(&self.published).charts.clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.published).diagnostics.clone()
    }

    pub fn tick(&self) -> Option<u64> {
        lock(&self.published).tick
    }

    pub fn last_ms(&self) -> u128 {
        lock(&self.published).last_ms
    }

    pub fn skipped(&self) -> u64 {
        lock(&self.published).skipped
    }

    pub fn is_sampling(&self) -> bool {
        lock(&self.published).sampling
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn refresh_rate(&self) -> Duration {
        self.refresh_rate
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn last_export(&self) -> Option<&str> {
        self.last_export.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_halves_and_doubles_within_bounds() {
        let one = Duration::from_secs(1);
        assert_eq!(adjust_refresh(one, true), Duration::from_millis(500));
        assert_eq!(adjust_refresh(one, false), Duration::from_secs(2));
        assert_eq!(adjust_refresh(MIN_REFRESH, true), MIN_REFRESH);
        assert_eq!(adjust_refresh(MAX_REFRESH, false), MAX_REFRESH);
    }

    #[test]
    fn only_the_ui_thread_owns_the_terminal() {
        let ui_thread = thread::current().id();
        assert!(owns_terminal(ui_thread));
        let from_sampler = thread::spawn(move || owns_terminal(ui_thread))
            .join()
            .unwrap();
        assert!(!from_sampler);
    }

    #[test]
    fn paused_app_does_not_sample() {
        let mut app = App::new(Sampler::new(), empty_inventory(), Duration::from_secs(1));
        app.handle_key(KeyCode::Char('p'));
        assert!(app.is_paused());
        app.handle_key(KeyCode::Char('+'));
        assert_eq!(app.refresh_rate(), Duration::from_millis(500));
        app.handle_key(KeyCode::Esc);
        assert!(!app.running);
    }

    #[test]
    fn kick_tick_publishes_charts() {
        let app = App::new(Sampler::new(), empty_inventory(), Duration::from_secs(1));
        app.kick_tick();
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.tick().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(app.tick(), Some(0));
    }

    fn empty_inventory() -> Inventory {
        Inventory {
            cpu_cores: 0,
            drives: Vec::new(),
            interfaces: Vec::new(),
            temperature_drives: Vec::new(),
            fan_input: None,
        }
    }
}
