//! TUI module using ratatui.
//!
//! The event loop owns the [`App`] controller. Terminal input is mapped to
//! actions by [`UiState`], effects run on spawned tasks, and their results
//! come back over a channel as actions.

pub mod components;

use crate::app::{Action, App, Phase};
use crate::client::ApiClient;
use crate::document::{checked_name, normalize_input_path, Document};
use crate::summary::SummaryMode;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers,
};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::{Frame, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(120);

/// Which widget receives typed keys once a summary is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Query,
    Modes,
}

/// Result of mapping one terminal event.
#[derive(Debug)]
pub enum Input {
    Ignored,
    Quit,
    Dispatch(Action),
}

/// Transient presentation state that the controller never sees.
#[derive(Debug, Default)]
pub struct UiState {
    pub upload_buffer: String,
    /// Set by a paste into the upload zone until it is submitted or edited
    pub drag_over: bool,
    pub upload_error: Option<String>,
    pub query_buffer: String,
    pub focus: Focus,
    pub mode_cursor: usize,
    pub scroll: u16,
    pub tick: usize,
}

impl UiState {
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Map a terminal event to a controller action.
    pub fn handle_event(&mut self, app: &App, event: &Event) -> Input {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(app, key),
            Event::Paste(text) => {
                self.handle_paste(app, text);
                Input::Ignored
            }
            _ => Input::Ignored,
        }
    }

    fn handle_paste(&mut self, app: &App, text: &str) {
        if app.alert().is_some() {
            return;
        }
        match app.phase() {
            Phase::NoFile => {
                self.upload_buffer = normalize_input_path(text);
                self.drag_over = !self.upload_buffer.is_empty();
                self.upload_error = None;
            }
            Phase::Ready if self.focus == Focus::Query => {
                self.query_buffer
                    .push_str(&text.replace(['\r', '\n'], " "));
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, app: &App, key: &KeyEvent) -> Input {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Input::Quit;
        }

        // The alert blocks everything else until dismissed.
        if app.alert().is_some() {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                    Input::Dispatch(Action::DismissAlert)
                }
                _ => Input::Ignored,
            };
        }

        if ctrl {
            return self.ctrl_key(app, key);
        }

        match app.phase() {
            Phase::NoFile => self.upload_key(key),
            Phase::Selected | Phase::Summarizing => match key.code {
                KeyCode::Esc => Input::Quit,
                _ => Input::Ignored,
            },
            Phase::Ready => self.ready_key(app, key),
        }
    }

    /// Ctrl chords never reach the text buffers.
    fn ctrl_key(&mut self, app: &App, key: &KeyEvent) -> Input {
        match key.code {
            KeyCode::Char('r') if app.document().is_some() => {
                self.clear_for_reset();
                Input::Dispatch(Action::Reset)
            }
            KeyCode::Char('s') if app.phase() == Phase::Ready => match app.document() {
                Some(doc) => Input::Dispatch(Action::SaveSummary(default_save_path(&doc.name))),
                None => Input::Ignored,
            },
            _ => Input::Ignored,
        }
    }

    fn upload_key(&mut self, key: &KeyEvent) -> Input {
        match key.code {
            KeyCode::Esc if self.upload_buffer.is_empty() => Input::Quit,
            KeyCode::Esc => {
                self.upload_buffer.clear();
                self.drag_over = false;
                self.upload_error = None;
                Input::Ignored
            }
            KeyCode::Enter => self.submit_upload(),
            KeyCode::Backspace => {
                self.upload_buffer.pop();
                self.drag_over = false;
                Input::Ignored
            }
            KeyCode::Char(c) => {
                self.upload_buffer.push(c);
                self.drag_over = false;
                self.upload_error = None;
                Input::Ignored
            }
            _ => Input::Ignored,
        }
    }

    /// Validate the entered path and ask for it to be read. The read itself
    /// happens off the event loop.
    fn submit_upload(&mut self) -> Input {
        let path = PathBuf::from(normalize_input_path(&self.upload_buffer));
        match checked_name(&path) {
            Ok(_) => {
                self.drag_over = false;
                self.upload_error = None;
                self.scroll = 0;
                Input::Dispatch(Action::OpenFile(path))
            }
            Err(e) => {
                log::warn!("rejected {:?}: {}", path, e);
                self.drag_over = false;
                self.upload_error = Some(e.to_string());
                Input::Ignored
            }
        }
    }

    fn ready_key(&mut self, app: &App, key: &KeyEvent) -> Input {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Query => Focus::Modes,
                    Focus::Modes => Focus::Query,
                };
                self.mode_cursor = app.mode().index();
                return Input::Ignored;
            }
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                return Input::Ignored;
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                return Input::Ignored;
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                return Input::Ignored;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                return Input::Ignored;
            }
            _ => {}
        }

        match self.focus {
            Focus::Query => self.query_key(app, key),
            Focus::Modes => self.modes_key(key),
        }
    }

    fn query_key(&mut self, app: &App, key: &KeyEvent) -> Input {
        match key.code {
            KeyCode::Enter => {
                if self.query_buffer.trim().is_empty() || !app.can_query() {
                    return Input::Ignored;
                }
                let question = std::mem::take(&mut self.query_buffer);
                Input::Dispatch(Action::SubmitQuery(question))
            }
            KeyCode::Esc if self.query_buffer.is_empty() => Input::Quit,
            KeyCode::Esc => {
                self.query_buffer.clear();
                Input::Ignored
            }
            KeyCode::Backspace => {
                self.query_buffer.pop();
                Input::Ignored
            }
            KeyCode::Char(c) => {
                self.query_buffer.push(c);
                Input::Ignored
            }
            _ => Input::Ignored,
        }
    }

    fn modes_key(&mut self, key: &KeyEvent) -> Input {
        let count = SummaryMode::ALL.len();
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.mode_cursor = (self.mode_cursor + count - 1) % count;
                Input::Ignored
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.mode_cursor = (self.mode_cursor + 1) % count;
                Input::Ignored
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.choose_mode(self.mode_cursor),
            KeyCode::Char(c @ '1'..='3') => self.choose_mode(c as usize - '1' as usize),
            KeyCode::Esc => {
                self.focus = Focus::Query;
                Input::Ignored
            }
            _ => Input::Ignored,
        }
    }

    fn choose_mode(&mut self, index: usize) -> Input {
        let mode = SummaryMode::ALL[index % SummaryMode::ALL.len()];
        self.mode_cursor = mode.index();
        self.scroll = 0;
        Input::Dispatch(Action::ChangeMode(mode))
    }

    fn clear_for_reset(&mut self) {
        *self = UiState {
            tick: self.tick,
            ..UiState::default()
        };
    }

    fn hints(&self, app: &App) -> &'static str {
        if app.alert().is_some() {
            return "Enter dismiss";
        }
        match app.phase() {
            Phase::NoFile => "Enter open · Esc quit",
            Phase::Selected | Phase::Summarizing => "Ctrl+R remove · Esc quit",
            Phase::Ready => match self.focus {
                Focus::Query => {
                    "Enter ask · Tab modes · ↑↓ scroll · Ctrl+S save · Ctrl+R new · Esc quit"
                }
                Focus::Modes => "←→ choose · Enter/1-3 apply · Tab ask · Ctrl+R new",
            },
        }
    }
}

/// `report.pdf` → `report.summary.md` in the working directory.
pub fn default_save_path(document_name: &str) -> PathBuf {
    let stem = Path::new(document_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "summary".to_string());
    PathBuf::from(format!("{}.summary.md", stem))
}

/// Render the whole screen.
pub fn draw(frame: &mut Frame, app: &App, ui: &UiState) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    components::header(frame, header, app.health());

    match app.phase() {
        Phase::NoFile => {
            let zone = centered_width(body, 72);
            components::upload_zone(
                frame,
                zone,
                &ui.upload_buffer,
                ui.drag_over,
                ui.upload_error.as_deref(),
            );
        }
        Phase::Selected => {
            let [chip, _] =
                Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(body);
            let name = app.document().map(|d| d.name.as_str()).unwrap_or_default();
            components::file_chip(frame, centered_width(chip, 60), name);
        }
        Phase::Summarizing => components::loader(frame, body, ui.tick),
        Phase::Ready => {
            let [modes, summary, query] = Layout::vertical([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .areas(body);
            let cursor = (ui.focus == Focus::Modes).then_some(ui.mode_cursor);
            components::mode_selector(frame, modes, app.mode(), cursor);
            components::summary_view(
                frame,
                summary,
                app.summary().unwrap_or_default(),
                app.details(),
                ui.scroll,
            );
            components::query_box(
                frame,
                query,
                &ui.query_buffer,
                app.is_querying(),
                ui.focus == Focus::Query,
            );
        }
    }

    components::footer(frame, footer, ui.hints(app), app.notice());

    if let Some(message) = app.alert() {
        components::alert(frame, frame.area(), message);
    }
}

fn centered_width(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

struct Tui {
    app: App,
    ui: UiState,
    client: ApiClient,
    tx: mpsc::UnboundedSender<Action>,
}

impl Tui {
    /// Apply an action and spawn whatever effect it asks for.
    fn dispatch(&mut self, action: Action) {
        let effect = self.app.update(action);
        if let Some(e) = self.app.take_open_error() {
            self.ui.upload_error = Some(e);
        }
        if let Some(effect) = effect {
            log::debug!("spawning {:?}", effect);
            let client = self.client.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let action = effect.perform(&client).await;
                // The receiver only goes away when the UI is shutting down.
                let _ = tx.send(action);
            });
        }
    }

    async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        mut rx: mpsc::UnboundedReceiver<Action>,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK_RATE);

        loop {
            terminal.draw(|frame| draw(frame, &self.app, &self.ui))?;

            tokio::select! {
                _ = tick.tick() => self.ui.on_tick(),
                Some(action) = rx.recv() => self.dispatch(action),
                event = events.next() => match event {
                    Some(Ok(event)) => match self.ui.handle_event(&self.app, &event) {
                        Input::Quit => break,
                        Input::Dispatch(action) => self.dispatch(action),
                        Input::Ignored => {}
                    },
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }
        Ok(())
    }
}

/// Launch the TUI, optionally selecting `initial` straight away.
pub async fn run(app: App, client: ApiClient, initial: Option<Document>) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut tui = Tui {
        app,
        ui: UiState::default(),
        client,
        tx,
    };

    tui.dispatch(Action::CheckHealth);
    if let Some(document) = initial {
        tui.dispatch(Action::SelectFile(document));
    }

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    tui.run(&mut terminal, rx).await
}

/// Raw mode and the alternate screen, undone on drop and on panic.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            default_hook(info);
        }));

        enable_raw_mode()?;
        // From here on the guard restores the terminal even if setup fails.
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        log::warn!("failed to leave raw mode: {}", e);
    }
    if let Err(e) = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen, Show) {
        log::warn!("failed to restore screen: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Effect;
    use crate::summary::SummaryResponse;
    use ratatui::backend::TestBackend;
    use std::io::Write;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(ui: &mut UiState, app: &App, text: &str) {
        for c in text.chars() {
            ui.handle_event(app, &key(KeyCode::Char(c)));
        }
    }

    fn response(summary: &str) -> SummaryResponse {
        serde_json::from_value(serde_json::json!({
            "summary": summary,
            "original_length": 2000,
            "summary_length": summary.len(),
            "compression_ratio": 0.05,
            "timestamp": "2024-05-01T12:00:00"
        }))
        .unwrap()
    }

    fn ready_app() -> App {
        let mut app = App::default();
        let Some(Effect::Summarize { generation, .. }) =
            app.update(Action::SelectFile(Document::new("report.pdf", vec![])))
        else {
            panic!("expected summarize effect");
        };
        app.update(Action::SummaryFinished {
            generation,
            result: Ok(response("X")),
        });
        app
    }

    fn screen(app: &App, ui: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app, ui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn paste_highlights_upload_zone() {
        let app = App::default();
        let mut ui = UiState::default();
        ui.handle_event(&app, &Event::Paste("'/tmp/report.pdf'\n".into()));
        assert_eq!(ui.upload_buffer, "/tmp/report.pdf");
        assert!(ui.drag_over);

        ui.handle_event(&app, &key(KeyCode::Backspace));
        assert!(!ui.drag_over);
    }

    #[test]
    fn unsupported_file_is_rejected_before_any_call() {
        let app = App::default();
        let mut ui = UiState::default();
        type_text(&mut ui, &app, "/tmp/picture.png");

        let input = ui.handle_event(&app, &key(KeyCode::Enter));
        assert!(matches!(input, Input::Ignored));
        assert!(ui.upload_error.as_deref().unwrap().contains("unsupported"));
    }

    #[cfg(unix)]
    #[test]
    fn enter_on_supported_path_asks_to_open_it() {
        let app = App::default();
        let mut ui = UiState::default();
        ui.handle_event(&app, &Event::Paste("file:///tmp/my%20notes.txt".into()));

        match ui.handle_event(&app, &key(KeyCode::Enter)) {
            Input::Dispatch(Action::OpenFile(path)) => {
                assert_eq!(path, PathBuf::from("/tmp/my notes.txt"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ui.upload_error.is_none());
    }

    #[tokio::test]
    async fn opened_file_is_read_then_selected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        let mut app = App::default();
        let Some(effect @ Effect::Open(_)) = app.update(Action::OpenFile(path)) else {
            panic!("expected open effect");
        };
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let opened = effect.perform(&client).await;
        app.update(opened);

        assert_eq!(app.document().unwrap().name, "notes.txt");
        assert_eq!(app.phase(), Phase::Summarizing);
    }

    #[test]
    fn ctrl_chords_do_not_type() {
        let app = App::default();
        let mut ui = UiState::default();
        for c in ['s', 'a', 'u'] {
            assert!(matches!(ui.handle_event(&app, &ctrl(c)), Input::Ignored));
        }
        assert!(ui.upload_buffer.is_empty());

        let app = ready_app();
        let mut ui = UiState::default();
        ui.handle_event(&app, &ctrl('w'));
        assert!(ui.query_buffer.is_empty());
        assert!(matches!(
            ui.handle_event(&app, &ctrl('s')),
            Input::Dispatch(Action::SaveSummary(_))
        ));
        assert!(ui.query_buffer.is_empty());
    }

    #[test]
    fn query_submit_takes_buffer() {
        let app = ready_app();
        let mut ui = UiState::default();

        assert!(matches!(
            ui.handle_event(&app, &key(KeyCode::Enter)),
            Input::Ignored
        ));

        type_text(&mut ui, &app, "why?");
        match ui.handle_event(&app, &key(KeyCode::Enter)) {
            Input::Dispatch(Action::SubmitQuery(q)) => assert_eq!(q, "why?"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(ui.query_buffer.is_empty());
    }

    #[test]
    fn mode_selector_dispatches_change() {
        let app = ready_app();
        let mut ui = UiState::default();
        ui.handle_event(&app, &key(KeyCode::Tab));
        assert_eq!(ui.focus, Focus::Modes);
        assert_eq!(ui.mode_cursor, SummaryMode::Balanced.index());

        ui.handle_event(&app, &key(KeyCode::Right));
        match ui.handle_event(&app, &key(KeyCode::Enter)) {
            Input::Dispatch(Action::ChangeMode(mode)) => {
                assert_eq!(mode, SummaryMode::Comprehensive)
            }
            other => panic!("unexpected {:?}", other),
        }

        match ui.handle_event(&app, &key(KeyCode::Char('1'))) {
            Input::Dispatch(Action::ChangeMode(mode)) => assert_eq!(mode, SummaryMode::Concise),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn alert_blocks_other_input() {
        let mut app = ready_app();
        let Some(Effect::Ask {
            generation,
            revision,
            question,
            ..
        }) = app.update(Action::SubmitQuery("q".into()))
        else {
            panic!("expected ask effect");
        };
        app.update(Action::QueryFinished {
            generation,
            revision,
            question,
            result: Err(crate::client::ApiError::Server {
                status: 500,
                message: "boom".into(),
            }),
        });

        let mut ui = UiState::default();
        assert!(matches!(
            ui.handle_event(&app, &ctrl('r')),
            Input::Ignored
        ));
        assert!(matches!(
            ui.handle_event(&app, &key(KeyCode::Enter)),
            Input::Dispatch(Action::DismissAlert)
        ));
    }

    #[test]
    fn ctrl_r_resets_local_state() {
        let app = ready_app();
        let mut ui = UiState::default();
        type_text(&mut ui, &app, "half typed");
        assert!(matches!(
            ui.handle_event(&app, &ctrl('r')),
            Input::Dispatch(Action::Reset)
        ));
        assert!(ui.query_buffer.is_empty());
    }

    #[test]
    fn save_path_uses_document_stem() {
        assert_eq!(
            default_save_path("report.pdf"),
            PathBuf::from("report.summary.md")
        );
    }

    #[test]
    fn renders_each_phase() {
        let mut app = App::default();
        let ui = UiState::default();
        assert!(screen(&app, &ui).contains("Upload Document"));

        app.update(Action::SelectFile(Document::new("report.pdf", vec![])));
        assert!(screen(&app, &ui).contains("PROCESSING DOCUMENT..."));

        let app = ready_app();
        let text = screen(&app, &ui);
        assert!(text.contains("Generated Summary"));
        assert!(text.contains("Balanced"));
        assert!(text.contains(components::QUERY_PLACEHOLDER));
    }
}
