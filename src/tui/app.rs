//! Main TUI application state machine.
//!
//! Handles:
//! - Input event handling
//! - Service integration (every edit re-scores and persists)
//! - Import prompt and export

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::sqlite::SqliteStorage;
use crate::application::CalculatorService;
use crate::domain::CalculatorProfile;
use crate::ports::Storage;
use crate::NomogramError;

use super::ui::{
    calculator::{render_calculator, CalculatorFormState, InputMode, StatusMessage},
    render_disclaimer,
};

/// Main application state
pub struct App<S = SqliteStorage>
where
    S: Storage,
{
    /// Whether the app should quit
    should_quit: bool,

    /// Calculator session
    service: CalculatorService<S>,

    /// Directory exports are written to
    export_dir: PathBuf,

    /// Form state
    form_state: CalculatorFormState,
}

impl App<SqliteStorage> {
    /// Create a new application instance from the environment.
    ///
    /// Reads `NOMOGRAM_PROFILE`, `NOMOGRAM_DB_PATH` and `NOMOGRAM_EXPORT_DIR`.
    ///
    /// # Errors
    /// Returns error if the profile is unknown or storage cannot be opened.
    pub fn new() -> Result<Self> {
        let profile_name =
            std::env::var("NOMOGRAM_PROFILE").unwrap_or_else(|_| "nomogram".to_string());
        let profile = CalculatorProfile::by_name(&profile_name)
            .ok_or_else(|| NomogramError::UnknownProfile(profile_name.clone()))?;

        let db_path =
            std::env::var("NOMOGRAM_DB_PATH").unwrap_or_else(|_| "nomogram.db".to_string());
        let storage = Arc::new(SqliteStorage::new(&db_path).map_err(NomogramError::from)?);

        let export_dir = std::env::var("NOMOGRAM_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        tracing::info!("Using profile '{}' with store {}", profile.name, db_path);

        Ok(Self::with_dependencies(
            CalculatorService::new(profile, storage),
            export_dir,
        ))
    }
}

impl<S> App<S>
where
    S: Storage,
{
    /// Create application with injected dependencies (Composition Root pattern).
    pub fn with_dependencies(service: CalculatorService<S>, export_dir: PathBuf) -> Self {
        let form_state = CalculatorFormState::for_profile(service.profile());
        Self {
            should_quit: false,
            service,
            export_dir,
            form_state,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        if self.service.initialize() {
            self.form_state.status = Some(StatusMessage::Info("Restored saved values".into()));
        }

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.draw(terminal)?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> Result<()> {
        let display = self.service.evaluate();

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(3)])
                .split(f.area());

            render_calculator(
                f,
                chunks[0],
                &self.form_state,
                self.service.profile(),
                self.service.session(),
                &display,
            );
            render_disclaimer(f, chunks[1], self.service.profile());
        })?;

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.form_state.mode {
            InputMode::Normal => self.handle_form_key(key),
            InputMode::ImportPath(_) => self.handle_import_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Char(c) if CalculatorFormState::accepts(c) => {
                self.edit_selected(|text| text.push(c));
            }
            KeyCode::Backspace => self.edit_selected(|text| {
                text.pop();
            }),
            KeyCode::Delete => self.edit_selected(String::clear),
            KeyCode::Char('r') | KeyCode::Char('R')
                if self.service.profile().editable_coefficients =>
            {
                self.service.reset_coefficients();
                self.form_state.status =
                    Some(StatusMessage::Info("Coefficients reset to defaults".into()));
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.service.clear_saved();
                self.form_state.status = Some(StatusMessage::Info("Saved data cleared".into()));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => self.export(),
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.form_state.mode = InputMode::ImportPath(String::new());
                self.form_state.status = None;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_import_key(&mut self, key: KeyCode) {
        let InputMode::ImportPath(path) = &mut self.form_state.mode else {
            return;
        };

        match key {
            KeyCode::Esc => {
                self.form_state.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let path = PathBuf::from(path.trim());
                self.form_state.mode = InputMode::Normal;
                self.import(&path);
            }
            KeyCode::Backspace => {
                path.pop();
            }
            KeyCode::Char(c) => path.push(c),
            _ => {}
        }
    }

    /// Apply `edit` to the selected field's text and hand it to the service.
    fn edit_selected(&mut self, edit: impl FnOnce(&mut String)) {
        let key = self.form_state.selected_key();
        let preset = self.service.profile().preset;
        let mut text = self
            .service
            .session()
            .field(preset, key)
            .unwrap_or_default()
            .to_string();
        edit(&mut text);
        self.service.set_field(key, &text);
        self.form_state.status = None;
    }

    fn export(&mut self) {
        self.form_state.status = Some(match self.service.export_to(&self.export_dir) {
            Ok(path) => StatusMessage::Info(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                StatusMessage::Error(format!("Export failed: {e}"))
            }
        });
    }

    fn import(&mut self, path: &Path) {
        self.form_state.status = Some(match self.service.import_file(path) {
            Ok(applied) => StatusMessage::Info(format!("Imported {applied} fields")),
            Err(e) => StatusMessage::Error(format!("Import failed: {e}")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file::EXPORT_FILE_NAME;
    use crate::domain::{Preset, SessionState};
    use ratatui::backend::TestBackend;
    use tempfile::tempdir;

    fn create_test_app(profile: CalculatorProfile, export_dir: &Path) -> App<SqliteStorage> {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let mut service = CalculatorService::new(profile, storage);
        service.initialize();
        App::with_dependencies(service, export_dir.to_path_buf())
    }

    fn press(app: &mut App<SqliteStorage>, keys: &[KeyCode]) {
        for &key in keys {
            app.handle_key(key, KeyModifiers::NONE);
        }
    }

    fn type_text(app: &mut App<SqliteStorage>, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_typing_edits_selected_field() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::nomogram(), dir.path());

        press(&mut app, &[KeyCode::Down, KeyCode::Delete]);
        type_text(&mut app, "4.5a");
        press(&mut app, &[KeyCode::Backspace]);

        assert_eq!(app.service.session().covariates[1], "4.");
        let display = app.service.evaluate();
        assert!((display.result.logit - (-9.079 + 0.934 * 3.0 + 0.099 * 4.0 + 0.131 * 12.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reset_and_clear_keys() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::nomogram(), dir.path());

        // Intercept is the fourth field
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Tab, KeyCode::Delete]);
        type_text(&mut app, "-1");
        assert_eq!(app.service.session().intercept, "-1");

        type_text(&mut app, "r");
        assert_eq!(app.service.session().intercept, "-9.079");

        press(&mut app, &[KeyCode::Up, KeyCode::Delete]);
        type_text(&mut app, "c");
        assert_eq!(app.service.session(), &SessionState::sample(Preset::Primary));
    }

    #[test]
    fn test_export_then_import_prompt() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::nomogram(), dir.path());

        press(&mut app, &[KeyCode::Delete]);
        type_text(&mut app, "2");
        type_text(&mut app, "x");
        assert!(matches!(app.form_state.status, Some(StatusMessage::Info(_))));
        let exported = dir.path().join(EXPORT_FILE_NAME);
        assert!(exported.exists());

        type_text(&mut app, "c");
        assert_eq!(app.service.session().covariates[0], "3");

        type_text(&mut app, "i");
        type_text(&mut app, &exported.display().to_string());
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(app.form_state.mode, InputMode::Normal);
        assert_eq!(app.service.session().covariates[0], "2");
    }

    #[test]
    fn test_import_errors_are_reported() {
        let dir = tempdir().expect("tempdir");
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2, 3]").expect("write");
        let mut app = create_test_app(CalculatorProfile::nomogram(), dir.path());
        let before = app.service.session().clone();

        type_text(&mut app, "i");
        type_text(&mut app, &bad.display().to_string());
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.form_state.status, Some(StatusMessage::Error(_))));
        assert_eq!(app.service.session(), &before);
    }

    #[test]
    fn test_import_prompt_can_be_cancelled() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::nomogram(), dir.path());

        type_text(&mut app, "i12");
        press(&mut app, &[KeyCode::Esc]);

        assert_eq!(app.form_state.mode, InputMode::Normal);
        assert_eq!(app.service.session().covariates[0], "3");
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::quick(), dir.path());
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);

        let mut app = create_test_app(CalculatorProfile::quick(), dir.path());
        type_text(&mut app, "q");
        assert!(app.should_quit);
    }

    #[test]
    fn test_draw_full_frame() {
        let dir = tempdir().expect("tempdir");
        let app = create_test_app(CalculatorProfile::nomogram(), dir.path());
        let mut terminal = Terminal::new(TestBackend::new(120, 45)).expect("terminal");

        app.draw(&mut terminal).expect("draw");

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("2.4%"));
        assert!(text.contains("DISCLAIMER"));
        assert!(text.contains("Coefficients are editable"));
    }

    #[test]
    fn test_fixed_profile_hides_coefficient_controls() {
        let dir = tempdir().expect("tempdir");
        let mut app = create_test_app(CalculatorProfile::quick(), dir.path());
        let mut terminal = Terminal::new(TestBackend::new(120, 45)).expect("terminal");

        type_text(&mut app, "r");
        assert_eq!(app.form_state.status, None);

        app.draw(&mut terminal).expect("draw");
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Coefficients are fixed"));
        assert!(!text.contains("Coefficients are editable"));
        assert!(!text.contains("Reset Coefficients"));
    }
}
