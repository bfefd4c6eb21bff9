//! Calculator screen: input form and nomogram panel.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::{CalculatorProfile, DisplayState, SessionState, INTERCEPT_KEY};
use crate::tui::styles::MedicalTheme;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub key: &'static str,
    pub label: String,
    pub hint: &'static str,
}

/// What typed characters go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Editing the selected field
    Normal,
    /// Typing the path of a document to import
    ImportPath(String),
}

/// One-line feedback shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Calculator form state
pub struct CalculatorFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub mode: InputMode,
    pub status: Option<StatusMessage>,
}

impl CalculatorFormState {
    /// Fields shown for a profile: covariates, then the model when editable.
    #[must_use]
    pub fn for_profile(profile: &CalculatorProfile) -> Self {
        let covariates = profile.preset.covariates();

        let mut fields: Vec<FormField> = covariates
            .iter()
            .map(|spec| FormField {
                key: spec.key,
                label: spec.label.to_string(),
                hint: spec.hint,
            })
            .collect();

        if profile.editable_coefficients {
            fields.push(FormField {
                key: INTERCEPT_KEY,
                label: "Intercept".to_string(),
                hint: "model constant",
            });
            fields.extend(covariates.iter().map(|spec| FormField {
                key: spec.coefficient_key,
                label: format!("β {}", spec.label),
                hint: "coefficient",
            }));
        }

        Self {
            fields,
            selected_field: 0,
            mode: InputMode::Normal,
            status: None,
        }
    }

    /// Record key of the selected field
    #[must_use]
    pub fn selected_key(&self) -> &'static str {
        self.fields[self.selected_field].key
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Characters accepted in numeric fields
    #[must_use]
    pub fn accepts(c: char) -> bool {
        c.is_ascii_digit() || c == '.' || c == '-'
    }
}

/// Render the calculator screen
pub fn render_calculator(
    f: &mut Frame,
    area: Rect,
    state: &CalculatorFormState,
    profile: &CalculatorProfile,
    session: &SessionState,
    display: &DisplayState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + nomogram
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], profile);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_form_fields(f, body[0], state, profile, session);
    render_nomogram(f, body[1], display);
    render_footer(f, chunks[2], state, profile);
}

fn render_header(f: &mut Frame, area: Rect, profile: &CalculatorProfile) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Nomogram Calculator", MedicalTheme::title()),
        Span::styled(
            format!(" │ {}", profile.preset.description()),
            MedicalTheme::text_secondary(),
        ),
        Span::styled(
            format!(" │ profile: {}", profile.name),
            MedicalTheme::text_muted(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(
    f: &mut Frame,
    area: Rect,
    state: &CalculatorFormState,
    profile: &CalculatorProfile,
    session: &SessionState,
) {
    let constraints: Vec<Constraint> = state
        .fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    let editing = state.mode == InputMode::Normal;

    for (i, field) in state.fields.iter().enumerate() {
        let is_selected = editing && i == state.selected_field;
        let border_style = if is_selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        };

        let title_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value = session.field(profile.preset, field.key).unwrap_or("");
        let value_display = if value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else {
            Span::styled(value, MedicalTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", MedicalTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

/// Gauge ratio for a width in `[0, 100]`; non-finite widths draw empty.
fn gauge_ratio(width: f64) -> f64 {
    if width.is_finite() {
        (width / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn render_nomogram(f: &mut Frame, area: Rect, display: &DisplayState) {
    let block = Block::default()
        .title(Span::styled(" Nomogram ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let has_bars = display.total_bar_width.is_some();
    let term_rows = if has_bars {
        (display.terms.len() + 1) * 3
    } else {
        display.terms.len() + 2
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::try_from(term_rows).unwrap_or(u16::MAX)),
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Logit
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    if has_bars {
        render_contribution_bars(f, chunks[0], display);
    } else {
        render_contribution_table(f, chunks[0], display);
    }

    let percent = display.probability_percent();
    let probability = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::probability(percent))
        .ratio(gauge_ratio(percent))
        .label(display.probability_text());
    f.render_widget(probability, chunks[1]);

    let logit = Paragraph::new(Line::from(vec![
        Span::styled(" Logit: ", MedicalTheme::text_secondary()),
        Span::styled(display.logit_text(), MedicalTheme::text()),
    ]));
    f.render_widget(logit, chunks[2]);
}

fn render_contribution_bars(f: &mut Frame, area: Rect, display: &DisplayState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); display.terms.len() + 1])
        .split(area);

    for (i, term) in display.terms.iter().enumerate() {
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" {} ", term.label),
                        MedicalTheme::text_secondary(),
                    ))
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            )
            .gauge_style(MedicalTheme::contribution(term.contribution))
            .ratio(gauge_ratio(term.bar_width.unwrap_or(50.0)))
            .label(display.contribution_text(term));
        f.render_widget(gauge, rows[i]);
    }

    let total = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Total (logit) ", MedicalTheme::focused()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        )
        .gauge_style(MedicalTheme::contribution(display.result.logit))
        .ratio(gauge_ratio(display.total_bar_width.unwrap_or(50.0)))
        .label(display.total_text());
    f.render_widget(total, rows[display.terms.len()]);
}

fn render_contribution_table(f: &mut Frame, area: Rect, display: &DisplayState) {
    let mut lines: Vec<Line> = display
        .terms
        .iter()
        .map(|term| {
            Line::from(vec![
                Span::styled(format!(" {:<20}", term.label), MedicalTheme::text_secondary()),
                Span::styled(display.contribution_text(term), MedicalTheme::text()),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<20}", "Total"), MedicalTheme::focused()),
        Span::styled(display.total_text(), MedicalTheme::text()),
    ]));

    f.render_widget(Paragraph::new(lines), area);
}

fn render_footer(
    f: &mut Frame,
    area: Rect,
    state: &CalculatorFormState,
    profile: &CalculatorProfile,
) {
    let first = match &state.mode {
        InputMode::ImportPath(path) => Line::from(vec![
            Span::styled("Import file: ", MedicalTheme::focused()),
            Span::styled(path.clone(), MedicalTheme::text()),
            Span::styled("▌ ", MedicalTheme::cursor()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Import ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ]),
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled("[↑↓] ", MedicalTheme::key_hint()),
                Span::styled("Navigate ", MedicalTheme::key_desc()),
            ];
            if profile.editable_coefficients {
                hints.push(Span::styled("[R] ", MedicalTheme::key_hint()));
                hints.push(Span::styled("Reset Coefficients ", MedicalTheme::key_desc()));
            }
            hints.extend([
                Span::styled("[C] ", MedicalTheme::key_hint()),
                Span::styled("Clear Saved ", MedicalTheme::key_desc()),
                Span::styled("[X] ", MedicalTheme::key_hint()),
                Span::styled("Export ", MedicalTheme::key_desc()),
                Span::styled("[I] ", MedicalTheme::key_hint()),
                Span::styled("Import ", MedicalTheme::key_desc()),
                Span::styled("[Q] ", MedicalTheme::key_hint()),
                Span::styled("Quit", MedicalTheme::key_desc()),
            ]);
            Line::from(hints)
        }
    };

    let mut lines = vec![first];
    match &state.status {
        Some(StatusMessage::Info(msg)) => {
            lines.push(Line::from(Span::styled(msg.clone(), MedicalTheme::success())));
        }
        Some(StatusMessage::Error(msg)) => lines.push(Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(msg.clone(), MedicalTheme::danger()),
        ])),
        None => {}
    }

    let footer = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
