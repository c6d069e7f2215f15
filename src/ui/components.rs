//! UI components for the TUI.
//!
//! Each component renders from borrowed state only. Transient input state
//! (buffers, highlighting, cursor) lives in [`super::UiState`].

use crate::app::Health;
use crate::document::SUPPORTED_EXTENSIONS;
use crate::summary::{SummaryMode, SummaryResponse};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const PRIMARY: Color = Color::Rgb(0x8B, 0x5C, 0xF6);
pub const SECONDARY: Color = Color::Rgb(0x06, 0xB6, 0xD4);
pub const TEXT: Color = Color::Rgb(0xD4, 0xD4, 0xD8);
pub const MUTED: Color = Color::Rgb(0x71, 0x71, 0x7A);
pub const ERROR: Color = Color::Rgb(0xF8, 0x71, 0x71);
pub const SUCCESS: Color = Color::Rgb(0x4A, 0xDE, 0x80);

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const QUERY_PLACEHOLDER: &str = "Ask a specific question about this document...";

fn panel(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { PRIMARY } else { MUTED }))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
}

/// Title bar with backend status on the right.
pub fn header(frame: &mut Frame, area: Rect, health: &Health) {
    let [left, right] =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(36)]).areas(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Smart Summarizer",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Transform long documents into concise, actionable insights using AI.",
            Style::default().fg(MUTED),
        )),
    ]);
    frame.render_widget(title, left);

    let (dot, label) = match health {
        Health::Unknown => (Style::default().fg(MUTED), "checking service...".to_string()),
        Health::Online(service) => (Style::default().fg(SUCCESS), format!("online · {}", service)),
        Health::Offline(reason) => (Style::default().fg(ERROR), format!("offline · {}", reason)),
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled("● ", dot),
        Span::styled(label, Style::default().fg(MUTED)),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(status, right);
}

/// Path entry for a new document. A pasted path is shown highlighted, the
/// terminal analogue of dragging a file over a drop zone.
pub fn upload_zone(
    frame: &mut Frame,
    area: Rect,
    buffer: &str,
    highlighted: bool,
    error: Option<&str>,
) {
    let border = if highlighted { PRIMARY } else { MUTED };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if highlighted {
            BorderType::Thick
        } else {
            BorderType::Plain
        })
        .border_style(Style::default().fg(border));

    let supported = SUPPORTED_EXTENSIONS
        .iter()
        .map(|e| e.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    let input = if buffer.is_empty() {
        Span::styled("type a path or drop a file here", Style::default().fg(MUTED))
    } else {
        Span::styled(
            format!("{}▏", buffer),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )
    };

    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            "⇪  Upload Document",
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Drag & drop your PDF or text file here",
            Style::default().fg(MUTED),
        )),
        Line::raw(""),
        Line::from(vec![Span::styled("› ", Style::default().fg(PRIMARY)), input]),
        Line::raw(""),
        Line::from(Span::styled(
            format!("SUPPORTED: {}", supported),
            Style::default().fg(MUTED),
        )),
    ];
    if let Some(error) = error {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(error, Style::default().fg(ERROR))));
    }

    let zone = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(zone, area);
}

/// File chip shown when a document is selected but nothing is rendered yet.
pub fn file_chip(frame: &mut Frame, area: Rect, name: &str) {
    let chip = Paragraph::new(Line::from(vec![
        Span::styled(format!("File: {}  ", name), Style::default().fg(MUTED)),
        Span::styled("[Ctrl+R] Remove", Style::default().fg(ERROR)),
    ]))
    .alignment(Alignment::Center)
    .block(panel("Document", false));
    frame.render_widget(chip, area);
}

/// Three mode cards; `cursor` is set while the selector has focus.
pub fn mode_selector(frame: &mut Frame, area: Rect, current: SummaryMode, cursor: Option<usize>) {
    let cells = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);

    for (i, mode) in SummaryMode::ALL.iter().enumerate() {
        let active = *mode == current;
        let under_cursor = cursor == Some(i);

        let border = if under_cursor {
            SECONDARY
        } else if active {
            PRIMARY
        } else {
            MUTED
        };
        let name_style = if active {
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
        };

        let card = Paragraph::new(vec![
            Line::from(Span::styled(format!("{} {}", i + 1, mode.name()), name_style)),
            Line::from(Span::styled(mode.description(), Style::default().fg(MUTED))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(if active {
                    BorderType::Thick
                } else {
                    BorderType::Rounded
                })
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(card, cells[i]);
    }
}

/// Spinner with the processing caption.
pub fn loader(frame: &mut Frame, area: Rect, tick: usize) {
    let spinner = SPINNER[tick % SPINNER.len()];
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{}  {}  {}", spinner, spinner, spinner),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "PROCESSING DOCUMENT...",
            Style::default().fg(MUTED).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(text, middle);
}

/// The generated summary, one paragraph per line.
pub fn summary_view(
    frame: &mut Frame,
    area: Rect,
    summary: &str,
    details: Option<&SummaryResponse>,
    scroll: u16,
) {
    let is_error = summary.starts_with("Error:");
    let mut lines: Vec<Line> = Vec::new();
    for line in summary.split('\n') {
        let style = if is_error {
            Style::default().fg(ERROR)
        } else if line.starts_with("**Q&A Response") {
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT)
        };
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }

    let mut block = panel("Generated Summary", false);
    if let Some(details) = details {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", details.metrics_line()),
            Style::default().fg(MUTED),
        )));
    }

    let view = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(block);
    frame.render_widget(view, area);
}

/// Question input. Submission is disabled while pending or blank.
pub fn query_box(frame: &mut Frame, area: Rect, buffer: &str, pending: bool, focused: bool) {
    let input = if buffer.is_empty() {
        Span::styled(QUERY_PLACEHOLDER, Style::default().fg(MUTED))
    } else {
        Span::styled(buffer.to_string(), Style::default().fg(TEXT))
    };
    let cursor = if focused && !buffer.is_empty() { "▏" } else { "" };

    let send = if pending {
        Span::styled("  ...", Style::default().fg(MUTED))
    } else if buffer.trim().is_empty() {
        Span::styled("  ➤", Style::default().fg(MUTED))
    } else {
        Span::styled("  ➤", Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD))
    };

    let query = Paragraph::new(Line::from(vec![input, Span::raw(cursor), send]))
        .block(panel("Ask", focused));
    frame.render_widget(query, area);
}

/// Blocking alert in a centred popup.
pub fn alert(frame: &mut Frame, area: Rect, message: &str) {
    let popup = centered(area, 50, 7);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(message, Style::default().fg(TEXT))),
        Line::raw(""),
        Line::from(Span::styled("[Enter] OK", Style::default().fg(MUTED))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(ERROR))
            .title(" Alert "),
    );
    frame.render_widget(body, popup);
}

/// Key hints plus an optional notice.
pub fn footer(frame: &mut Frame, area: Rect, hints: &str, notice: Option<&str>) {
    let mut spans = vec![Span::styled(hints.to_string(), Style::default().fg(MUTED))];
    if let Some(notice) = notice {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(notice.to_string(), Style::default().fg(SECONDARY)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
