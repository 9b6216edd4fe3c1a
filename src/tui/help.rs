use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

/// Center a `percent_x` × `height` box inside `area`.
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(rows[1])[1]
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("Esc", 9, "Quit (Ctrl-C anywhere)"),
        keybind("Tab", 9, "Next field / list"),
        keybind("Shift-Tab", 3, "Previous field / list"),
        keybind("F1", 10, "Show this help"),
        Line::from(""),
        Line::from("Search fields:"),
        keybind("Enter", 7, "Run the search"),
        keybind("↓", 11, "Jump to the results"),
        Line::from(""),
        Line::from("Result lists:"),
        keybind("↑/↓ or j/k", 2, "Navigate"),
        keybind("Enter/Space", 1, "Select or deselect"),
        keybind("/", 11, "Back to the search field"),
        keybind("y", 11, "Copy the selected school's map link"),
        keybind("?", 11, "Show this help"),
        keybind("q", 11, "Quit"),
        Line::from(""),
        Line::from("Choosing a district clears the school results; search schools again"),
        Line::from("to look within that district."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));

    let popup = centered(area, 70, 24);
    f.render_widget(Clear, popup);
    f.render_widget(p, popup);
}
