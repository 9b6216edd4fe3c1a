use super::state::{Focus, UiState};
use crate::model::SearchDomain;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ACCENT: Color = Color::Green;

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(ACCENT)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
}

fn query_line(label: &str, query: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(query.to_string()),
    ];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    } else if query.is_empty() {
        spans.push(Span::styled(
            format!("Enter {} name", label.to_lowercase()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn search_button(state: &UiState, domain: SearchDomain, caption: &str) -> Line<'static> {
    if state.coord.is_searching_in(domain) {
        let frame = SPINNER[state.spinner_tick % SPINNER.len()];
        Line::from(Span::styled(
            format!("[ {frame} Searching… ]"),
            Style::default().fg(Color::Magenta),
        ))
    } else if state.coord.is_searching() {
        Line::from(Span::styled(
            format!("[ {caption} ]"),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            format!("[ {caption} ]  (Enter)"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    }
}

fn result_item(checked: bool, title: &str, detail: String) -> ListItem<'static> {
    let mark = if checked { "[x] " } else { "[ ] " };
    ListItem::new(vec![
        Line::from(vec![
            Span::raw(mark),
            Span::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(
            format!("    {detail}"),
            Style::default().fg(Color::Gray),
        )),
    ])
}

/// Rows for the query, the search button, the status message and the result list.
fn split_search_panel(inner: Rect) -> [Rect; 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    [rows[0], rows[1], rows[2], rows[3]]
}

fn render_list(
    f: &mut Frame,
    area: Rect,
    items: Vec<ListItem<'static>>,
    cursor: usize,
    focused: bool,
) {
    let highlight = if focused {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default()
    };
    let list = List::new(items).highlight_style(highlight);
    let mut ls = ListState::default().with_selected(Some(cursor));
    f.render_stateful_widget(list, area, &mut ls);
}

pub fn draw_district_panel(area: Rect, f: &mut Frame, state: &UiState) {
    let focused = state.focus.domain() == SearchDomain::District;
    let block = panel_block("Search for a District", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let [q, btn, msg, list] = split_search_panel(inner);

    let districts = &state.coord.districts().results;
    f.render_widget(
        Paragraph::new(query_line(
            "District",
            &state.coord.districts().query,
            state.focus == Focus::DistrictQuery,
        )),
        q,
    );
    f.render_widget(
        Paragraph::new(search_button(state, SearchDomain::District, "Search Districts")),
        btn,
    );

    let message = if state.coord.district_not_found() {
        Some(Span::styled(
            "No districts found matching your search.",
            Style::default().fg(Color::Red),
        ))
    } else if !districts.is_empty() {
        Some(Span::styled(
            "Please choose a district, then search for a school",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
    } else {
        None
    };
    if let Some(m) = message {
        f.render_widget(Paragraph::new(Line::from(m)), msg);
    }

    let selected = state.coord.selected_district();
    let items = districts
        .iter()
        .map(|d| result_item(selected == Some(d.id.as_str()), &d.name, d.locality()))
        .collect();
    render_list(
        f,
        list,
        items,
        state.district_cursor,
        state.focus == Focus::DistrictResults,
    );
}

pub fn draw_school_panel(area: Rect, f: &mut Frame, state: &UiState) {
    let focused = state.focus.domain() == SearchDomain::School;
    let title = match state.coord.selected_district_record() {
        Some(d) => format!("Search for a School in {}", d.name),
        None => "Search for a School".to_string(),
    };
    let block = panel_block(&title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let [q, btn, msg, list] = split_search_panel(inner);

    f.render_widget(
        Paragraph::new(query_line(
            "School",
            &state.coord.schools().query,
            state.focus == Focus::SchoolQuery,
        )),
        q,
    );
    f.render_widget(
        Paragraph::new(search_button(state, SearchDomain::School, "Search Schools")),
        btn,
    );
    if state.coord.school_not_found() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No schools found matching your search.",
                Style::default().fg(Color::Red),
            ))),
            msg,
        );
    }

    let selected = state.coord.selected_school().map(|s| s.id.as_str());
    let items = state
        .coord
        .filtered_schools()
        .into_iter()
        .map(|s| result_item(selected == Some(s.id.as_str()), &s.name, s.address()))
        .collect();
    render_list(
        f,
        list,
        items,
        state.school_cursor,
        state.focus == Focus::SchoolResults,
    );
}

pub fn draw_details_panel(area: Rect, f: &mut Frame, state: &UiState) {
    let district = state.coord.selected_district_record();
    let school = state.coord.selected_school();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    if district.is_none() && school.is_none() {
        lines.push(Line::from(Span::styled(
            "Please choose a district or a school to see results.",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    if let Some(d) = district {
        lines.push(Line::from(Span::styled(d.name.clone(), bold)));
        lines.push(Line::from(d.locality()));
        lines.push(Line::from(Span::styled(
            format!("LEAID {}", d.id),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }
    if let (Some(s), Some(url)) = (school, state.map_url()) {
        lines.push(Line::from(Span::styled(s.name.clone(), bold)));
        lines.push(Line::from(s.address()));
        lines.push(Line::from(Span::styled(
            format!("NCESSCH {}", s.id),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Map", Style::default().fg(Color::Gray)),
            Span::raw(" (y to copy):"),
        ]));
        lines.push(Line::from(Span::styled(url, Style::default().fg(Color::Cyan))));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel_block("Selected Details", false));
    f.render_widget(p, area);
}

pub fn draw_status(area: Rect, f: &mut Frame, state: &UiState) {
    let hints = "Tab focus · Enter search/select · ↑/↓ move · y copy map · F1 help · Esc quit";
    let p = Paragraph::new(vec![
        Line::from(state.info.clone()),
        Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}
