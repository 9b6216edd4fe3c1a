use crate::coordinator::SearchCoordinator;
use crate::model::{AppEvent, LookupConfig, SearchDomain, SearchTicket};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Which input currently receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    DistrictQuery,
    DistrictResults,
    SchoolQuery,
    SchoolResults,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::DistrictQuery => Focus::DistrictResults,
            Focus::DistrictResults => Focus::SchoolQuery,
            Focus::SchoolQuery => Focus::SchoolResults,
            Focus::SchoolResults => Focus::DistrictQuery,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::DistrictQuery => Focus::SchoolResults,
            Focus::DistrictResults => Focus::DistrictQuery,
            Focus::SchoolQuery => Focus::DistrictResults,
            Focus::SchoolResults => Focus::SchoolQuery,
        }
    }

    pub fn domain(self) -> SearchDomain {
        match self {
            Focus::DistrictQuery | Focus::DistrictResults => SearchDomain::District,
            Focus::SchoolQuery | Focus::SchoolResults => SearchDomain::School,
        }
    }

    pub fn is_query(self) -> bool {
        matches!(self, Focus::DistrictQuery | Focus::SchoolQuery)
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Dispatch(SearchTicket),
    Copy(String),
    Quit,
}

pub struct UiState {
    pub coord: SearchCoordinator,
    pub focus: Focus,
    pub district_cursor: usize,
    pub school_cursor: usize,
    pub show_help: bool,
    pub info: String,
    pub maps_api_key: String,
    pub spinner_tick: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            coord: SearchCoordinator::default(),
            focus: Focus::DistrictQuery,
            district_cursor: 0,
            school_cursor: 0,
            show_help: false,
            info: "Type a district name and press Enter".into(),
            maps_api_key: String::new(),
            spinner_tick: 0,
        }
    }
}

impl UiState {
    pub fn new(cfg: &LookupConfig) -> Self {
        Self {
            coord: SearchCoordinator::new(cfg.stale_policy),
            maps_api_key: cfg.maps_api_key.clone(),
            ..Default::default()
        }
    }

    fn query_mut(&mut self, domain: SearchDomain, edit: impl FnOnce(&mut String)) {
        let mut q = match domain {
            SearchDomain::District => self.coord.districts().query.clone(),
            SearchDomain::School => self.coord.schools().query.clone(),
        };
        edit(&mut q);
        match domain {
            SearchDomain::District => self.coord.set_district_query(q),
            SearchDomain::School => self.coord.set_school_query(q),
        }
    }

    fn trigger_search(&mut self, domain: SearchDomain) -> KeyAction {
        // One search at a time; the coordinator itself would accept overlapping ones.
        if self.coord.is_searching() {
            self.info = "A search is already running…".into();
            return KeyAction::None;
        }
        let ticket = match domain {
            SearchDomain::District => self.coord.begin_district_search(),
            SearchDomain::School => self.coord.begin_school_search(),
        };
        match ticket {
            Some(t) => KeyAction::Dispatch(t),
            None => {
                self.info = format!("Enter a {} name first", domain.label());
                KeyAction::None
            }
        }
    }

    fn result_len(&self, domain: SearchDomain) -> usize {
        match domain {
            SearchDomain::District => self.coord.districts().results.len(),
            SearchDomain::School => self.coord.filtered_schools().len(),
        }
    }

    fn move_cursor(&mut self, domain: SearchDomain, down: bool) {
        let len = self.result_len(domain);
        let cursor = match domain {
            SearchDomain::District => &mut self.district_cursor,
            SearchDomain::School => &mut self.school_cursor,
        };
        if down {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    fn toggle_under_cursor(&mut self, domain: SearchDomain) {
        match domain {
            SearchDomain::District => {
                let Some(id) = self
                    .coord
                    .districts()
                    .results
                    .get(self.district_cursor)
                    .map(|d| d.id.clone())
                else {
                    return;
                };
                self.coord.toggle_district_selection(&id);
                self.info = match self.coord.selected_district_record() {
                    Some(d) => format!("Selected {}; now search for a school", d.name),
                    None => "District cleared".into(),
                };
            }
            SearchDomain::School => {
                let Some(school) = self
                    .coord
                    .filtered_schools()
                    .get(self.school_cursor)
                    .map(|s| (*s).clone())
                else {
                    return;
                };
                self.coord.toggle_school_selection(&school);
                self.info = match self.coord.selected_school() {
                    Some(s) => format!("Selected {}", s.name),
                    None => "School cleared".into(),
                };
            }
        }
        self.clamp_cursors();
    }

    pub fn clamp_cursors(&mut self) {
        let d = self.result_len(SearchDomain::District);
        let s = self.result_len(SearchDomain::School);
        self.district_cursor = self.district_cursor.min(d.saturating_sub(1));
        self.school_cursor = self.school_cursor.min(s.saturating_sub(1));
    }

    pub fn map_url(&self) -> Option<String> {
        self.coord
            .selected_school()
            .map(|s| crate::maps::embed_url(&self.maps_api_key, s))
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> KeyAction {
        if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }
        if self.show_help {
            if matches!(k.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1)) {
                self.show_help = false;
            }
            return KeyAction::None;
        }

        let domain = self.focus.domain();
        match k.code {
            KeyCode::Esc => return KeyAction::Quit,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            _ if self.focus.is_query() => match k.code {
                KeyCode::Enter => return self.trigger_search(domain),
                KeyCode::Backspace => self.query_mut(domain, |q| {
                    q.pop();
                }),
                KeyCode::Down => self.focus = self.focus.next(),
                KeyCode::Char(c) => self.query_mut(domain, |q| q.push(c)),
                _ => {}
            },
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(domain, false),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(domain, true),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_under_cursor(domain),
            KeyCode::Char('/') => self.focus = self.focus.prev(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Char('y') => match self.map_url() {
                Some(url) => return KeyAction::Copy(url),
                None => self.info = "Select a school to copy its map link".into(),
            },
            _ => {}
        }
        KeyAction::None
    }

    pub fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::DistrictsResolved { ticket, outcome } => {
                let failed = outcome.is_err();
                if self.coord.complete_district_search(&ticket, outcome) {
                    self.district_cursor = 0;
                    self.school_cursor = 0;
                    let n = self.coord.districts().results.len();
                    self.info = if n == 0 {
                        "No districts found".into()
                    } else {
                        format!("Found {n} district(s); choose one, then search for a school")
                    };
                } else if failed {
                    self.info = self.coord.districts().last_error.clone().unwrap_or_default();
                }
            }
            AppEvent::SchoolsResolved { ticket, outcome } => {
                let failed = outcome.is_err();
                if self.coord.complete_school_search(&ticket, outcome) {
                    self.school_cursor = 0;
                    self.info = format!("Found {} school(s)", self.coord.filtered_schools().len());
                } else if failed {
                    self.info = self.coord.schools().last_error.clone().unwrap_or_default();
                }
            }
            AppEvent::Info(info) => self.info = info.to_message(),
        }
        self.clamp_cursors();
    }
}
