//! Search state and the selection rules that keep districts, schools and the current
//! selection consistent with each other.
//!
//! The coordinator is a plain synchronous state machine. A search is split into
//! `begin_*` (validates the query and issues a [`SearchTicket`]) and `complete_*`
//! (applies the lookup outcome), so callers can run the lookup wherever they like and
//! several lookups can be outstanding at once. `run_*` chains the two for callers that
//! just want to await a [`LookupService`].

mod search_state;

pub use search_state::SearchState;

use crate::error::LookupError;
use crate::lookup::LookupService;
use crate::model::{DistrictRecord, SchoolRecord, SearchDomain, SearchTicket, StaleResponsePolicy};
use tracing::{debug, info, warn};

pub struct SearchCoordinator {
    districts: SearchState<DistrictRecord>,
    schools: SearchState<SchoolRecord>,
    selected_district: Option<String>,
    selected_school: Option<SchoolRecord>,
    stale_policy: StaleResponsePolicy,
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new(StaleResponsePolicy::default())
    }
}

impl SearchCoordinator {
    pub fn new(stale_policy: StaleResponsePolicy) -> Self {
        Self {
            districts: SearchState::default(),
            schools: SearchState::default(),
            selected_district: None,
            selected_school: None,
            stale_policy,
        }
    }

    pub fn districts(&self) -> &SearchState<DistrictRecord> {
        &self.districts
    }

    pub fn schools(&self) -> &SearchState<SchoolRecord> {
        &self.schools
    }

    pub fn selected_district(&self) -> Option<&str> {
        self.selected_district.as_deref()
    }

    pub fn selected_school(&self) -> Option<&SchoolRecord> {
        self.selected_school.as_ref()
    }

    pub fn set_district_query(&mut self, text: impl Into<String>) {
        self.districts.query = text.into();
    }

    pub fn set_school_query(&mut self, text: impl Into<String>) {
        self.schools.query = text.into();
    }

    /// Start a district search. Returns `None` (and touches nothing) for a blank query.
    pub fn begin_district_search(&mut self) -> Option<SearchTicket> {
        let generation = self.districts.begin()?;
        let ticket = SearchTicket {
            domain: SearchDomain::District,
            generation,
            query: self.districts.query.clone(),
            district_id: None,
        };
        info!(query = %ticket.query, generation, "district search started");
        Some(ticket)
    }

    /// Start a school search scoped to whichever district is selected right now.
    pub fn begin_school_search(&mut self) -> Option<SearchTicket> {
        let generation = self.schools.begin()?;
        let ticket = SearchTicket {
            domain: SearchDomain::School,
            generation,
            query: self.schools.query.clone(),
            district_id: self.selected_district.clone(),
        };
        info!(
            query = %ticket.query,
            district = ?ticket.district_id,
            generation,
            "school search started"
        );
        Some(ticket)
    }

    /// Apply a district lookup outcome. Returns whether it changed the result list.
    pub fn complete_district_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<DistrictRecord>, LookupError>,
    ) -> bool {
        if !self.districts.finish(ticket.generation, self.stale_policy) {
            debug!(
                generation = ticket.generation,
                latest = self.districts.latest_generation(),
                "discarding stale district response"
            );
            return false;
        }
        match outcome {
            Ok(records) => {
                info!(count = records.len(), "district search resolved");
                self.districts.replace_results(records);
                self.selected_district = None;
                self.schools.results.clear();
                self.selected_school = None;
                self.enforce_selection_consistency();
                true
            }
            Err(e) => {
                warn!(error = %e, "district search failed");
                self.districts.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Apply a school lookup outcome. Returns whether it changed the result list.
    pub fn complete_school_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<SchoolRecord>, LookupError>,
    ) -> bool {
        if !self.schools.finish(ticket.generation, self.stale_policy) {
            debug!(
                generation = ticket.generation,
                latest = self.schools.latest_generation(),
                "discarding stale school response"
            );
            return false;
        }
        match outcome {
            Ok(records) => {
                info!(count = records.len(), "school search resolved");
                self.schools.replace_results(records);
                self.selected_school = None;
                self.enforce_selection_consistency();
                true
            }
            Err(e) => {
                warn!(error = %e, "school search failed");
                self.schools.last_error = Some(e.to_string());
                false
            }
        }
    }

    pub async fn run_district_search<S>(&mut self, service: &S)
    where
        S: LookupService + ?Sized,
    {
        let Some(ticket) = self.begin_district_search() else {
            return;
        };
        let outcome = service.search_districts(&ticket.query).await;
        self.complete_district_search(&ticket, outcome);
    }

    pub async fn run_school_search<S>(&mut self, service: &S)
    where
        S: LookupService + ?Sized,
    {
        let Some(ticket) = self.begin_school_search() else {
            return;
        };
        let outcome = service
            .search_schools(&ticket.query, ticket.district_id.as_deref())
            .await;
        self.complete_school_search(&ticket, outcome);
    }

    /// Select `id`, or clear the selection when `id` is already selected.
    ///
    /// Selecting a different district drops the school results: they were fetched for
    /// another district context.
    pub fn toggle_district_selection(&mut self, id: &str) {
        if self.selected_district.as_deref() == Some(id) {
            debug!(district = id, "district deselected");
            self.selected_district = None;
        } else {
            debug!(district = id, "district selected");
            self.selected_district = Some(id.to_string());
            self.schools.results.clear();
            self.schools.attempted = false;
            self.selected_school = None;
        }
        self.enforce_selection_consistency();
    }

    pub fn toggle_school_selection(&mut self, record: &SchoolRecord) {
        let same = self
            .selected_school
            .as_ref()
            .is_some_and(|s| s.id == record.id);
        self.selected_school = if same { None } else { Some(record.clone()) };
        self.enforce_selection_consistency();
    }

    /// Schools in the selected district, in lookup order; all schools when none is selected.
    pub fn filtered_schools(&self) -> Vec<&SchoolRecord> {
        match self.selected_district.as_deref() {
            Some(district) => self
                .schools
                .results
                .iter()
                .filter(|s| s.district_id.as_deref() == Some(district))
                .collect(),
            None => self.schools.results.iter().collect(),
        }
    }

    /// Clear the selected school if the current filter no longer shows it.
    pub fn enforce_selection_consistency(&mut self) {
        let Some(selected) = self.selected_school.as_ref() else {
            return;
        };
        let visible = self.filtered_schools().iter().any(|s| s.id == selected.id);
        if !visible {
            debug!(school = %selected.id, "selected school filtered out, clearing");
            self.selected_school = None;
        }
    }

    pub fn selected_district_record(&self) -> Option<&DistrictRecord> {
        let id = self.selected_district.as_deref()?;
        self.districts.results.iter().find(|d| d.id == id)
    }

    /// True while any lookup, in either domain, is outstanding.
    pub fn is_searching(&self) -> bool {
        self.districts.in_flight() || self.schools.in_flight()
    }

    pub fn is_searching_in(&self, domain: SearchDomain) -> bool {
        match domain {
            SearchDomain::District => self.districts.in_flight(),
            SearchDomain::School => self.schools.in_flight(),
        }
    }

    pub fn district_not_found(&self) -> bool {
        self.districts.attempted && !self.is_searching() && self.districts.results.is_empty()
    }

    pub fn school_not_found(&self) -> bool {
        self.schools.attempted && !self.is_searching() && self.filtered_schools().is_empty()
    }
}

#[cfg(test)]
mod tests;
