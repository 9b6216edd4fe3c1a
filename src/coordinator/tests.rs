use super::*;
use crate::lookup::fake::{district, school, FakeLookup};

fn scenario_district() -> DistrictRecord {
    district("123", "District 1")
}

fn scenario_school() -> SchoolRecord {
    school("789", "School 1", Some("123"))
}

#[tokio::test]
async fn blank_queries_never_reach_the_service() {
    let svc = FakeLookup::with_districts(vec![scenario_district()]);
    let mut c = SearchCoordinator::default();

    for q in ["", "   ", "\t\n"] {
        c.set_district_query(q);
        c.set_school_query(q);
        c.run_district_search(&svc).await;
        c.run_school_search(&svc).await;
    }

    assert_eq!(svc.district_call_count(), 0);
    assert_eq!(svc.school_call_count(), 0);
    assert!(!c.districts().attempted);
    assert!(!c.schools().attempted);
    assert!(c.begin_district_search().is_none());
}

#[tokio::test]
async fn district_search_marks_attempted_and_settles() {
    // Scenario A
    let svc = FakeLookup::with_districts(vec![scenario_district()]);
    let mut c = SearchCoordinator::default();
    c.set_district_query("District");
    c.run_district_search(&svc).await;

    assert_eq!(*svc.district_calls.lock().unwrap(), vec!["District".to_string()]);
    assert_eq!(c.districts().results.len(), 1);
    assert!(c.districts().attempted);
    assert!(!c.is_searching());
    assert!(!c.district_not_found());
}

#[test]
fn in_progress_spans_the_call() {
    let mut c = SearchCoordinator::default();
    c.set_district_query("District");
    let ticket = c.begin_district_search().unwrap();
    assert!(c.is_searching());
    assert!(c.is_searching_in(SearchDomain::District));
    assert!(!c.is_searching_in(SearchDomain::School));

    c.complete_district_search(&ticket, Ok(vec![]));
    assert!(!c.is_searching());
    assert!(c.district_not_found());
}

#[test]
fn district_results_replace_rather_than_merge() {
    let mut c = SearchCoordinator::default();
    c.set_district_query("a");
    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![district("1", "A"), district("2", "AA")]));
    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![district("3", "AAA")]));

    let ids: Vec<_> = c.districts().results.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["3"]);
}

#[test]
fn district_search_resets_district_and_school_state() {
    let mut c = SearchCoordinator::default();
    c.set_district_query("District");
    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![scenario_district()]));
    c.toggle_district_selection("123");

    c.set_school_query("School");
    let t = c.begin_school_search().unwrap();
    c.complete_school_search(&t, Ok(vec![scenario_school()]));
    c.toggle_school_selection(&scenario_school());
    assert!(c.selected_school().is_some());

    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![scenario_district()]));
    assert_eq!(c.selected_district(), None);
    assert!(c.schools().results.is_empty());
    assert_eq!(c.selected_school(), None);
}

#[test]
fn failed_lookup_keeps_previous_results() {
    let mut c = SearchCoordinator::default();
    c.set_district_query("District");
    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![scenario_district()]));

    let t = c.begin_district_search().unwrap();
    let applied = c.complete_district_search(
        &t,
        Err(LookupError::failed(SearchDomain::District, "boom")),
    );

    assert!(!applied);
    assert!(!c.is_searching());
    assert_eq!(c.districts().results, vec![scenario_district()]);
    assert_eq!(
        c.districts().last_error.as_deref(),
        Some("district lookup failed: boom")
    );

    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![]));
    assert_eq!(c.districts().last_error, None);
}

#[tokio::test]
async fn failed_first_search_reads_as_not_found() {
    let svc = FakeLookup::default();
    let mut c = SearchCoordinator::default();
    c.set_school_query("School");
    c.run_school_search(&svc).await;

    assert_eq!(svc.school_call_count(), 1);
    assert!(c.school_not_found());
    assert!(c.schools().last_error.is_some());
}

#[test]
fn selecting_a_district_clears_schools() {
    let mut c = SearchCoordinator::default();
    c.set_school_query("School");
    let t = c.begin_school_search().unwrap();
    c.complete_school_search(&t, Ok(vec![scenario_school(), school("101", "School 2", None)]));
    c.toggle_school_selection(&scenario_school());

    c.toggle_district_selection("123");

    assert!(c.schools().results.is_empty());
    assert!(!c.schools().attempted);
    assert_eq!(c.selected_school(), None);
    assert!(!c.school_not_found());
}

#[test]
fn deselecting_a_district_widens_the_filter() {
    let mut c = SearchCoordinator::default();
    c.toggle_district_selection("123");
    c.set_school_query("School");
    let t = c.begin_school_search().unwrap();
    assert_eq!(t.district_id.as_deref(), Some("123"));
    c.complete_school_search(
        &t,
        Ok(vec![scenario_school(), school("555", "Elsewhere", Some("999"))]),
    );
    assert_eq!(c.filtered_schools().len(), 1);

    c.toggle_district_selection("123");
    assert_eq!(c.selected_district(), None);
    assert_eq!(c.filtered_schools().len(), 2);
}

#[test]
fn toggling_a_district_twice_clears_it() {
    // Scenario B
    let mut c = SearchCoordinator::default();
    c.set_district_query("District");
    let t = c.begin_district_search().unwrap();
    c.complete_district_search(&t, Ok(vec![scenario_district()]));

    c.toggle_district_selection("123");
    assert_eq!(c.selected_district_record(), Some(&scenario_district()));

    c.toggle_district_selection("123");
    assert_eq!(c.selected_district(), None);
    assert_eq!(c.selected_district_record(), None);
}

#[test]
fn switching_districts_selects_the_new_one() {
    let mut c = SearchCoordinator::default();
    c.toggle_district_selection("123");
    c.toggle_district_selection("456");
    assert_eq!(c.selected_district(), Some("456"));
    // Not in the result list, so there is no record to show.
    assert_eq!(c.selected_district_record(), None);
}

#[tokio::test]
async fn school_selection_follows_district_filter() {
    // Scenario C
    let svc = FakeLookup::with_schools(vec![scenario_school()]);
    let mut c = SearchCoordinator::default();
    c.set_school_query("School");
    c.run_school_search(&svc).await;

    assert_eq!(
        *svc.school_calls.lock().unwrap(),
        vec![("School".to_string(), None)]
    );
    assert_eq!(c.filtered_schools().len(), 1);

    c.toggle_school_selection(&scenario_school());
    assert_eq!(c.selected_school(), Some(&scenario_school()));

    c.toggle_district_selection("456");
    assert_eq!(c.selected_school(), None);
}

#[test]
fn toggling_the_same_school_clears_it() {
    let mut c = SearchCoordinator::default();
    c.set_school_query("School");
    let t = c.begin_school_search().unwrap();
    c.complete_school_search(&t, Ok(vec![scenario_school()]));

    c.toggle_school_selection(&scenario_school());
    c.toggle_school_selection(&scenario_school());
    assert_eq!(c.selected_school(), None);
}

#[test]
fn filtered_out_school_cannot_stay_selected() {
    let mut c = SearchCoordinator::default();
    c.toggle_district_selection("123");
    c.set_school_query("School");
    let t = c.begin_school_search().unwrap();
    c.complete_school_search(
        &t,
        Ok(vec![
            school("1", "In", Some("123")),
            school("2", "Out", Some("999")),
            school("3", "Orphan", None),
        ]),
    );

    let names: Vec<_> = c.filtered_schools().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["In"]);

    c.toggle_school_selection(&school("2", "Out", Some("999")));
    assert_eq!(c.selected_school(), None);

    c.toggle_school_selection(&school("1", "In", Some("123")));
    assert_eq!(c.selected_school().map(|s| s.id.as_str()), Some("1"));
}

#[test]
fn school_search_uses_district_selected_at_trigger_time() {
    let mut c = SearchCoordinator::default();
    c.set_school_query("School");
    let ticket = c.begin_school_search().unwrap();
    c.toggle_district_selection("123");
    assert_eq!(ticket.district_id, None);
}

fn race(policy: StaleResponsePolicy) -> SearchCoordinator {
    // Scenario D: the earlier-triggered search resolves last.
    let mut c = SearchCoordinator::new(policy);
    c.set_school_query("first");
    let first = c.begin_school_search().unwrap();
    c.set_school_query("second");
    let second = c.begin_school_search().unwrap();
    assert_eq!(second.query, "second");

    assert!(c.complete_school_search(&second, Ok(vec![school("2", "Second", None)])));
    assert!(c.is_searching());
    c.complete_school_search(&first, Ok(vec![school("1", "First", None)]));
    assert!(!c.is_searching());
    c
}

#[test]
fn last_resolved_response_wins_in_parity_mode() {
    let c = race(StaleResponsePolicy::LastResolvedWins);
    assert_eq!(c.schools().results[0].name, "First");
}

#[test]
fn stale_response_is_discarded_by_default() {
    let c = race(StaleResponsePolicy::Discard);
    assert_eq!(c.schools().results[0].name, "Second");
    assert_eq!(c.schools().latest_generation(), 2);
}

#[test]
fn stale_failure_does_not_record_an_error() {
    let mut c = SearchCoordinator::default();
    c.set_district_query("a");
    let old = c.begin_district_search().unwrap();
    let new = c.begin_district_search().unwrap();
    c.complete_district_search(&new, Ok(vec![district("1", "A")]));
    c.complete_district_search(&old, Err(LookupError::failed(SearchDomain::District, "late")));
    assert_eq!(c.districts().last_error, None);
    assert_eq!(c.districts().results.len(), 1);
}
