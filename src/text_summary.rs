//! Snapshot and text summary builders for one-shot CLI output.

use crate::coordinator::SearchCoordinator;
use crate::model::SearchSnapshot;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Capture the coordinator's current state; schools are listed after district filtering.
pub(crate) fn build_snapshot(coord: &SearchCoordinator, maps_api_key: &str) -> SearchSnapshot {
    let errors = [&coord.districts().last_error, &coord.schools().last_error]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    SearchSnapshot {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        district_query: coord.districts().query.clone(),
        school_query: coord.schools().query.clone(),
        districts: coord.districts().results.clone(),
        schools: coord.filtered_schools().into_iter().cloned().collect(),
        selected_district: coord.selected_district_record().cloned(),
        selected_school: coord.selected_school().cloned(),
        map_url: coord
            .selected_school()
            .map(|s| crate::maps::embed_url(maps_api_key, s)),
        errors,
    }
}

pub(crate) fn build_text_summary(
    snapshot: &SearchSnapshot,
    district_attempted: bool,
    school_attempted: bool,
) -> TextSummary {
    let mut lines = Vec::new();

    if district_attempted {
        lines.push(format!("Districts matching \"{}\":", snapshot.district_query));
        if snapshot.districts.is_empty() {
            lines.push("  No districts found matching your search.".into());
        }
        for d in &snapshot.districts {
            let mark = match &snapshot.selected_district {
                Some(sel) if sel.id == d.id => "*",
                _ => " ",
            };
            lines.push(format!("{mark} [{}] {} ({})", d.id, d.name, d.locality()));
        }
    }

    if school_attempted {
        lines.push(format!("Schools matching \"{}\":", snapshot.school_query));
        if snapshot.schools.is_empty() {
            lines.push("  No schools found matching your search.".into());
        }
        for s in &snapshot.schools {
            lines.push(format!("  [{}] {} ({})", s.id, s.name, s.address()));
        }
    }

    if let Some(d) = &snapshot.selected_district {
        lines.push(format!("Selected district: {} ({})", d.name, d.locality()));
    }
    if let Some(s) = &snapshot.selected_school {
        lines.push(format!("Selected school: {} ({})", s.name, s.address()));
    }
    if let Some(url) = &snapshot.map_url {
        lines.push(format!("Map: {url}"));
    }
    for e in &snapshot.errors {
        lines.push(format!("Error: {e}"));
    }

    TextSummary { lines }
}
