//! Lookup controller.
//!
//! Runs lookups requested by the UI and emits their outcomes for presentation layers.

use crate::lookup::LookupService;
use crate::model::{AppEvent, InfoEvent, SearchDomain, SearchTicket};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum LookupCommand {
    Search(SearchTicket),
    Quit,
}

/// Run one lookup and wrap its outcome as an event.
async fn run_lookup(service: Arc<dyn LookupService>, ticket: SearchTicket) -> AppEvent {
    match ticket.domain {
        SearchDomain::District => {
            let outcome = service.search_districts(&ticket.query).await;
            AppEvent::DistrictsResolved { ticket, outcome }
        }
        SearchDomain::School => {
            let outcome = service
                .search_schools(&ticket.query, ticket.district_id.as_deref())
                .await;
            AppEvent::SchoolsResolved { ticket, outcome }
        }
    }
}

/// Serve lookup commands until the UI quits.
///
/// Lookups are not cancelled when a newer one starts; completions are forwarded in the
/// order they resolve and the receiver decides what to keep.
pub(crate) async fn run_controller(
    service: Arc<dyn LookupService>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<LookupCommand>,
) -> Result<()> {
    let mut lookups: JoinSet<AppEvent> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LookupCommand::Search(ticket)) => {
                        debug!(domain = ticket.domain.label(), generation = ticket.generation, "spawning lookup");
                        let _ = event_tx.send(AppEvent::Info(InfoEvent::Searching {
                            domain: ticket.domain,
                            query: ticket.query.clone(),
                        }));
                        lookups.spawn(run_lookup(service.clone(), ticket));
                    }
                    Some(LookupCommand::Quit) | None => break,
                }
            }
            // Disabled while nothing is outstanding.
            Some(joined) = lookups.join_next(), if !lookups.is_empty() => {
                match joined {
                    Ok(ev) => {
                        let _ = event_tx.send(ev);
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Info(InfoEvent::Message(format!(
                            "Lookup task failed: {e}"
                        ))));
                    }
                }
            }
        }
    }

    if !lookups.is_empty() {
        info!(outstanding = lookups.len(), "aborting outstanding lookups");
    }
    lookups.shutdown().await;
    Ok(())
}
