use crate::coordinator::SearchCoordinator;
use crate::logging::{init_logging, LogTarget};
use crate::lookup::nces::{NcesClient, DEFAULT_DISTRICTS_URL, DEFAULT_SCHOOLS_URL};
use crate::model::{LookupConfig, StaleResponsePolicy};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "school-data-finder",
    version,
    about = "Search US school districts and schools, with an interactive TUI"
)]
pub struct Cli {
    /// ArcGIS query endpoint for the school district layer
    #[arg(long, env = "SDF_DISTRICTS_URL", default_value = DEFAULT_DISTRICTS_URL)]
    pub districts_url: String,

    /// ArcGIS query endpoint for the school layer
    #[arg(long, env = "SDF_SCHOOLS_URL", default_value = DEFAULT_SCHOOLS_URL)]
    pub schools_url: String,

    /// Google Maps embed API key used for map links
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", default_value = "", hide_env_values = true)]
    pub maps_api_key: String,

    /// Per-request timeout for lookups
    #[arg(long, default_value = "10s")]
    pub timeout: humantime::Duration,

    /// How to treat a response that arrives after a newer search was started
    #[arg(long, value_enum, default_value_t = StaleResponsePolicy::Discard)]
    pub stale_responses: StaleResponsePolicy,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// District name to search for (text/JSON modes)
    #[arg(long)]
    pub district_query: Option<String>,

    /// District LEAID to select after the district search, scoping the school search
    #[arg(long, requires = "district_query")]
    pub district_id: Option<String>,

    /// School name to search for (text/JSON modes)
    #[arg(long)]
    pub school_query: Option<String>,

    /// School NCESSCH to select after the school search (adds a map link)
    #[arg(long, requires = "school_query")]
    pub school_id: Option<String>,

    /// Append logs to this file (the TUI does not log otherwise)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

impl Cli {
    fn is_one_shot(&self) -> bool {
        self.json || self.text
    }
}

/// Build a `LookupConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> LookupConfig {
    LookupConfig {
        districts_url: args.districts_url.clone(),
        schools_url: args.schools_url.clone(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("school-data-finder/{}", env!("CARGO_PKG_VERSION")),
        maps_api_key: args.maps_api_key.clone(),
        stale_policy: args.stale_responses,
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }

    let log_target = match (&args.log_file, args.is_one_shot()) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::Off,
    };
    init_logging(log_target)?;

    if !args.is_one_shot() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            return Err(anyhow::anyhow!(
                "built without TUI support; use --text or --json"
            ));
        }
    }

    run_once(args).await
}

/// Run the requested searches in order, then print the resulting state.
async fn run_once(args: Cli) -> Result<()> {
    if args.district_query.is_none() && args.school_query.is_none() {
        return Err(anyhow::anyhow!(
            "--text/--json need --district-query and/or --school-query"
        ));
    }

    let cfg = build_config(&args);
    let client = NcesClient::new(&cfg).context("create lookup client")?;
    let mut coord = SearchCoordinator::new(cfg.stale_policy);
    let (out_tx, out_handle) = spawn_output_writer();

    if let Some(q) = args.district_query.as_deref() {
        coord.set_district_query(q);
        coord.run_district_search(&client).await;
        if let Some(id) = args.district_id.as_deref() {
            coord.toggle_district_selection(id);
            if coord.selected_district_record().is_none() {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "District {id} is not among the district results"
                )));
            }
        }
    }

    if let Some(q) = args.school_query.as_deref() {
        coord.set_school_query(q);
        coord.run_school_search(&client).await;
        if let Some(id) = args.school_id.as_deref() {
            let found = coord
                .filtered_schools()
                .into_iter()
                .find(|s| s.id == id)
                .cloned();
            match found {
                Some(school) => coord.toggle_school_selection(&school),
                None => {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "School {id} is not among the school results"
                    )));
                }
            }
        }
    }

    let snapshot = crate::text_summary::build_snapshot(&coord, &cfg.maps_api_key);
    info!(
        districts = snapshot.districts.len(),
        schools = snapshot.schools.len(),
        "searches finished"
    );

    if args.json {
        let out = serde_json::to_string_pretty(&snapshot)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(
            &snapshot,
            coord.districts().attempted,
            coord.schools().attempted,
        );
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    if !snapshot.errors.is_empty() {
        return Err(anyhow::anyhow!(snapshot.errors.join("; ")));
    }
    Ok(())
}
