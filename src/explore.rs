//! Interactive terminal browsing.
//!
//! Each line read from stdin selects a station: its facilities are printed
//! at once and the briefing follows when ready. A briefing that finishes
//! after another station was selected is dropped.

use access_tracker::{
    fetch::HttpClient,
    mbta::MbtaClient,
    output::{render_station, render_status},
    reconcile::reconcile_snapshot,
    report::{self, Selection, TextGenerator},
    server::NO_DATA_MESSAGE,
};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Instrument, warn};

type Mbta = Arc<MbtaClient<Box<dyn HttpClient>>>;

const HELP: &str = "Enter a station id or name, 'status' for the summary, 'quit' to exit.";

pub async fn run(mbta: Mbta, reports: Arc<dyn TextGenerator>) -> Result<()> {
    let selection = Arc::new(Selection::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        match query {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "status" => match mbta.fetch_snapshot().await {
                Ok(snapshot) => print!("{}", render_status(&reconcile_snapshot(&snapshot))),
                Err(e) => {
                    warn!(error = %e, "Fetch failed");
                    println!("{NO_DATA_MESSAGE}");
                }
            },
            _ => select(&mbta, &reports, &selection, query).await,
        }
    }

    selection.clear();
    Ok(())
}

async fn select(
    mbta: &Mbta,
    reports: &Arc<dyn TextGenerator>,
    selection: &Arc<Selection>,
    query: &str,
) {
    let snapshot = match mbta.fetch_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "Fetch failed");
            println!("{NO_DATA_MESSAGE}");
            return;
        }
    };
    let view = reconcile_snapshot(&snapshot);
    let Some(station) = view.find_station(query).cloned() else {
        println!("No single station matches '{query}'.");
        return;
    };

    println!("{}", render_station(&view, &station, Utc::now()));
    println!("(generating report...)");

    let ticket = selection.select(&station.id);
    let mbta = mbta.clone();
    let reports = reports.clone();
    let selection = selection.clone();
    let span = tracing::info_span!("explore_report", station_id = %station.id);

    tokio::spawn(
        async move {
            let work = report::station_report(mbta.as_ref(), reports.as_ref(), &view, &station);
            if let Some(outcome) = selection.resolve(&ticket, work).await {
                println!("\n[{}] {}\n", station.name, outcome.display_text());
            }
        }
        .instrument(span),
    );
}
