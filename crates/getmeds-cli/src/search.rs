//! `getmeds search`: one aggregate search printed as a table or JSON.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use serde::Serialize;

use getmeds_core::{AppConfig, AvailabilityClass, CanonicalResult};
use getmeds_scraper::{Aggregator, ResultFilter, SearchError, SearchSession};

pub(crate) const NO_RESULTS: &str = "Няма намерени резултати";

#[derive(Debug)]
pub(crate) struct SearchArgs {
    pub query: String,
    pub json: bool,
    pub filter: ResultFilter,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput<'a> {
    query: &'a str,
    searched_at: DateTime<Utc>,
    count: usize,
    results: Vec<&'a CanonicalResult>,
}

pub(crate) fn parse_class(raw: &str) -> Result<AvailabilityClass, String> {
    AvailabilityClass::from_name(raw).ok_or_else(|| {
        format!("unknown availability class '{raw}'; expected available, limited, unavailable or unknown")
    })
}

/// The single line shown to the user when a search cannot produce results.
pub(crate) fn user_message(error: &SearchError) -> String {
    match error {
        SearchError::Validation { min_length, .. } => {
            format!("Моля, въведете поне {min_length} символа")
        }
        other => format!("Грешка при търсенето: {other}"),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars).collect::<String>())
    } else {
        value.to_string()
    }
}

pub(crate) fn table_header() -> String {
    format!(
        "{:<12}{:<36}{:<28}{:<16}{:<24}ЦЕНА",
        "ВЕРИГА", "ЛЕКАРСТВО", "АПТЕКА", "ГРАД", "НАЛИЧНОСТ"
    )
}

pub(crate) fn format_row(result: &CanonicalResult) -> String {
    let class = result.stock.availability_class();
    let availability = match class {
        AvailabilityClass::Available | AvailabilityClass::Limited => {
            format!("{} ({})", class.label(), result.stock.quantity())
        }
        _ => class.label().to_string(),
    };
    format!(
        "{:<12}{:<36}{:<28}{:<16}{:<24}{}",
        truncate(&result.retailer, 10),
        truncate(&result.medicine.name, 32),
        truncate(&result.pharmacy.name, 24),
        truncate(result.pharmacy.city.as_deref().unwrap_or("-"), 14),
        availability,
        result.price
    )
}

/// Runs one aggregate search and prints the filtered results.
///
/// Search failures are reported as a single Bulgarian line on stderr and
/// turn into a failing exit code rather than an error.
///
/// # Errors
///
/// Returns an error if the retailer registry cannot be loaded, the
/// aggregator cannot be built, or JSON output fails to serialize.
pub(crate) async fn run_search(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<ExitCode> {
    let registry = getmeds_core::load_retailers(&config.retailers_path)?;
    let aggregator = Aggregator::from_config(config, &registry)
        .map_err(|e| anyhow::anyhow!("failed to build aggregator: {e}"))?;

    let mut session = SearchSession::new();
    if let Err(e) = aggregator.search_into(&mut session, &args.query).await {
        tracing::debug!(error = %e, "search failed");
        eprintln!("{}", user_message(&e));
        return Ok(ExitCode::FAILURE);
    }

    let limit = args.limit.unwrap_or(usize::MAX);
    let results: Vec<&CanonicalResult> = session
        .filter(&args.filter)
        .into_iter()
        .take(limit)
        .collect();

    if args.json {
        let output = SearchOutput {
            query: session.query().unwrap_or(&args.query),
            searched_at: Utc::now(),
            count: results.len(),
            results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(ExitCode::SUCCESS);
    }

    if results.is_empty() {
        println!("{NO_RESULTS}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", table_header());
    for result in &results {
        println!("{}", format_row(result));
    }
    println!();
    println!("{} от {} резултата", results.len(), session.len());

    Ok(ExitCode::SUCCESS)
}
