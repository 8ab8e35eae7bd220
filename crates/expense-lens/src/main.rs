mod bootstrap;
mod report;

use anyhow::{Context, Result};
use lens_core::settings::Settings;
use lens_data::dashboard::{DashboardView, ViewKind};
use lens_data::filter::Facet;
use lens_runtime::orchestrator::ReloadOrchestrator;
use lens_runtime::session::{Session, SessionConfig};
use lens_runtime::source::Source;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Expense Lens v{} starting", env!("CARGO_PKG_VERSION"));

    let data = match &settings.data_file {
        Some(location) => Source::parse(location),
        None => bootstrap::discover_data_path()
            .map(Source::File)
            .context("no expenses file found; pass --data-file or create ./data/expensas.csv")?,
    };
    let view: ViewKind = settings.view.parse()?;

    let mut config = SessionConfig::new(data).with_amount_column(settings.amount_column.clone());
    if let Some(individual) = &settings.individual_file {
        config = config.with_individual(Source::parse(individual));
    }
    tracing::info!(data = %config.data, view = %view, "loading dataset");

    let mut session = Session::new(config)?;
    session.load().await?;
    apply_selection(&mut session, &settings)?;

    print_view(&session.dashboard(view), &settings.format)?;

    if !settings.watch {
        return Ok(());
    }

    tracing::info!(every_secs = settings.refresh_rate, "watching for changes");
    let orchestrator =
        ReloadOrchestrator::new(session, u64::from(settings.refresh_rate), view);
    let (mut rx, handle) = orchestrator.start();

    // The orchestrator reloads immediately; that snapshot repeats the one above.
    let mut skip_initial = true;
    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                if std::mem::take(&mut skip_initial) {
                    continue;
                }
                print_view(&snapshot, &settings.format)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping reload loop");
                break;
            }
        }
    }
    handle.abort();

    Ok(())
}

/// Replace the default selection with whatever the command line asked for.
fn apply_selection(session: &mut Session, settings: &Settings) -> Result<()> {
    if !settings.months.is_empty() {
        session.select_only(Facet::Month, &settings.months)?;
    }
    if let (Some(from), Some(to)) = (&settings.from, &settings.to) {
        session.select_month_range(from, to)?;
    }
    if !settings.categories.is_empty() {
        session.select_only(Facet::Category, &settings.categories)?;
    }
    Ok(())
}

fn print_view(view: &DashboardView, format: &str) -> Result<()> {
    match format {
        "text" => print!("{}", report::render_text(view)),
        _ => println!("{}", serde_json::to_string_pretty(view)?),
    }
    Ok(())
}
