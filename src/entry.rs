use clap::{CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::args::BomberArgs;
use crate::config::{RunConfig, apply_config, load_config};
use crate::error::AppResult;
use crate::modules::bulk::BulkExporter;
use crate::modules::geo::GeoEnricher;
use crate::orchestrator::Orchestrator;
use crate::results::ResultSet;

/// Binary entry point: parse arguments, load config, and run every phase.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, or when a run phase fails.
pub fn run() -> AppResult<()> {
    let matches = BomberArgs::command().get_matches();
    let mut args = BomberArgs::from_arg_matches(&matches)?;
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    crate::logger::init_logging(args.debug);
    info!("Starting HTTP Bomber {}", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::from_args(&args).inspect_err(|err| error!("{}", err))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime
        .block_on(run_bomber(config))
        .inspect_err(|err| error!("{}", err))?;
    Ok(())
}

/// Runs the tests described by `config` and every enabled module.
///
/// Geolocation runs before the bulk exporter so exported documents carry enrichment.
///
/// # Errors
///
/// Returns an error when a runner cannot start or a module aborts the run.
pub async fn run_bomber(config: RunConfig) -> AppResult<Vec<ResultSet>> {
    let RunConfig {
        targets,
        bulk,
        geo,
        policy,
        debug,
    } = config;

    let mut orchestrator = Orchestrator::new(targets, debug);
    if let Some(geo) = geo {
        orchestrator.push_module(Box::new(GeoEnricher::new(geo, policy)?));
    }
    if let Some(bulk) = bulk {
        orchestrator.push_module(Box::new(BulkExporter::new(bulk, policy)?));
    }
    info!("Registered modules: {:?}", orchestrator.module_names());

    let result_sets = orchestrator.run().await?;
    let total: usize = result_sets.iter().map(ResultSet::len).sum();
    info!(
        "Finished {} targets with {} captured results",
        result_sets.len(),
        total
    );
    Ok(result_sets)
}
