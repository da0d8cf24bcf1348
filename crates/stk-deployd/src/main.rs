mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info};

use stk_core::{
    backoff::{DelayTable, ms_to_time},
    deploy::{DeployOptions, DeploymentOrchestrator, StackReport, TemplateParameterSource},
};
use stk_local::{LocalTemplateParser, SimulatedStackClient};
use stk_observe::{LoggerTimeZone, init_local_offset, init_logger};
use stk_prometheus::PrometheusMetrics;

use crate::config::DeploydConfig;

const DEMO_TEMPLATE: &str = include_str!("../templates/demo.yaml");

fn main() -> anyhow::Result<()> {
    // 1) config
    let cfg = DeploydConfig::load()?;

    // 2) logger; local offset must be read before the runtime spawns threads
    if cfg.logger.tz == LoggerTimeZone::Local {
        init_local_offset();
    }
    let logger = cfg.logger.clone().with_env_level()?;
    init_logger(&logger)?;

    // 3) runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(run(cfg)).inspect_err(|e| error!("{e:#}"))
}

async fn run(cfg: DeploydConfig) -> anyhow::Result<()> {
    let table = DelayTable::worst_case(&cfg.polling.backoff);
    info!(
        algorithm = %cfg.polling.algorithm,
        worst_case = %ms_to_time(table.total(cfg.polling.algorithm)),
        "polling plan\n{table}"
    );

    // template + parameters
    let template = match &cfg.template_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read template {}", path.display()))?,
        None => DEMO_TEMPLATE.to_string(),
    };
    let declared = LocalTemplateParser::new()
        .template_parameters(&template)
        .await
        .context("failed to read template parameters")?;
    let parameters = cfg.resolve_parameters(&declared)?;
    debug!(count = parameters.len(), "parameters resolved");

    // orchestrator over the simulated service
    let metrics = PrometheusMetrics::new()?;
    let client = Arc::new(SimulatedStackClient::new());
    let orchestrator = DeploymentOrchestrator::new(client)
        .with_polling(cfg.polling.clone())
        .with_metrics(Arc::new(metrics.clone()));

    let opts = cfg
        .stack_tags()
        .into_iter()
        .fold(DeployOptions::default(), DeployOptions::with_tag);
    let opts = cfg
        .capabilities
        .iter()
        .cloned()
        .fold(opts, DeployOptions::with_capability);

    // create, then update through the already-exists fallback
    for _ in 0..2 {
        let report = orchestrator
            .deploy(&cfg.stack_name, &template, parameters.clone(), &opts)
            .await?;
        log_report(&report);
    }

    // teardown
    let report = orchestrator.teardown(&cfg.stack_name).await?;
    log_report(&report);

    debug!("metrics\n{}", metrics.encode_text()?);
    Ok(())
}

fn log_report(report: &StackReport) {
    info!(
        operation = %report.kind,
        stack_id = %report.stack_id,
        status = %report.last_status.stack_status,
        "stack operation finished"
    );
}
