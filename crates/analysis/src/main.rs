use analysis::{
    crosstab_state_vs_group, load_records_from_path, pairwise_posthoc, recompute_open_wait,
    render_report, summarize_by_group, test_group_wait_equality, Report,
};
use anyhow::{Context, Result};
use chrono::Local;
use common::{config::AppConfig, logging};
use tracing::info;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.observability.log_level);
    let settings = &config.analyzer;
    let group = settings.group_column.as_str();
    let value = settings.value_column.as_str();

    let mut records = load_records_from_path(&settings.input_path, group, value)
        .with_context(|| format!("loading {}", settings.input_path))?;

    let as_of = settings.as_of.unwrap_or_else(|| Local::now().date_naive());
    recompute_open_wait(&mut records, as_of);
    info!(%as_of, rows = records.len(), "recomputed open waiting times");

    let summaries = summarize_by_group(&records, group, value)?;
    let crosstab = crosstab_state_vs_group(&records, group)?;
    let kruskal = test_group_wait_equality(&records, group, value)?;
    let dunn = pairwise_posthoc(&records, group, value, settings.p_adjust)?;
    info!(
        groups = kruskal.groups,
        observations = kruskal.observations,
        "compared open requests"
    );

    print!(
        "{}",
        render_report(&Report {
            as_of,
            group_column: group,
            value_column: value,
            summaries: &summaries,
            crosstab: &crosstab,
            kruskal: &kruskal,
            dunn: &dunn,
        })
    );
    Ok(())
}
