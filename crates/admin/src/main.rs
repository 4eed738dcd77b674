use anyhow::Context;

use pim_admin::app::Catalog;
use pim_admin::import::{ImportFile, run_import};
use pim_infra::CatalogConfig;

const USAGE: &str = "usage: pim-admin <import-file.json>";

fn main() -> anyhow::Result<()> {
    pim_observability::init();

    let path = std::env::args().nth(1).context(USAGE)?;
    let config = CatalogConfig::from_env().context("invalid catalog configuration")?;
    tracing::info!(
        path = %path,
        max_sku_length = config.max_sku_length,
        default_price_type = %config.default_price_type,
        "starting import"
    );

    let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let file: ImportFile =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;

    let catalog = Catalog::build(config);
    let report = run_import(&catalog, file)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failed > 0 {
        anyhow::bail!("{} of {} products failed to import", report.failed, report.outcomes.len());
    }
    Ok(())
}
