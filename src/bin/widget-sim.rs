use anyhow::{Context, Result};
use std::io::Write;
use widget_sync::config::Config;
use widget_sync::host::MemoryHost;
use widget_sync::logging;
use widget_sync::sim::{self, Scenario, SimReport};

fn write_report(out: &mut impl Write, report: &SimReport) -> Result<()> {
    for observation in &report.observations {
        let line = serde_json::to_string(observation).context("Failed to encode observation")?;
        writeln!(out, "{line}")?;
    }
    let summary = serde_json::to_string_pretty(report).context("Failed to encode report")?;
    writeln!(out, "{summary}")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init()?;

    let config = Config::load()?;
    config.validate()?;
    let scenario = Scenario::load(&config.scenario_path)?;

    let host = if config.attach_host {
        MemoryHost::new(config.initial_globals())
    } else {
        MemoryHost::detached()
    };

    let report = sim::run(host, &scenario).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report)
}
