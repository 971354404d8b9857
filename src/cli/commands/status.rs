//! `flowsmith status` - engine status snapshot.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Table};

use crate::application::Engine;
use crate::domain::models::Config;

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let engine = Engine::from_config(config.clone())
        .await
        .context("failed to initialize engine")?;
    let status = engine.status().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("failed to serialize status")?
        );
        return Ok(());
    }

    let mut agents = Table::new();
    agents.load_preset(UTF8_FULL);
    agents.set_header(vec!["Agent", "Ready"]);
    for agent in &status.agents {
        agents.add_row(vec![
            Cell::new(&agent.name),
            Cell::new(if agent.ready { "yes" } else { "no" }),
        ]);
    }
    println!("{agents}");

    let mut memory = Table::new();
    memory.load_preset(UTF8_FULL);
    memory.set_header(vec!["Memory scope", "Entries"]);
    for scope in &status.memory_scopes {
        memory.add_row(vec![
            Cell::new(&scope.scope),
            Cell::new(scope.entries.to_string()),
        ]);
    }
    println!("{memory}");

    Ok(())
}
