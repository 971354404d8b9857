//! `flowsmith run` - execute one goal through the pipeline.

use anyhow::{Context, Result};
use clap::Args;

use crate::application::Engine;
use crate::domain::models::{Config, PipelineResult};

#[derive(Args)]
pub struct RunArgs {
    /// The automation goal, in natural language
    pub goal: String,
}

pub async fn execute(args: RunArgs, config: &Config, json: bool) -> Result<()> {
    let engine = Engine::from_config(config.clone())
        .await
        .context("failed to initialize engine")?;

    let result = engine.run_goal(&args.goal).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("failed to serialize result")?
        );
    } else {
        print_result(&result);
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_result(result: &PipelineResult) {
    if result.success {
        println!("Pipeline succeeded ({} ms)", result.stats.total_duration_ms);
    } else {
        println!("Pipeline failed ({} ms)", result.stats.total_duration_ms);
    }

    if let Some(pattern) = &result.pattern {
        println!(
            "  pattern: {} (confidence {:.2})",
            pattern.name, pattern.confidence
        );
    }
    if let Some(workflow) = &result.workflow {
        println!(
            "  workflow: {} ({} nodes, {} connections)",
            workflow.name,
            workflow.nodes.len(),
            workflow.connections.len()
        );
    }
    if let Some(validation) = &result.validation {
        match validation.failed_layer {
            Some(layer) => println!("  validation: failed at layer {layer}"),
            None => println!(
                "  validation: passed ({} layers, {} skipped)",
                validation.passed_layers.len(),
                validation.skipped_layers.len()
            ),
        }
        for error in &validation.errors {
            println!("    [{}] {}", error.code, error.message);
            for (blocked, alternatives) in &error.alternatives {
                println!("      {blocked} -> try: {}", alternatives.join(", "));
            }
        }
        for warning in &validation.warnings {
            println!("    warning [{}] {}", warning.code, warning.message);
        }
    }
    for error in &result.errors {
        println!("  error in {}: {}", error.stage, error.message);
    }
}
