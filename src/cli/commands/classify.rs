//! Classify command - show how a body would be classified

use crate::cli::args::{ClassifyArgs, OutputFormat};
use crate::classify::{Classifier, Decision, ProcessSyntaxChecker};
use crate::config::Config;
use crate::error::{ProxyError, ProxyResult};
use crate::ui::{self, UiContext};
use std::sync::Arc;
use tokio::fs;

/// Execute the classify command
pub async fn execute(args: ClassifyArgs, config: &Config) -> ProxyResult<()> {
    let body = fs::read(&args.file)
        .await
        .map_err(|e| ProxyError::io(format!("reading {}", args.file.display()), e))?;

    let classifier = Classifier::new(Arc::new(ProcessSyntaxChecker::new(&config.syntax)));
    let decision = classifier
        .classify(&args.url, &body, args.content_type.as_deref())
        .await;

    match args.format {
        OutputFormat::Table => print_decision_table(&decision),
        OutputFormat::Json => print_decision_json(&decision)?,
        OutputFormat::Plain => println!("{}", decision.kind),
    }
    Ok(())
}

fn print_decision_table(decision: &Decision) {
    let ctx = UiContext::detect();
    let declared = if decision.declared.is_empty() {
        "(none)"
    } else {
        decision.declared.as_str()
    };

    ui::key_value(&ctx, "Declared", declared);
    ui::key_value_status(
        &ctx,
        "Kind",
        &decision.kind.to_string(),
        decision.warnings.is_empty(),
    );
    for warning in &decision.warnings {
        ui::step_warn(&ctx, &format!("Body {}", warning));
    }
}

fn print_decision_json(decision: &Decision) -> ProxyResult<()> {
    #[derive(serde::Serialize)]
    struct DecisionJson {
        kind: String,
        declared: String,
        warnings: Vec<String>,
    }

    let json = DecisionJson {
        kind: decision.kind.to_string(),
        declared: decision.declared.clone(),
        warnings: decision.warnings.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
