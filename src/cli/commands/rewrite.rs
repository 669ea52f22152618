//! Rewrite command - replay recorded flows through the hooks

use crate::cli::args::RewriteArgs;
use crate::config::Config;
use crate::error::{ProxyError, ProxyResult};
use crate::flow::Flow;
use crate::hooks::{spawn_replay, FlowHook, Rewriter};
use crate::ui::{self, UiContext};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Execute the rewrite command
pub async fn execute(args: RewriteArgs, config: &Config) -> ProxyResult<()> {
    // Every file must parse before any flow is rewritten
    let mut flows = Vec::with_capacity(args.flows.len());
    for path in &args.flows {
        flows.push((path.clone(), load_flow(path).await?));
    }

    let hook: Arc<dyn FlowHook> = Arc::new(Rewriter::from_config(config));
    debug!("Rewriting {} flow(s), {} at a time", flows.len(), args.jobs);

    let rewritten: Vec<(PathBuf, Flow)> = stream::iter(flows)
        .map(|(path, flow)| {
            let hook = hook.clone();
            async move {
                let flow = spawn_replay(hook, flow).await.map_err(|e| {
                    ProxyError::Internal(format!("rewrite task for {} failed: {}", path.display(), e))
                })?;
                Ok::<_, ProxyError>((path, flow))
            }
        })
        .buffered(usize::from(args.jobs))
        .try_collect()
        .await?;

    match args.out {
        Some(dir) => write_flows(&dir, &rewritten).await,
        None => print_flows(&rewritten),
    }
}

async fn load_flow(path: &Path) -> ProxyResult<Flow> {
    let content = fs::read(path)
        .await
        .map_err(|e| ProxyError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_slice(&content).map_err(|e| ProxyError::InvalidFlow {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// One JSON document per line, in input order
fn print_flows(flows: &[(PathBuf, Flow)]) -> ProxyResult<()> {
    for (_, flow) in flows {
        println!("{}", serde_json::to_string(flow)?);
    }
    Ok(())
}

async fn write_flows(dir: &Path, flows: &[(PathBuf, Flow)]) -> ProxyResult<()> {
    let ctx = UiContext::detect();
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ProxyError::io(format!("creating {}", dir.display()), e))?;

    for (path, flow) in flows {
        let name = path
            .file_name()
            .ok_or_else(|| ProxyError::InvalidFlow {
                path: path.clone(),
                reason: "not a file".to_string(),
            })?;
        let target = dir.join(name);
        let content = serde_json::to_string_pretty(flow)?;
        fs::write(&target, content)
            .await
            .map_err(|e| ProxyError::io(format!("writing {}", target.display()), e))?;

        let label = path.display().to_string();
        match (&flow.error, &flow.response) {
            (Some(err), _) => ui::step_error_detail(&ctx, &label, err),
            (None, Some(resp)) => ui::step_ok_detail(
                &ctx,
                &label,
                &format!("{} {} bytes", resp.status_code, resp.body.len()),
            ),
            (None, None) => ui::step_warn_hint(&ctx, &label, "no response recorded"),
        }
    }

    ui::remark(&ctx, &format!("{} flow(s) written to {}", flows.len(), dir.display()));
    Ok(())
}
