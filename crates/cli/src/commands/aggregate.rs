use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tag_inventory_aggregate::{
    AggregationContext, AggregationPipeline, LocalOrchestrator, Orchestrator, RunRequest,
};
use tag_inventory_aws::AwsBackends;
use tag_inventory_core::RunDate;
use tracing::info;

use super::{describe_failure, fail, load_config, print_payload, runtime};
use crate::checkpoint_file::FileCheckpoints;
use crate::OutputFormat;

pub(crate) struct AggregateArgs {
    pub run_id: Option<String>,
    pub date: Option<RunDate>,
    pub checkpoint: Option<PathBuf>,
    pub resume: bool,
}

pub(crate) fn cmd_aggregate(
    args: AggregateArgs,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let (config, retry) = match load_config(config_path, output, quiet).aggregation() {
        Ok(parts) => parts,
        Err(e) => fail(&e.to_string(), output, quiet),
    };

    let checkpoints = args.checkpoint.map(FileCheckpoints::new);
    let resume = match (&checkpoints, args.resume) {
        (Some(sink), true) => match sink.load() {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => fail(
                &format!(
                    "cannot resume from '{}': {}",
                    sink.path().display(),
                    e
                ),
                output,
                quiet,
            ),
        },
        _ => None,
    };

    // A resumed run keeps its identity unless told otherwise.
    let run_id = args
        .run_id
        .or_else(|| resume.as_ref().map(|c| c.run_id.clone()))
        .unwrap_or_else(generated_run_id);
    let date = args
        .date
        .or_else(|| resume.as_ref().map(|c| c.date))
        .unwrap_or_else(RunDate::today);
    info!(run_id = %run_id, date = %date, resumed = resume.is_some(), "starting aggregation run");
    let mut request = RunRequest::new(run_id, date);
    if let Some(checkpoint) = resume {
        request = request.resuming(checkpoint);
    }

    let rt = runtime(output, quiet);
    let result = rt.block_on(async {
        let aws = AwsBackends::load().await;
        let context = AggregationContext {
            search: Arc::new(aws.search),
            roles: Arc::new(aws.roles),
            objects: Arc::new(aws.connector),
            notifier: Arc::new(aws.notifier),
        };
        let mut orchestrator =
            LocalOrchestrator::new(AggregationPipeline::new(context, config)).with_retry(retry);
        if let Some(sink) = checkpoints {
            orchestrator = orchestrator.with_checkpoints(Arc::new(sink));
        }
        orchestrator.run(request).await
    });

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => fail(&describe_failure(e.to_string(), e.kind()), output, quiet),
    };
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            println!(
                "wrote s3://{}/{} ({} tag groups, {} pages)",
                summary.written.bucket,
                summary.written.key,
                summary.written.tag_groups,
                summary.pages
            );
            if let Some(id) = &summary.message_id {
                println!("notified: {}", id);
            }
        }
        OutputFormat::Json => print_payload(&summary, output, quiet),
    }
}

fn generated_run_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("run-{}", millis)
}
