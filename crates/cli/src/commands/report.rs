use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tag_inventory_aws::AwsBackends;
use tag_inventory_report::ReportPipeline;
use tracing::info;

use super::{describe_failure, fail, load_config, print_payload, runtime};
use crate::OutputFormat;

pub(crate) fn cmd_report(
    poll_interval_secs: Option<u64>,
    max_poll_attempts: Option<u32>,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let mut config = match load_config(config_path, output, quiet).report() {
        Ok(config) => config,
        Err(e) => fail(&e.to_string(), output, quiet),
    };
    if let Some(secs) = poll_interval_secs {
        config.poll.interval = Duration::from_secs(secs);
    }
    if let Some(attempts) = max_poll_attempts {
        config.poll.max_attempts = attempts;
    }

    info!(
        database = %config.database,
        work_group = %config.work_group,
        "starting report run"
    );
    let rt = runtime(output, quiet);
    let result = rt.block_on(async {
        let aws = AwsBackends::load().await;
        ReportPipeline::new(Arc::new(aws.query), Arc::new(aws.objects), config)
            .run()
            .await
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => fail(&describe_failure(e.to_string(), e.kind()), output, quiet),
    };
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!(
            "report for {} at s3://{}/{}",
            outcome.date, outcome.report_bucket, outcome.report_key
        ),
        OutputFormat::Json => print_payload(&outcome, output, quiet),
    }
}
