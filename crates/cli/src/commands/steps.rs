//! Single orchestrated steps, for running one iteration by hand or from an
//! external state machine. Each reads one JSON event and prints one JSON
//! payload.

use std::path::Path;
use std::sync::Arc;

use tag_inventory_aggregate::{AggregationContext, AggregationPipeline};
use tag_inventory_aws::AwsBackends;
use tag_inventory_core::step::{
    run_merge_step, MergeStepInput, SearchStepInput, SearchStepOutput,
};
use tag_inventory_core::MergeOptions;

use super::{describe_failure, fail, load_config, parse_event, print_payload, read_event, runtime};
use crate::OutputFormat;

static MERGE_INPUT_SCHEMA_STR: &str = include_str!("../../schema/merge-step-input.schema.json");

pub(crate) fn cmd_search(
    event: Option<&Path>,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let input: SearchStepInput = match event {
        Some(path) => parse_event(path, output, quiet),
        None => SearchStepInput::default(),
    };
    let (config, _) = match load_config(config_path, output, quiet).aggregation() {
        Ok(parts) => parts,
        Err(e) => fail(&e.to_string(), output, quiet),
    };

    let rt = runtime(output, quiet);
    let result = rt.block_on(async {
        let aws = AwsBackends::load().await;
        let context = AggregationContext {
            search: Arc::new(aws.search),
            roles: Arc::new(aws.roles),
            objects: Arc::new(aws.connector),
            notifier: Arc::new(aws.notifier),
        };
        AggregationPipeline::new(context, config).search(&input).await
    });
    match result {
        Ok(page) => print_payload(&page, output, quiet),
        Err(e) => fail(&describe_failure(e.to_string(), e.kind()), output, quiet),
    }
}

/// Turn a Search step output into a Merge step input for the same page.
pub(crate) fn cmd_group(event: &Path, output: OutputFormat, quiet: bool) {
    let page: SearchStepOutput = parse_event(event, output, quiet);
    let input = MergeStepInput {
        results: page.grouped(),
        next_token: page.next_token.clone(),
        ..MergeStepInput::default()
    };
    print_payload(&input, output, quiet);
}

pub(crate) fn cmd_merge(
    event: &Path,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let schema: serde_json::Value = match serde_json::from_str(MERGE_INPUT_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => fail(
            &format!("internal error: failed to parse embedded merge schema: {}", e),
            output,
            quiet,
        ),
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => fail(
            &format!("internal error: failed to compile schema: {}", e),
            output,
            quiet,
        ),
    };

    let text = match read_event(event) {
        Ok(text) => text,
        Err(msg) => fail(&msg, output, quiet),
    };
    let doc: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => fail(
            &format!("error parsing JSON in '{}': {}", event.display(), e),
            output,
            quiet,
        ),
    };

    let errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();
    if !errors.is_empty() {
        match output {
            OutputFormat::Text => {
                if !quiet {
                    eprintln!("invalid merge step input");
                    for err in &errors {
                        eprintln!("  - {}", err);
                    }
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({ "valid": false, "errors": errors });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        }
        std::process::exit(1);
    }

    let input: MergeStepInput = match serde_json::from_value(doc) {
        Ok(input) => input,
        Err(e) => fail(
            &format!("invalid merge step input: {}", e),
            output,
            quiet,
        ),
    };
    let options = MergeOptions {
        dedup_by_arn: load_config(config_path, output, quiet)
            .spoke
            .dedup_by_arn
            .unwrap_or(false),
    };
    print_payload(&run_merge_step(input, options), output, quiet);
}
