use std::path::Path;
use std::process;
use std::sync::Arc;

use tag_inventory_aws::AwsBackends;
use tag_inventory_bootstrap::{
    handle_request, CustomResourceRequest, DefaultView, IndexBootstrap, ResponseStatus,
};

use super::{describe_failure, fail, load_config, parse_event, print_payload, runtime};
use crate::OutputFormat;

pub(crate) fn cmd_bootstrap(
    event: Option<&Path>,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let file = load_config(config_path, output, quiet);
    match event {
        Some(path) => {
            let request: CustomResourceRequest = parse_event(path, output, quiet);
            let base = file.bootstrap_defaults();
            let rt = runtime(output, quiet);
            let response = rt.block_on(async {
                let aws = AwsBackends::load().await;
                handle_request(Arc::new(aws.index), &base, &request).await
            });
            // The response is the answer to the deployment; always print it.
            print_payload(&response, output, quiet);
            if response.status == ResponseStatus::Failed {
                process::exit(1);
            }
        }
        None => {
            let config = match file.bootstrap() {
                Ok(config) => config,
                Err(e) => fail(&e.to_string(), output, quiet),
            };
            let rt = runtime(output, quiet);
            let result = rt.block_on(async {
                let aws = AwsBackends::load().await;
                IndexBootstrap::new(Arc::new(aws.index), config).run().await
            });
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => fail(&describe_failure(e.to_string(), e.kind()), output, quiet),
            };
            if quiet {
                return;
            }
            match output {
                OutputFormat::Text => {
                    for (region, arn) in &outcome.indexes {
                        println!("index {}: {}", region, arn);
                    }
                    println!("aggregator: {}", outcome.aggregator_region);
                    println!("view: {}", outcome.view_arn);
                    match &outcome.default_view {
                        DefaultView::AlreadySet(arn) => println!("default view: {} (unchanged)", arn),
                        DefaultView::Associated(arn) => println!("default view: {}", arn),
                        DefaultView::Failed(reason) => {
                            println!("default view: not set ({})", reason)
                        }
                        DefaultView::Skipped => println!("default view: skipped"),
                    }
                }
                OutputFormat::Json => print_payload(&outcome, output, quiet),
            }
        }
    }
}
