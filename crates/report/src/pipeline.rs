use std::sync::Arc;

use serde::Serialize;
use tag_inventory_core::{report_object_key, RunDate};
use tag_inventory_storage::{ObjectStore, ObjectStoreError, QueryEngine};
use tracing::{info, warn};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::location::S3Location;
use crate::poll::{run_job, CompletedJob};
use crate::statements::ReportStatements;
use crate::step::ReportStep;

/// Where the report date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Latest `d` partition of the inventory.
    Partition,
    /// The inventory had no partition yet; today's date was used.
    Today,
}

/// What a finished report run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
    pub date: RunDate,
    pub date_source: DateSource,
    pub report_bucket: String,
    pub report_key: String,
    /// Scratch data file the report was copied from (since deleted).
    pub data_file: String,
    /// Execution id per submitted statement, in order.
    pub executions: Vec<(String, String)>,
}

/// The report query pipeline.
///
/// Strictly sequential: one job at a time, each gated on the previous one
/// succeeding. Nothing is cleaned up on failure; the next run's first
/// `DropScratchTable` removes a leftover scratch table.
pub struct ReportPipeline {
    engine: Arc<dyn QueryEngine>,
    objects: Arc<dyn ObjectStore>,
    config: ReportConfig,
    statements: ReportStatements,
}

impl ReportPipeline {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        objects: Arc<dyn ObjectStore>,
        config: ReportConfig,
    ) -> Self {
        let statements = ReportStatements::new(&config);
        ReportPipeline {
            engine,
            objects,
            config,
            statements,
        }
    }

    async fn job(
        &self,
        step: ReportStep,
        query: &str,
        executions: &mut Vec<(String, String)>,
    ) -> Result<CompletedJob, ReportError> {
        let job = run_job(
            self.engine.as_ref(),
            step,
            query,
            &self.config.work_group,
            self.config.poll,
        )
        .await?;
        executions.push((step.to_string(), job.execution_id.clone()));
        Ok(job)
    }

    pub async fn run(&self) -> Result<ReportOutcome, ReportError> {
        let s = &self.statements;
        let mut executions = Vec::new();

        self.job(ReportStep::DropScratchTable, &s.drop_scratch_table(), &mut executions)
            .await?;
        self.job(ReportStep::LoadPartitions, &s.load_partitions(), &mut executions)
            .await?;
        self.job(ReportStep::CreateExternalTable, &s.create_inventory_table(), &mut executions)
            .await?;
        self.job(ReportStep::UpdateExternalTable, &s.update_inventory_table(), &mut executions)
            .await?;
        self.job(ReportStep::CreateLatestView, &s.create_latest_view(), &mut executions)
            .await?;
        self.job(ReportStep::CreateTopTenView, &s.create_top_ten_view(), &mut executions)
            .await?;
        self.job(
            ReportStep::CreateTaggedVsUntaggedView,
            &s.create_tagged_vs_untagged_view(),
            &mut executions,
        )
        .await?;

        let (date, date_source) = self.read_max_date(&mut executions).await?;
        info!(date = %date, source = ?date_source, "report date resolved");

        let csv = self
            .job(
                ReportStep::CreateCsvResultTable,
                &s.create_csv_result_table(&date),
                &mut executions,
            )
            .await?;
        let manifest: S3Location = csv
            .status
            .manifest_location
            .as_deref()
            .ok_or(ReportError::ManifestMissing)?
            .parse()?;
        let data_file = self.extract_data_file(&manifest).await?;

        let report_key = report_object_key(&date.to_string());
        self.objects
            .copy(
                &data_file.bucket,
                &data_file.key,
                &self.config.report_bucket,
                &report_key,
            )
            .await
            .map_err(|source| ReportError::Storage {
                step: ReportStep::CopyResultObject,
                source,
            })?;
        info!(
            from = %data_file,
            bucket = %self.config.report_bucket,
            key = %report_key,
            "report copied"
        );

        self.delete_scratch(&data_file, &manifest, &date).await?;

        self.job(
            ReportStep::FinalDropScratchTable,
            &s.drop_scratch_table(),
            &mut executions,
        )
        .await?;

        Ok(ReportOutcome {
            date,
            date_source,
            report_bucket: self.config.report_bucket.clone(),
            report_key,
            data_file: data_file.to_string(),
            executions,
        })
    }

    /// Latest partition date. "No data yet" (no row, or a null value) falls
    /// back to today; a failed query is an error.
    async fn read_max_date(
        &self,
        executions: &mut Vec<(String, String)>,
    ) -> Result<(RunDate, DateSource), ReportError> {
        let step = ReportStep::ReadMaxDate;
        let job = self
            .job(step, &self.statements.max_date(), executions)
            .await?;
        let rows = self
            .engine
            .get_results(&job.execution_id)
            .await
            .map_err(|source| ReportError::Results { step, source })?;

        let value = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .flatten()
            .filter(|v| !v.trim().is_empty());
        match value {
            Some(value) => {
                let date = value
                    .trim()
                    .parse::<RunDate>()
                    .map_err(|_| ReportError::InvalidPartitionDate { step, value })?;
                Ok((date, DateSource::Partition))
            }
            None => {
                let today = RunDate::today();
                warn!(date = %today, "inventory has no partitions yet, using today's date");
                Ok((today, DateSource::Today))
            }
        }
    }

    async fn extract_data_file(&self, manifest: &S3Location) -> Result<S3Location, ReportError> {
        let step = ReportStep::ExtractManifest;
        let body = match self.objects.get(&manifest.bucket, &manifest.key).await {
            Ok(body) => body,
            Err(ObjectStoreError::NotFound { .. }) => Vec::new(),
            Err(source) => return Err(ReportError::Storage { step, source }),
        };
        let text = String::from_utf8_lossy(&body);
        let first = text.lines().map(str::trim).find(|l| !l.is_empty());
        match first {
            Some(line) => {
                info!(manifest = %manifest, data_file = line, "data file located");
                line.parse()
            }
            None => Err(ReportError::DataFileLocation(text.trim().to_string())),
        }
    }

    /// Remove the scratch data file, the manifest and anything else the CSV
    /// table left under its prefix.
    async fn delete_scratch(
        &self,
        data_file: &S3Location,
        manifest: &S3Location,
        date: &RunDate,
    ) -> Result<(), ReportError> {
        let step = ReportStep::DeleteScratchObjects;
        let storage = |source| ReportError::Storage { step, source };

        self.objects
            .delete(&data_file.bucket, &data_file.key)
            .await
            .map_err(storage)?;
        self.objects
            .delete(&manifest.bucket, &manifest.key)
            .await
            .map_err(storage)?;

        let prefix = self.statements.scratch_prefix(date);
        let leftovers = self
            .objects
            .list_keys(&self.config.report_bucket, &prefix)
            .await
            .map_err(storage)?;
        for key in &leftovers {
            self.objects
                .delete(&self.config.report_bucket, key)
                .await
                .map_err(storage)?;
        }
        info!(
            prefix = %prefix,
            leftovers = leftovers.len(),
            "scratch objects deleted"
        );
        Ok(())
    }
}
