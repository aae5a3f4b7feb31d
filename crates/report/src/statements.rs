//! SQL text of every report statement.
//!
//! DDL that the engine parses with its Hive dialect (`DROP TABLE`,
//! `MSCK REPAIR TABLE`) quotes identifiers with backticks; everything else
//! uses double quotes. Table and view names contain dashes, so they are
//! always quoted.

use tag_inventory_core::{RunDate, UNTAGGED_NAME};

use crate::config::ReportConfig;

/// Parquet table derived from the crawled inventory, partitioned by `d`.
pub const INVENTORY_TABLE: &str = "tag-inventory";
pub const LATEST_VIEW: &str = "tag-inventory-view-latest";
pub const TOP_TEN_VIEW: &str = "tag-inventory-view-latest-top-ten";
pub const TAGGED_VS_UNTAGGED_VIEW: &str = "tag-inventory-view-latest-tagged-vs-untagged";
/// Scratch CSV table whose single data file becomes the report.
pub const CSV_TABLE: &str = "tag-inventory-latest-csv";

/// Header row of the report, also the column order of every data row.
pub const CSV_COLUMNS: [&str; 8] = [
    "date",
    "tagname",
    "tagvalue",
    "owningaccountid",
    "region",
    "service",
    "resourcetype",
    "arn",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStatements {
    database: String,
    source_table: String,
    athena_bucket: String,
    report_bucket: String,
}

impl ReportStatements {
    pub fn new(config: &ReportConfig) -> Self {
        ReportStatements {
            database: config.database.clone(),
            source_table: config.tag_inventory_table.clone(),
            athena_bucket: config.athena_bucket.clone(),
            report_bucket: config.report_bucket.clone(),
        }
    }

    fn qualified(&self, table: &str) -> String {
        format!("\"{}\".\"{}\"", self.database, table)
    }

    /// Prefix the CSV table writes its data under for `date`.
    pub fn scratch_prefix(&self, date: &RunDate) -> String {
        format!("{}/", date)
    }

    pub fn drop_scratch_table(&self) -> String {
        format!("DROP TABLE IF EXISTS `{}.{}`", self.database, CSV_TABLE)
    }

    pub fn load_partitions(&self) -> String {
        format!("MSCK REPAIR TABLE `{}.{}`", self.database, self.source_table)
    }

    pub fn create_inventory_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {target} \
             WITH (table_type = 'HIVE', format = 'PARQUET', parquet_compression = 'SNAPPY', \
             external_location = 's3://{bucket}/tables/{table}/', partitioned_by = ARRAY['d']) \
             AS SELECT tagname, tagvalue, r.owningAccountId, r.region, r.service, \
             r.resourceType, r.arn, d \
             FROM {source}, UNNEST(\"resources\") t (\"r\") \
             WITH NO DATA",
            target = self.qualified(INVENTORY_TABLE),
            bucket = self.athena_bucket,
            table = INVENTORY_TABLE,
            source = self.qualified(&self.source_table),
        )
    }

    pub fn update_inventory_table(&self) -> String {
        format!(
            "INSERT INTO {target} \
             SELECT tagname, tagvalue, r.owningAccountId AS owningAccountId, \
             r.region AS region, r.service AS service, r.resourceType AS resourceType, \
             r.arn AS arn, d \
             FROM {source}, UNNEST(\"resources\") t (\"r\")",
            target = self.qualified(INVENTORY_TABLE),
            source = self.qualified(&self.source_table),
        )
    }

    pub fn create_latest_view(&self) -> String {
        let inventory = self.qualified(INVENTORY_TABLE);
        format!(
            "CREATE OR REPLACE VIEW {view} AS \
             SELECT d, tagname, tagvalue, owningAccountId, region, service, resourceType, arn \
             FROM {inventory} \
             WHERE d = (SELECT max(d) FROM {inventory}) \
             ORDER BY d DESC, tagname DESC, tagvalue DESC",
            view = self.qualified(LATEST_VIEW),
        )
    }

    pub fn create_top_ten_view(&self) -> String {
        format!(
            "CREATE OR REPLACE VIEW {view} AS \
             SELECT tagname, tagvalue, count(DISTINCT arn) AS resource_count \
             FROM {latest} \
             GROUP BY tagname, tagvalue \
             ORDER BY resource_count DESC, tagname DESC, tagvalue DESC \
             LIMIT 10",
            view = self.qualified(TOP_TEN_VIEW),
            latest = self.qualified(LATEST_VIEW),
        )
    }

    pub fn create_tagged_vs_untagged_view(&self) -> String {
        let latest = self.qualified(LATEST_VIEW);
        format!(
            "CREATE OR REPLACE VIEW {view} AS \
             SELECT kv['tagged'] AS tagged, kv['untagged'] AS untagged \
             FROM (SELECT map_agg(k, v) kv FROM ( \
             SELECT 'untagged' AS k, count(DISTINCT arn) v FROM {latest} WHERE tagname = '{untagged}' \
             UNION ALL \
             SELECT 'tagged' AS k, count(DISTINCT arn) v FROM {latest} WHERE tagname != '{untagged}'))",
            view = self.qualified(TAGGED_VS_UNTAGGED_VIEW),
            untagged = UNTAGGED_NAME,
        )
    }

    pub fn max_date(&self) -> String {
        format!("SELECT max(d) FROM {}", self.qualified(&self.source_table))
    }

    /// The header row is a literal row unioned in front of the data, so the
    /// single TEXTFILE data file is a complete CSV.
    pub fn create_csv_result_table(&self, date: &RunDate) -> String {
        let header = CSV_COLUMNS
            .iter()
            .zip(["d", "tagname", "tagvalue", "owningaccountid", "region", "service", "resourcetype", "arn"])
            .map(|(label, column)| format!("'{}' AS {}", label, column))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE {table} \
             WITH (format = 'TEXTFILE', field_delimiter = ',', \
             external_location = 's3://{bucket}/{prefix}', \
             bucketed_by = ARRAY['d'], bucket_count = 1) \
             AS (SELECT * FROM ( \
             SELECT {header} \
             UNION ALL \
             SELECT d, tagname, tagvalue, owningaccountid, region, service, resourcetype, arn \
             FROM {latest}) \
             ) ORDER BY d DESC, tagname ASC",
            table = self.qualified(CSV_TABLE),
            bucket = self.report_bucket,
            prefix = self.scratch_prefix(date),
            latest = self.qualified(LATEST_VIEW),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollPolicy;

    fn statements() -> ReportStatements {
        ReportStatements::new(&ReportConfig {
            database: "tag_db".into(),
            tag_inventory_table: "spoke_results".into(),
            work_group: "tags".into(),
            athena_bucket: "athena-bucket".into(),
            report_bucket: "report-bucket".into(),
            poll: PollPolicy::default(),
        })
    }

    #[test]
    fn hive_ddl_uses_backticks() {
        let s = statements();
        assert_eq!(
            s.drop_scratch_table(),
            "DROP TABLE IF EXISTS `tag_db.tag-inventory-latest-csv`"
        );
        assert_eq!(s.load_partitions(), "MSCK REPAIR TABLE `tag_db.spoke_results`");
    }

    #[test]
    fn inventory_table_is_partitioned_parquet_without_data() {
        let sql = statements().create_inventory_table();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"tag_db\".\"tag-inventory\""));
        assert!(sql.contains("format = 'PARQUET'"));
        assert!(sql.contains("external_location = 's3://athena-bucket/tables/tag-inventory/'"));
        assert!(sql.contains("partitioned_by = ARRAY['d']"));
        assert!(sql.contains("UNNEST(\"resources\")"));
        assert!(sql.ends_with("WITH NO DATA"));
    }

    #[test]
    fn untagged_split_counts_distinct_arns_on_sentinel() {
        let sql = statements().create_tagged_vs_untagged_view();
        assert!(sql.contains("WHERE tagname = 'NoTag'"));
        assert!(sql.contains("WHERE tagname != 'NoTag'"));
        assert!(sql.contains("count(DISTINCT arn)"));
    }

    #[test]
    fn csv_table_writes_one_headed_file_under_date_prefix() {
        let date: RunDate = "2024-01-02".parse().unwrap();
        let sql = statements().create_csv_result_table(&date);
        assert!(sql.contains("external_location = 's3://report-bucket/2024-01-02/'"));
        assert!(sql.contains("bucket_count = 1"));
        assert!(sql.contains("'date' AS d, 'tagname' AS tagname"));
        assert!(sql.contains("'arn' AS arn"));
        assert!(sql.contains("FROM \"tag_db\".\"tag-inventory-view-latest\""));
    }

    #[test]
    fn max_date_reads_source_table() {
        assert_eq!(
            statements().max_date(),
            "SELECT max(d) FROM \"tag_db\".\"spoke_results\""
        );
    }
}
