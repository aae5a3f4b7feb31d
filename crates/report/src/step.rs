use std::fmt;

/// The steps of a report run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStep {
    DropScratchTable,
    LoadPartitions,
    CreateExternalTable,
    UpdateExternalTable,
    CreateLatestView,
    CreateTopTenView,
    CreateTaggedVsUntaggedView,
    ReadMaxDate,
    CreateCsvResultTable,
    ExtractManifest,
    CopyResultObject,
    DeleteScratchObjects,
    /// The closing drop of the scratch table; unlike the first it gates the
    /// run's success.
    FinalDropScratchTable,
}

impl ReportStep {
    pub const ORDER: [ReportStep; 13] = [
        ReportStep::DropScratchTable,
        ReportStep::LoadPartitions,
        ReportStep::CreateExternalTable,
        ReportStep::UpdateExternalTable,
        ReportStep::CreateLatestView,
        ReportStep::CreateTopTenView,
        ReportStep::CreateTaggedVsUntaggedView,
        ReportStep::ReadMaxDate,
        ReportStep::CreateCsvResultTable,
        ReportStep::ExtractManifest,
        ReportStep::CopyResultObject,
        ReportStep::DeleteScratchObjects,
        ReportStep::FinalDropScratchTable,
    ];
}

impl fmt::Display for ReportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStep::DropScratchTable => "DropScratchTable",
            ReportStep::LoadPartitions => "LoadPartitions",
            ReportStep::CreateExternalTable => "CreateExternalTable",
            ReportStep::UpdateExternalTable => "UpdateExternalTable",
            ReportStep::CreateLatestView => "CreateLatestView",
            ReportStep::CreateTopTenView => "CreateTopTenView",
            ReportStep::CreateTaggedVsUntaggedView => "CreateTaggedVsUntaggedView",
            ReportStep::ReadMaxDate => "ReadMaxDate",
            ReportStep::CreateCsvResultTable => "CreateCsvResultTable",
            ReportStep::ExtractManifest => "ExtractManifest",
            ReportStep::CopyResultObject => "CopyResultObject",
            ReportStep::DeleteScratchObjects => "DeleteScratchObjects",
            ReportStep::FinalDropScratchTable => "DropScratchTable(again)",
        };
        f.write_str(s)
    }
}
