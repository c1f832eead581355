//! Report rendering: delimited attribute rows or JSON

use anyhow::Result;
use moncensus_core::MonitorRecord;

use crate::collect::HostReport;
use crate::config::{OutputConfig, OutputFormat};

const BEGIN_TAG: &str = "<BDNA>";
const END_TAG: &str = "</BDNA>";

/// Formats monitor lists as `Key="Value"` attribute rows
pub struct RowFormatter<'a> {
    output: &'a OutputConfig,
}

impl<'a> RowFormatter<'a> {
    pub fn new(output: &'a OutputConfig) -> Self {
        Self { output }
    }

    /// One monitor's populated fields, in report order
    pub fn monitor(&self, record: &MonitorRecord) -> String {
        record
            .fields()
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", name, value))
            .collect::<Vec<_>>()
            .join(&self.output.field_separator)
    }

    /// All monitors of a host; monitors without fields are left out
    pub fn value(&self, monitors: &[MonitorRecord]) -> String {
        monitors
            .iter()
            .map(|record| self.monitor(record))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(&self.output.record_separator)
    }

    /// Complete data row for one host report
    pub fn data_row(&self, report: &HostReport, task_id: &str) -> String {
        let mut row = format!(
            "{},{},{},{},{},{},{}",
            report.element_id,
            self.output.attribute_group,
            report.collector_id,
            task_id,
            report.collected_at.timestamp_millis(),
            self.output.attribute_group,
            BEGIN_TAG
        );

        let value = self.value(&report.monitors);
        if !value.is_empty() {
            row.push_str(&self.output.attribute);
            row.push('=');
            row.push_str(&value);
        }
        row.push_str(END_TAG);

        row.replace(['\r', '\n'], "")
    }
}

/// Render all host reports in the configured format
pub fn render(reports: &[HostReport], output: &OutputConfig, task_id: &str) -> Result<String> {
    match output.format {
        OutputFormat::Row => {
            let formatter = RowFormatter::new(output);
            Ok(reports
                .iter()
                .map(|report| formatter.data_row(report, task_id) + "\n")
                .collect())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)? + "\n"),
    }
}
