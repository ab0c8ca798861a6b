//! Check results built from metric fields
//!
//! A metric's fields are encoded twice: as a human readable summary in
//! `plugin_output`, and as one performance data token per field.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::FieldValue;

/// Exit status of a passive check, as understood by Icinga2.
///
/// The bridge only ever reports OK; thresholds are evaluated by the
/// monitoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok = 0,
}

impl Serialize for ExitStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Payload of a `process-check-result` action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub exit_status: ExitStatus,
    pub plugin_output: String,
    pub performance_data: Vec<String>,
    pub check_source: String,
}

/// Build the check result for one metric's fields.
///
/// Fields are visited in map order, so the performance data follows that
/// order as well.
pub fn build(host: &str, fields: &BTreeMap<String, FieldValue>) -> CheckResult {
    let mut plugin_output = String::new();
    let mut performance_data = Vec::with_capacity(fields.len());

    for (name, value) in fields {
        plugin_output.push_str(&format!("{name}:{value} "));
        performance_data.push(format!("{name}={value};;;"));
    }

    CheckResult {
        exit_status: ExitStatus::Ok,
        plugin_output,
        performance_data,
        check_source: host.to_string(),
    }
}
