use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Count every trial must report for its own type.
pub const EXPECTED_COUNT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    pub type_id: u32,
    pub count: f64,
}

/// First line of a counter result file. Entries are parsed on demand, in
/// line order, so a lookup stops at the first matching `type:count` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResultRecord {
    pub raw_line: String,
}

impl OracleResultRecord {
    /// `<label> <type>:<count> ... <trailer>`; label and trailer are skipped.
    pub fn entries(&self) -> impl Iterator<Item = Result<CountEntry, HarnessError>> + '_ {
        let tokens = self.raw_line.split_whitespace().count();
        self.raw_line
            .split_whitespace()
            .skip(1)
            .take(tokens.saturating_sub(2))
            .map(parse_pair)
    }

    /// Count of the first entry for `type_id`. Pairs after it are never parsed.
    pub fn count_for(&self, type_id: u32) -> Result<Option<f64>, HarnessError> {
        for entry in self.entries() {
            let entry = entry?;
            if entry.type_id == type_id {
                return Ok(Some(entry.count));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum TrialVerdict {
    Pass,
    Mismatch { count: f64 },
}

impl TrialVerdict {
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

#[must_use]
pub fn parse_result_line(line: &str) -> OracleResultRecord {
    OracleResultRecord {
        raw_line: line.trim_end_matches(['\r', '\n']).to_owned(),
    }
}

fn parse_pair(pair: &str) -> Result<CountEntry, HarnessError> {
    let (type_id, count) = pair
        .split_once(':')
        .ok_or_else(|| HarnessError::ResultFormat(format!("missing ':' in {pair:?}")))?;
    let type_id = type_id
        .parse::<u32>()
        .map_err(|err| HarnessError::ResultFormat(format!("type id in {pair:?}: {err}")))?;
    let count = count
        .parse::<f64>()
        .map_err(|err| HarnessError::ResultFormat(format!("count in {pair:?}: {err}")))?;
    Ok(CountEntry { type_id, count })
}

/// Reads only the first line; an empty file yields a record with no entries.
pub fn read_result_file(path: &Path) -> Result<OracleResultRecord, HarnessError> {
    let text = fs::read_to_string(path).map_err(|source| HarnessError::ResultUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_result_line(text.lines().next().unwrap_or_default()))
}

/// Pass when the target type is counted exactly once, or merely present in
/// subgraph-test mode. A missing target type is an error, as is a malformed
/// pair met before the target's entry.
pub fn verify_result(
    record: &OracleResultRecord,
    type_id: u32,
    subgraph_test: bool,
) -> Result<TrialVerdict, HarnessError> {
    let Some(count) = record.count_for(type_id)? else {
        return Err(HarnessError::TargetTypeNotFound {
            type_id,
            raw_line: record.raw_line.clone(),
        });
    };
    if subgraph_test || count == EXPECTED_COUNT {
        Ok(TrialVerdict::Pass)
    } else {
        Ok(TrialVerdict::Mismatch { count })
    }
}
