//! Module to locate the capture files of simulation runs in a trace directory.
//!
//! Every run is recorded at up to three points of the path, and each capture file is named by its
//! role followed by the run identifier, e.g. `client-3-0.pcap`, `upstream-3-0.pcap.gz`.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Observation point of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceRole {
    /// The client sending requests and receiving their echoes.
    Client,
    /// The first router on the path.
    Upstream,
    /// The second router on the path.
    Downstream,
}

impl TraceRole {
    pub const ALL: [TraceRole; 3] = [Self::Client, Self::Upstream, Self::Downstream];

    /// File name prefix of captures with this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
        }
    }
}

impl std::fmt::Display for TraceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// All captures of a single run. Only the client capture is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTraces {
    pub run: String,
    pub client: PathBuf,
    pub upstream: Option<PathBuf>,
    pub downstream: Option<PathBuf>,
}

impl RunTraces {
    pub fn get(&self, role: TraceRole) -> Option<&Path> {
        match role {
            TraceRole::Client => Some(&self.client),
            TraceRole::Upstream => self.upstream.as_deref(),
            TraceRole::Downstream => self.downstream.as_deref(),
        }
    }
}

/// Split a capture file name into its role and run identifier. Returns `None` for files that do
/// not follow the naming convention.
pub fn parse_trace_name(file_name: &str) -> Option<(TraceRole, String)> {
    let stem = file_name
        .strip_suffix(".pcap.gz")
        .or_else(|| file_name.strip_suffix(".pcap"))?;
    TraceRole::ALL.into_iter().find_map(|role| {
        let run = stem.strip_prefix(role.prefix())?;
        Some((role, run.trim_start_matches(['-', '_']).to_string()))
    })
}

/// List all runs with a client capture in `trace_dir`, ordered by run identifier. Captures of
/// other roles without a matching client capture are skipped.
pub fn discover_runs(trace_dir: &Path) -> Result<Vec<RunTraces>, glob::PatternError> {
    let pattern = format!(
        "{}/*.pcap*",
        glob::Pattern::escape(&trace_dir.to_string_lossy())
    );

    let mut found: BTreeMap<String, BTreeMap<TraceRole, PathBuf>> = BTreeMap::new();
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Cannot read {:?}: {e}", e.path());
                continue;
            }
        };
        let Some((role, run)) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_trace_name)
        else {
            log::trace!("Ignoring {path:?}");
            continue;
        };
        if let Some(previous) = found.entry(run).or_default().insert(role, path) {
            // `x.pcap` and `x.pcap.gz` both exist
            log::warn!("Ignoring duplicate capture {previous:?}");
        }
    }

    Ok(found
        .into_iter()
        .filter_map(|(run, mut roles)| {
            let Some(client) = roles.remove(&TraceRole::Client) else {
                log::warn!("Skipping run {run:?} without a client capture");
                return None;
            };
            Some(RunTraces {
                run,
                client,
                upstream: roles.remove(&TraceRole::Upstream),
                downstream: roles.remove(&TraceRole::Downstream),
            })
        })
        .sorted_by(|a, b| human_sort::compare(&a.run, &b.run))
        .collect())
}
