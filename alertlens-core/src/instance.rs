// Instance metadata and lifecycle events.
//
// Runs its own pass, separate from the ORA/warning scan. A timestamp line is
// still classified here, and metadata captures may co-occur with an event on
// the same line.

use crate::filter::EventFilter;
use crate::input::{AlertLogSet, LogLine};
use crate::model::{InstanceEvent, InstanceEventKind, NOT_FOUND};
use crate::patterns;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_names: BTreeSet<String>,
    pub hostnames: BTreeSet<String>,
    pub releases: BTreeSet<String>,
    pub startup_events: Vec<InstanceEvent>,
    pub shutdown_events: Vec<InstanceEvent>,
    pub crash_events: Vec<InstanceEvent>,
    pub alter_commands: Vec<InstanceEvent>,
    pub resize_commands: Vec<InstanceEvent>,
}

impl InstanceSummary {
    pub fn events(&self, kind: InstanceEventKind) -> &[InstanceEvent] {
        match kind {
            InstanceEventKind::Startup => &self.startup_events,
            InstanceEventKind::Shutdown => &self.shutdown_events,
            InstanceEventKind::Crash => &self.crash_events,
            InstanceEventKind::Alter => &self.alter_commands,
            InstanceEventKind::Resize => &self.resize_commands,
        }
    }

    fn events_mut(&mut self, kind: InstanceEventKind) -> &mut Vec<InstanceEvent> {
        match kind {
            InstanceEventKind::Startup => &mut self.startup_events,
            InstanceEventKind::Shutdown => &mut self.shutdown_events,
            InstanceEventKind::Crash => &mut self.crash_events,
            InstanceEventKind::Alter => &mut self.alter_commands,
            InstanceEventKind::Resize => &mut self.resize_commands,
        }
    }

    pub fn event_count(&self) -> usize {
        InstanceEventKind::ALL.iter().map(|k| self.events(*k).len()).sum()
    }

    /// Same metadata, events narrowed by `filter`.
    pub fn filtered(&self, filter: &EventFilter) -> InstanceSummary {
        InstanceSummary {
            instance_names: self.instance_names.clone(),
            hostnames: self.hostnames.clone(),
            releases: self.releases.clone(),
            startup_events: filter.apply(&self.startup_events),
            shutdown_events: filter.apply(&self.shutdown_events),
            crash_events: filter.apply(&self.crash_events),
            alter_commands: filter.apply(&self.alter_commands),
            resize_commands: filter.apply(&self.resize_commands),
        }
    }

    pub fn merge(&mut self, other: InstanceSummary) {
        self.instance_names.extend(other.instance_names);
        self.hostnames.extend(other.hostnames);
        self.releases.extend(other.releases);
        self.startup_events.extend(other.startup_events);
        self.shutdown_events.extend(other.shutdown_events);
        self.crash_events.extend(other.crash_events);
        self.alter_commands.extend(other.alter_commands);
        self.resize_commands.extend(other.resize_commands);
    }
}

/// Administrative commands are checked before lifecycle phrases.
fn classification_order() -> [(InstanceEventKind, &'static Regex); 5] {
    [
        (InstanceEventKind::Alter, &patterns::ALTER),
        (InstanceEventKind::Resize, &patterns::RESIZE),
        (InstanceEventKind::Startup, &patterns::STARTUP),
        (InstanceEventKind::Shutdown, &patterns::SHUTDOWN),
        (InstanceEventKind::Crash, &patterns::CRASH),
    ]
}

pub fn classify_instance_line(line: &str) -> Option<InstanceEventKind> {
    classification_order()
        .into_iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(kind, _)| kind)
}

pub fn extract_instance_summary(lines: &[LogLine]) -> InstanceSummary {
    let mut summary = InstanceSummary::default();
    let mut last_ts: Option<String> = None;

    for line in lines {
        let text = line.text.trim_end_matches(['\n', '\r']);

        if let Some(ts) = patterns::find_timestamp(text) {
            last_ts = Some(ts.to_string());
        }

        if let Some(release) = patterns::find_release(text) {
            summary.releases.insert(release.to_string());
        }
        if let Some(name) = patterns::find_instance_name(text) {
            summary.instance_names.insert(name.to_string());
        }
        if let Some(host) = patterns::find_host(text) {
            summary.hostnames.insert(host.to_string());
        }

        if let Some(kind) = classify_instance_line(text) {
            summary.events_mut(kind).push(InstanceEvent {
                kind,
                timestamp: last_ts.clone().unwrap_or_else(|| NOT_FOUND.to_string()),
                line_text: text.trim().to_string(),
                line_index: line.index,
                source: line.source.clone(),
            });
        }
    }

    debug!(
        "Instance pass over {} lines: {} events, {} instance names, {} hosts",
        lines.len(),
        summary.event_count(),
        summary.instance_names.len(),
        summary.hostnames.len()
    );
    summary
}

/// Each source gets its own pass; results are merged in set order.
pub fn extract_instance_summary_set(set: &AlertLogSet) -> InstanceSummary {
    let mut combined = InstanceSummary::default();
    for (_, lines) in set.iter() {
        combined.merge(extract_instance_summary(lines));
    }
    combined
}
