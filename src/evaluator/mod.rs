//! Threshold and warning-band classification.
//!
//! Evaluation order is part of the contract: the grouped subset is judged
//! first as one combined entity, then every ungrouped file independently.
//! Alerts take priority over warnings, and only the first matching warning
//! band fires for a given entity. All boundary comparisons are `>=`.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::config::ThresholdConfig;
use crate::core::events::{EventSink, MonitorEvent, Severity};
use crate::core::format::format_size;
use crate::scanner::Inventory;

/// Alert and warning texts produced by one evaluation, in firing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationResult {
    /// Sizes that met or exceeded the hard threshold.
    pub alerts: Vec<String>,
    /// Sizes that met or exceeded a warning band.
    pub warnings: Vec<String>,
}

impl EvaluationResult {
    /// Whether anything fired at all.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.alerts.is_empty() && self.warnings.is_empty()
    }
}

/// What a single size classified as.
enum Determination {
    Alert,
    Warning(u8),
}

/// Classifies one size against the threshold and bands. A zero threshold is
/// caller misconfiguration and yields nothing rather than a fault.
fn classify(size: u64, config: &ThresholdConfig) -> Option<Determination> {
    if config.threshold_bytes == 0 {
        return None;
    }
    if size >= config.threshold_bytes {
        return Some(Determination::Alert);
    }
    if config.enable_warnings {
        for &pct in &config.warning_percentages {
            let band = config.threshold_bytes * u64::from(pct) / 100;
            if size >= band {
                return Some(Determination::Warning(pct));
            }
        }
    }
    None
}

/// Evaluates an inventory. Each determination is appended to the returned
/// result and echoed as a `ThresholdAlert` event on the sink.
pub fn evaluate(
    inventory: &Inventory,
    config: &ThresholdConfig,
    sink: &dyn EventSink,
) -> EvaluationResult {
    let mut result = EvaluationResult::default();
    let limit = format_size(config.threshold_bytes);

    if !inventory.grouped_files.is_empty() {
        if let Some(determination) = classify(inventory.grouped_total_size, config) {
            let message = match determination {
                Determination::Alert => format!(
                    "Combined {} files ({}) have reached the {limit} limit",
                    grouped_label(inventory),
                    inventory.grouped_total_size_formatted
                ),
                Determination::Warning(pct) => format!(
                    "Combined {} files ({}) have reached {pct}% of the {limit} limit",
                    grouped_label(inventory),
                    inventory.grouped_total_size_formatted
                ),
            };
            record(&mut result, sink, &determination, message);
        }
    }

    let grouped_names: HashSet<&str> = inventory
        .grouped_files
        .iter()
        .map(|file| file.name.as_str())
        .collect();
    for file in &inventory.files {
        if grouped_names.contains(file.name.as_str()) {
            continue;
        }
        if let Some(determination) = classify(file.size, config) {
            let message = match determination {
                Determination::Alert => format!(
                    "{} ({}) has reached the {limit} limit",
                    file.name, file.size_formatted
                ),
                Determination::Warning(pct) => format!(
                    "{} ({}) has reached {pct}% of the {limit} limit",
                    file.name, file.size_formatted
                ),
            };
            record(&mut result, sink, &determination, message);
        }
    }

    result
}

fn record(
    result: &mut EvaluationResult,
    sink: &dyn EventSink,
    determination: &Determination,
    message: String,
) {
    let severity = match determination {
        Determination::Alert => Severity::Error,
        Determination::Warning(_) => Severity::Warning,
    };
    sink.emit(MonitorEvent::threshold_alert(severity, message.clone()));
    match determination {
        Determination::Alert => result.alerts.push(message),
        Determination::Warning(_) => result.warnings.push(message),
    }
}

/// Display label for the grouped entity: the shared suffix of its members.
fn grouped_label(inventory: &Inventory) -> &str {
    inventory
        .grouped_files
        .first()
        .and_then(|file| file.name.rfind('.').map(|dot| &file.name[dot..]))
        .unwrap_or("grouped")
}

#[cfg(test)]
mod tests {
    use super::{EvaluationResult, evaluate};
    use crate::core::config::{BYTES_PER_MB, ThresholdConfig};
    use crate::core::events::{ChannelSink, MonitorEvent, NullSink, Severity};
    use crate::scanner::{FileRecord, Inventory};

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            size,
            size_formatted: crate::core::format::format_size(size),
        }
    }

    fn inventory(records: Vec<FileRecord>) -> Inventory {
        Inventory::build("test".to_string(), records, ".caido")
    }

    fn config(threshold_mb: u64, warnings: bool, bands: Vec<u8>) -> ThresholdConfig {
        ThresholdConfig::from_megabytes(threshold_mb, warnings, bands)
    }

    #[test]
    fn file_at_exactly_threshold_alerts_not_warns() {
        let inv = inventory(vec![record("exact.bin", 10 * BYTES_PER_MB)]);
        let result = evaluate(&inv, &config(10, true, vec![75, 90]), &NullSink);
        assert_eq!(result.alerts.len(), 1);
        assert!(result.warnings.is_empty());
        assert!(result.alerts[0].contains("exact.bin"));
        assert!(result.alerts[0].contains("10.00 MB limit"));
    }

    #[test]
    fn only_first_matching_band_fires() {
        // 92% of threshold: with 75 and 90 enabled, only the 90 band fires.
        let size = 10 * BYTES_PER_MB * 92 / 100;
        let inv = inventory(vec![record("big.log", size)]);
        let result = evaluate(&inv, &config(10, true, vec![90, 75]), &NullSink);
        assert!(result.alerts.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("90%"));
    }

    #[test]
    fn band_order_is_caller_supplied() {
        // Same 92% file, but bands supplied lowest-first: 75 matches first.
        let size = 10 * BYTES_PER_MB * 92 / 100;
        let inv = inventory(vec![record("big.log", size)]);
        let result = evaluate(&inv, &config(10, true, vec![75, 90]), &NullSink);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("75%"));
    }

    #[test]
    fn warning_band_boundary_is_inclusive() {
        let inv = inventory(vec![record("edge.bin", 10 * BYTES_PER_MB * 90 / 100)]);
        let result = evaluate(&inv, &config(10, true, vec![90]), &NullSink);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn grouped_total_alerts_as_one_entity() {
        let inv = inventory(vec![
            record("a.caido", 6 * BYTES_PER_MB),
            record("b.caido", 5 * BYTES_PER_MB),
            record("c.txt", 3 * BYTES_PER_MB),
        ]);
        let result = evaluate(&inv, &config(10, true, vec![75, 90]), &NullSink);
        assert_eq!(result.alerts.len(), 1);
        assert!(result.warnings.is_empty());
        assert!(result.alerts[0].contains("Combined .caido files"));
        assert!(result.alerts[0].contains("11.00 MB"));
    }

    #[test]
    fn grouped_member_never_evaluated_individually() {
        // One .caido file over the threshold on its own, but the group total
        // stays under: no alert, and the group warning is the only output.
        let inv = inventory(vec![
            record("huge.caido", 12 * BYTES_PER_MB),
            record("tiny.caido", BYTES_PER_MB),
        ]);
        let result = evaluate(&inv, &config(20, true, vec![50]), &NullSink);
        assert!(result.alerts.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Combined"));
    }

    #[test]
    fn disabled_warnings_suppress_bands_but_not_alerts() {
        let inv = inventory(vec![
            record("over.bin", 11 * BYTES_PER_MB),
            record("near.bin", 9 * BYTES_PER_MB),
        ]);
        let result = evaluate(&inv, &config(10, false, vec![75, 90]), &NullSink);
        assert_eq!(result.alerts.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn sizes_below_all_bands_are_quiet() {
        let inv = inventory(vec![record("small.txt", 3 * BYTES_PER_MB)]);
        let result = evaluate(&inv, &config(10, true, vec![75, 90]), &NullSink);
        assert!(result.is_quiet());
    }

    #[test]
    fn zero_threshold_yields_vacuous_result() {
        let inv = inventory(vec![record("any.bin", BYTES_PER_MB)]);
        let result = evaluate(&inv, &config(0, true, vec![75]), &NullSink);
        assert!(result.is_quiet());
    }

    #[test]
    fn each_determination_echoes_one_event() {
        let inv = inventory(vec![
            record("a.caido", 11 * BYTES_PER_MB),
            record("warn.bin", 8 * BYTES_PER_MB),
        ]);
        let (sink, rx) = ChannelSink::new();
        let result = evaluate(&inv, &config(10, true, vec![75]), &sink);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.warnings.len(), 1);

        let events: Vec<MonitorEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            MonitorEvent::ThresholdAlert { severity, message, .. } => {
                assert_eq!(*severity, Severity::Error);
                assert_eq!(message, &result.alerts[0]);
            }
            MonitorEvent::ScanComplete { .. } => panic!("wrong event kind"),
        }
        match &events[1] {
            MonitorEvent::ThresholdAlert { severity, message, .. } => {
                assert_eq!(*severity, Severity::Warning);
                assert_eq!(message, &result.warnings[0]);
            }
            MonitorEvent::ScanComplete { .. } => panic!("wrong event kind"),
        }
    }

    #[test]
    fn empty_inventory_is_quiet() {
        let inv = Inventory::empty("nowhere".to_string());
        let result: EvaluationResult = evaluate(&inv, &config(10, true, vec![75, 90]), &NullSink);
        assert!(result.is_quiet());
    }
}
