//! Per-channel statistics over the reading history

use crate::catalog::{SensorCatalog, SensorId};
use crate::engine::{Reading, SensorState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub name: String,
    pub unit: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two readings
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub last_value: Option<f64>,
    pub is_functional: bool,
    pub drift_offset: f64,
}

/// Summaries of reported values (OK and FAILED alike), one per channel.
/// Empty when there is no history.
pub fn summarize(
    catalog: &SensorCatalog,
    states: &[SensorState],
    history: &[Reading],
) -> BTreeMap<SensorId, SensorSummary> {
    if history.is_empty() {
        return BTreeMap::new();
    }

    catalog
        .iter()
        .map(|(id, config)| {
            let values: Vec<f64> = history
                .iter()
                .filter_map(|r| r.get(id).map(|c| c.value))
                .collect();
            let state = &states[id.index()];

            let summary = SensorSummary {
                name: config.name.clone(),
                unit: config.unit.clone(),
                count: values.len(),
                mean: mean(&values),
                std: sample_std(&values),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                last_value: values.last().copied(),
                is_functional: state.is_functional,
                drift_offset: state.drift_offset,
            };
            (id, summary)
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
