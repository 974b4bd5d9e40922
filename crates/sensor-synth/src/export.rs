//! Reading history export and reload
//!
//! Every format carries the same flat layout: `timestamp`, `simulation_time`,
//! then `<id>`, `<id>_status`, `<id>_true` for each channel in catalog order.
//! Payloads are serialized in memory before the target file is touched.

use crate::catalog::SensorId;
use crate::engine::{ChannelReading, Reading, SensorStatus};
use crate::{Result, SensorError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Tabular CSV, one header row
    Csv,
    /// JSON array of flat row objects
    Json,
    /// bincode-encoded column table
    Bin,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Bin => "bin",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(ExportFormat::Csv),
            "json" | "row-json" => Ok(ExportFormat::Json),
            "bin" | "bincode" | "columnar-binary" => Ok(ExportFormat::Bin),
            _ => Err(SensorError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Serialize `readings` and write them to `path`. Returns the row count.
pub fn write_readings(path: &Path, format: ExportFormat, readings: &[Reading]) -> Result<usize> {
    let bytes = encode(format, readings)?;
    fs::write(path, bytes)?;
    Ok(readings.len())
}

/// Read back a file written by [`write_readings`].
pub fn load_readings<P: AsRef<Path>>(path: P, format: ExportFormat) -> Result<Vec<Reading>> {
    let bytes = fs::read(path)?;
    decode(format, &bytes)
}

pub fn encode(format: ExportFormat, readings: &[Reading]) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(readings),
        ExportFormat::Json => {
            let rows: Vec<FlatRow<'_>> = readings.iter().map(FlatRow).collect();
            Ok(serde_json::to_vec(&rows)?)
        }
        ExportFormat::Bin => Ok(bincode::serialize(&ColumnarTable::from_readings(readings))?),
    }
}

pub fn decode(format: ExportFormat, bytes: &[u8]) -> Result<Vec<Reading>> {
    match format {
        ExportFormat::Csv => from_csv(bytes),
        ExportFormat::Json => from_json(bytes),
        ExportFormat::Bin => bincode::deserialize::<ColumnarTable>(bytes)?.into_readings(),
    }
}

fn status_column(id: SensorId) -> String {
    format!("{id}_status")
}

fn true_column(id: SensorId) -> String {
    format!("{id}_true")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn parse_f64(column: &str, s: &str) -> Result<f64> {
    s.parse()
        .map_err(|_| SensorError::MalformedRow(format!("{column}: not a number: {s:?}")))
}

// ============================================================================
// Tabular (CSV)
// ============================================================================

fn header() -> Vec<String> {
    let mut columns = vec!["timestamp".to_string(), "simulation_time".to_string()];
    for id in SensorId::ALL {
        columns.push(id.as_str().to_string());
        columns.push(status_column(id));
        columns.push(true_column(id));
    }
    columns
}

fn to_csv(readings: &[Reading]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header())?;

    for reading in readings {
        let mut record = Vec::with_capacity(2 + 3 * SensorId::COUNT);
        record.push(format_timestamp(&reading.timestamp));
        record.push(reading.simulation_time.to_string());
        for id in SensorId::ALL {
            match reading.get(id) {
                Some(channel) => {
                    record.push(channel.value.to_string());
                    record.push(channel.status.to_string());
                    record.push(channel.true_value.to_string());
                }
                None => record.extend([String::new(), String::new(), String::new()]),
            }
        }
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| SensorError::Io(e.into_error()))
}

fn from_csv(bytes: &[u8]) -> Result<Vec<Reading>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let header = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = header.iter().enumerate().map(|(i, h)| (h, i)).collect();

    let mut readings = Vec::new();
    for record in reader.records() {
        let record = record?;
        readings.push(parse_flat_row(|name| {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .map(Cow::Borrowed)
        })?);
    }
    Ok(readings)
}

/// Rebuild a reading from a flat row, given a lookup of cell text by column
/// name. A channel is present when its value cell is present and non-empty.
fn parse_flat_row<'a, F>(field: F) -> Result<Reading>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    let require = |name: &str| {
        field(name).ok_or_else(|| SensorError::MalformedRow(format!("missing column {name}")))
    };

    let mut channels = BTreeMap::new();
    for id in SensorId::ALL {
        let value = match field(id.as_str()) {
            Some(value) if !value.is_empty() => value,
            _ => continue,
        };
        let true_name = true_column(id);
        channels.insert(
            id,
            ChannelReading {
                value: parse_f64(id.as_str(), &value)?,
                status: require(&status_column(id))?.parse()?,
                true_value: parse_f64(&true_name, &require(&true_name)?)?,
            },
        );
    }

    Ok(Reading {
        timestamp: parse_timestamp(&require("timestamp")?)?,
        simulation_time: parse_f64("simulation_time", &require("simulation_time")?)?,
        channels,
    })
}

// ============================================================================
// Row JSON
// ============================================================================

/// One reading as a flat JSON object, keys in column order.
struct FlatRow<'a>(&'a Reading);

impl Serialize for FlatRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let reading = self.0;
        let mut map = serializer.serialize_map(Some(2 + 3 * reading.channels.len()))?;
        map.serialize_entry("timestamp", &format_timestamp(&reading.timestamp))?;
        map.serialize_entry("simulation_time", &reading.simulation_time)?;
        for (id, channel) in &reading.channels {
            map.serialize_entry(id.as_str(), &channel.value)?;
            map.serialize_entry(&status_column(*id), &channel.status)?;
            map.serialize_entry(&true_column(*id), &channel.true_value)?;
        }
        map.end()
    }
}

fn from_json(bytes: &[u8]) -> Result<Vec<Reading>> {
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_slice(bytes)?;

    rows.iter()
        .map(|row| {
            parse_flat_row(|name| {
                row.get(name).map(|v| match v {
                    Value::String(s) => Cow::Borrowed(s.as_str()),
                    // non-finite values are written as null
                    Value::Null => Cow::Borrowed("NaN"),
                    other => Cow::Owned(other.to_string()),
                })
            })
        })
        .collect()
}

// ============================================================================
// Columnar binary
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SensorColumn {
    sensor: SensorId,
    values: Vec<f64>,
    status: Vec<SensorStatus>,
    true_values: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnarTable {
    timestamps: Vec<DateTime<Utc>>,
    simulation_time: Vec<f64>,
    columns: Vec<SensorColumn>,
}

impl ColumnarTable {
    /// Channels missing from any reading are left out of the table.
    fn from_readings(readings: &[Reading]) -> Self {
        let columns = SensorId::ALL
            .iter()
            .filter_map(|&id| {
                let cells: Option<Vec<&ChannelReading>> =
                    readings.iter().map(|r| r.get(id)).collect();
                let cells = cells?;
                Some(SensorColumn {
                    sensor: id,
                    values: cells.iter().map(|c| c.value).collect(),
                    status: cells.iter().map(|c| c.status).collect(),
                    true_values: cells.iter().map(|c| c.true_value).collect(),
                })
            })
            .collect();

        Self {
            timestamps: readings.iter().map(|r| r.timestamp).collect(),
            simulation_time: readings.iter().map(|r| r.simulation_time).collect(),
            columns,
        }
    }

    fn into_readings(self) -> Result<Vec<Reading>> {
        let rows = self.timestamps.len();
        let ragged = self.simulation_time.len() != rows
            || self.columns.iter().any(|c| {
                c.values.len() != rows || c.status.len() != rows || c.true_values.len() != rows
            });
        if ragged {
            return Err(SensorError::MalformedRow(
                "column lengths differ".to_string(),
            ));
        }

        let readings = (0..rows)
            .map(|i| Reading {
                timestamp: self.timestamps[i],
                simulation_time: self.simulation_time[i],
                channels: self
                    .columns
                    .iter()
                    .map(|c| {
                        (
                            c.sensor,
                            ChannelReading {
                                value: c.values[i],
                                status: c.status[i],
                                true_value: c.true_values[i],
                            },
                        )
                    })
                    .collect(),
            })
            .collect();
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SensorEngine;
    use flight_dynamics::{MissionParameters, Simulation};
    use nalgebra::Vector3;
    use tempfile::NamedTempFile;

    fn sample_engine() -> SensorEngine {
        let mut sim = Simulation::default();
        let burn = vec![Vector3::new(0.0, 2_500.0, 0.0); 4];
        sim.run_simulation(Some(12), &burn);

        let mut engine = SensorEngine::with_seed(MissionParameters::default(), 2024);
        engine.generate_batch_data(sim.state_history());
        engine.simulate_sensor_failure("gyroscope_y").unwrap();
        engine.generate_batch_data(&sim.state_history()[..2]);
        engine
    }

    #[test]
    fn test_format_names() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("tabular".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("row-json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(
            "columnar-binary".parse::<ExportFormat>().unwrap(),
            ExportFormat::Bin
        );
        assert!(matches!(
            "parquet".parse::<ExportFormat>(),
            Err(SensorError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_header_layout() {
        let engine = sample_engine();
        let bytes = encode(ExportFormat::Csv, engine.history()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let first = text.lines().next().unwrap();

        assert!(first.starts_with(
            "timestamp,simulation_time,accelerometer_x,accelerometer_x_status,accelerometer_x_true,"
        ));
        assert!(first.ends_with("data_rate,data_rate_status,data_rate_true"));
        assert_eq!(text.lines().count(), 1 + engine.history().len());
    }

    #[test]
    fn test_csv_round_trip() {
        let engine = sample_engine();
        let file = NamedTempFile::new().unwrap();

        let rows = engine.export_data(file.path(), ExportFormat::Csv).unwrap();
        assert_eq!(rows, 15);

        let loaded = load_readings(file.path(), ExportFormat::Csv).unwrap();
        assert_eq!(loaded.as_slice(), engine.history());
        assert_eq!(
            loaded[14].get(SensorId::GyroscopeY).unwrap().status,
            SensorStatus::Failed
        );
    }

    #[test]
    fn test_json_round_trip() {
        let engine = sample_engine();
        let file = NamedTempFile::new().unwrap();
        engine.export_data(file.path(), ExportFormat::Json).unwrap();

        let loaded = load_readings(file.path(), ExportFormat::Json).unwrap();
        assert_eq!(loaded.len(), engine.history().len());
        for (a, b) in loaded.iter().zip(engine.history()) {
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.simulation_time, b.simulation_time);
            for (id, channel) in &b.channels {
                let other = a.get(*id).unwrap();
                assert_eq!(other.status, channel.status);
                assert!((other.value - channel.value).abs() <= 1e-9 * channel.value.abs().max(1.0));
            }
        }

        let raw: Value = serde_json::from_slice(&fs::read(file.path()).unwrap()).unwrap();
        assert_eq!(raw[0]["pressure_cabin_status"], "OK");
        assert_eq!(raw[0]["simulation_time"], 0.0);
    }

    #[test]
    fn test_columnar_round_trip() {
        let engine = sample_engine();
        let file = NamedTempFile::new().unwrap();
        engine.export_data(file.path(), ExportFormat::Bin).unwrap();

        let loaded = load_readings(file.path(), ExportFormat::Bin).unwrap();
        assert_eq!(loaded.as_slice(), engine.history());
    }

    #[test]
    fn test_unsupported_format_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.parquet");

        let result = "parquet"
            .parse::<ExportFormat>()
            .and_then(|format| sample_engine().export_data(&path, format));
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_csv_rejected() {
        let bytes = b"timestamp,simulation_time,altitude,altitude_status,altitude_true\n\
                      2026-01-01T00:00:00Z,0,abc,OK,400000\n";
        assert!(matches!(
            decode(ExportFormat::Csv, bytes),
            Err(SensorError::MalformedRow(_))
        ));

        let missing = b"simulation_time\n0\n";
        assert!(decode(ExportFormat::Csv, missing).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let no_status = br#"[{"timestamp":"2026-01-01T00:00:00Z","simulation_time":0,"altitude":1.0,"altitude_true":1.0}]"#;
        assert!(matches!(
            decode(ExportFormat::Json, no_status),
            Err(SensorError::MalformedRow(_))
        ));

        let bad_value = br#"[{"timestamp":"2026-01-01T00:00:00Z","simulation_time":0,"altitude":true,"altitude_status":"OK","altitude_true":1.0}]"#;
        assert!(matches!(
            decode(ExportFormat::Json, bad_value),
            Err(SensorError::MalformedRow(_))
        ));
    }
}
