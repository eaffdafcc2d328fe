//! Stats records written as JSON lines.
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use telemu_engine::Telemetry;

/// One emitted line: who is driving, when, and the full snapshot.
#[derive(Debug, Serialize)]
pub struct StatsRecord<'a> {
    pub driver: &'a str,
    pub vin: &'a str,
    pub timestamp: DateTime<Utc>,
    pub telemetry: Telemetry,
}

impl<'a> StatsRecord<'a> {
    #[must_use]
    pub fn now(driver: &'a str, vin: &'a str, telemetry: Telemetry) -> Self {
        Self {
            driver,
            vin,
            timestamp: Utc::now(),
            telemetry,
        }
    }
}

pub enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    /// Serialize `record` as a single line and flush it so consumers tailing
    /// the output see it immediately.
    pub fn emit(&mut self, record: &StatsRecord<'_>) -> Result<()> {
        serde_json::to_writer(self.writer(), record).context("failed to encode stats record")?;
        writeln!(self.writer())?;
        self.writer().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemu_engine::{EmulatorConfig, VehicleEmulator};

    const MAP: &str = include_str!("../../assets/map.json");

    #[test]
    fn record_serializes_flat_telemetry() {
        let emu = VehicleEmulator::from_json(MAP, &EmulatorConfig::default()).unwrap();
        let record = StatsRecord::now("NoDriverUUID", "VIN123", emu.snapshot());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["driver"], "NoDriverUUID");
        assert_eq!(value["vin"], "VIN123");
        assert!(value["timestamp"].is_string());
        assert_eq!(value["telemetry"]["tirepressrl"], 27);
        assert!(value["telemetry"]["in_rectangle"].is_null());
    }

    #[test]
    fn file_target_writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "telemu-report-{}.jsonl",
            std::process::id()
        ));
        let emu = VehicleEmulator::from_json(MAP, &EmulatorConfig::default()).unwrap();
        {
            let mut target = OutputTarget::new(Some(path.clone())).unwrap();
            target.emit(&StatsRecord::now("d", "v", emu.snapshot())).unwrap();
            target.emit(&StatsRecord::now("d", "v", emu.snapshot())).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["driver"], "d");
        }
    }
}
