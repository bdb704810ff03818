//! JSON-lines occupancy reports, one object per processed frame.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::occupancy::SlotState;
use crate::pipeline::FrameOutcome;
use crate::summary::FrameSummary;

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    vehicles: usize,
    summary: &'a FrameSummary,
    slots: &'a [SlotState],
    vacated: &'a [usize],
    messages: Vec<String>,
}

pub struct ReportWriter<W: Write> {
    out: W,
    frames_written: u64,
}

impl ReportWriter<BufWriter<File>> {
    /// Append to `path`, creating it and its parent directory if needed.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    anyhow!("failed to create report directory {}: {}", parent.display(), e)
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open report file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frames_written: 0,
        }
    }

    pub fn write(&mut self, outcome: &FrameOutcome) -> Result<()> {
        let record = FrameRecord {
            frame: outcome.frame_index,
            vehicles: outcome.detections.len(),
            summary: &outcome.report.summary,
            slots: &outcome.report.slots,
            vacated: &outcome.vacated,
            messages: outcome.report.summary.messages(),
        };
        serde_json::to_writer(&mut self.out, &record).context("failed to encode frame report")?;
        self.out
            .write_all(b"\n")
            .context("failed to write frame report")?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("failed to flush report")
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
