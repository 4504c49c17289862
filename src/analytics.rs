use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Events reported to the analytics sink
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    GameFinished {
        username: String,
        score: u32,
        at: DateTime<Local>,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::GameFinished { .. } => "game_finished",
        }
    }
}

/// Fire-and-forget event destination
pub trait AnalyticsSink {
    fn record(&mut self, event: &AnalyticsEvent) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize)]
struct EventRow<'a> {
    date: String,
    event: &'a str,
    username: &'a str,
    score: u32,
}

/// Appends events to a CSV file, writing the header when the file is new
#[derive(Debug, Clone)]
pub struct CsvAnalytics {
    path: PathBuf,
}

impl CsvAnalytics {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AnalyticsSink for CsvAnalytics {
    fn record(&mut self, event: &AnalyticsEvent) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        // If the file doesn't exist, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        match event {
            AnalyticsEvent::GameFinished {
                username,
                score,
                at,
            } => writer.serialize(EventRow {
                date: at.to_rfc3339(),
                event: event.name(),
                username,
                score: *score,
            })?,
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn finished(name: &str, score: u32) -> AnalyticsEvent {
        AnalyticsEvent::GameFinished {
            username: name.to_string(),
            score,
            at: Local::now(),
        }
    }

    #[test]
    fn event_name() {
        assert_eq!(finished("Ann", 1).name(), "game_finished");
    }

    #[test]
    fn csv_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("events.csv");
        let mut sink = CsvAnalytics::new(&path);

        sink.record(&finished("Ann", 12)).unwrap();
        sink.record(&finished("Bo", 3)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["date", "event", "username", "score"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "game_finished");
        assert_eq!(&rows[0][2], "Ann");
        assert_eq!(&rows[0][3], "12");
        assert_eq!(&rows[1][2], "Bo");
    }
}
