use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::landmark_detector::{LandmarkDetector, RawFaceObservation};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid trace record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid timestamp {timestamp} on line {line}")]
    Timestamp { line: usize, timestamp: f64 },
}

/// One frame of a recorded detector session.
///
/// `error` reproduces a detection pass that failed on that frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Seconds since the session clock started.
    pub timestamp: f64,
    #[serde(default)]
    pub faces: Vec<RawFaceObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceRecord {
    /// Capture time as a duration; values no duration can hold saturate.
    pub fn timestamp(&self) -> Duration {
        match Duration::try_from_secs_f64(self.timestamp) {
            Ok(timestamp) => timestamp,
            Err(_) if self.timestamp > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }
}

/// Parses a JSON-lines trace, one [`TraceRecord`] per non-blank line.
pub fn parse_trace(text: &str) -> Result<Vec<TraceRecord>, TraceError> {
    let mut records = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let record: TraceRecord = serde_json::from_str(line).map_err(|source| TraceError::Parse {
            line: i + 1,
            source,
        })?;
        if Duration::try_from_secs_f64(record.timestamp).is_err() {
            return Err(TraceError::Timestamp {
                line: i + 1,
                timestamp: record.timestamp,
            });
        }
        records.push(record);
    }
    Ok(records)
}

pub fn read_trace(path: &Path) -> Result<Vec<TraceRecord>, TraceError> {
    let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&text)
}

/// Replays recorded landmark detections by frame index.
///
/// Frames past the end of the recording yield no faces.
pub struct RecordedLandmarkDetector {
    records: Arc<Vec<TraceRecord>>,
}

impl RecordedLandmarkDetector {
    pub fn new(records: Arc<Vec<TraceRecord>>) -> Self {
        Self { records }
    }
}

impl LandmarkDetector for RecordedLandmarkDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<RawFaceObservation>, Box<dyn std::error::Error>> {
        match self.records.get(frame.index()) {
            None => Ok(Vec::new()),
            Some(TraceRecord {
                error: Some(message),
                ..
            }) => Err(message.clone().into()),
            Some(record) => Ok(record.faces.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::rect::Rect;
    use std::io::Write;

    const TRACE: &str = r#"
{"timestamp": 0.0, "faces": []}
{"timestamp": 0.033, "faces": [{"bounding_box": {"x": 0.3, "y": 0.3, "width": 0.4, "height": 0.4}, "yaw": 0.05}]}

{"timestamp": 0.066, "error": "request failed"}
"#;

    fn frame(index: usize) -> Frame {
        Frame::empty(720, 1280, index)
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let records = parse_trace(TRACE).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].faces.is_empty());
        assert_eq!(records[1].faces[0].yaw, Some(0.05));
        assert!(records[1].faces[0].roll.is_none());
        assert_eq!(records[2].error.as_deref(), Some("request failed"));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_trace("{\"timestamp\": 0.0}\nnot json\n").unwrap_err();
        assert!(matches!(err, TraceError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_negative_timestamp() {
        let err = parse_trace("{\"timestamp\": -1.0}").unwrap_err();
        assert!(matches!(err, TraceError::Timestamp { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_timestamp_beyond_duration_range() {
        let err = parse_trace("{\"timestamp\": 0.0}\n{\"timestamp\": 1e20, \"faces\": []}\n")
            .unwrap_err();
        assert!(matches!(err, TraceError::Timestamp { line: 2, .. }));
    }

    #[test]
    fn test_out_of_range_timestamp_saturates() {
        let record = TraceRecord {
            timestamp: 1e20,
            ..TraceRecord::default()
        };
        assert_eq!(record.timestamp(), Duration::MAX);
    }

    #[test]
    fn test_timestamp_as_duration() {
        let record = TraceRecord {
            timestamp: 1.5,
            ..TraceRecord::default()
        };
        assert_eq!(record.timestamp(), Duration::from_millis(1500));
    }

    #[test]
    fn test_read_trace_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();
        let records = read_trace(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_read_trace_missing_file() {
        let err = read_trace(Path::new("/nonexistent/trace.jsonl")).unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }

    #[test]
    fn test_replays_faces_by_frame_index() {
        let records = Arc::new(parse_trace(TRACE).unwrap());
        let mut detector = RecordedLandmarkDetector::new(records);

        assert!(detector.detect(&frame(0)).unwrap().is_empty());
        let faces = detector.detect(&frame(1)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bounding_box, Rect::new(0.3, 0.3, 0.4, 0.4));
    }

    #[test]
    fn test_recorded_error_is_returned() {
        let records = Arc::new(parse_trace(TRACE).unwrap());
        let mut detector = RecordedLandmarkDetector::new(records);

        let err = detector.detect(&frame(2)).unwrap_err();
        assert_eq!(err.to_string(), "request failed");
    }

    #[test]
    fn test_past_end_returns_empty() {
        let mut detector = RecordedLandmarkDetector::new(Arc::new(Vec::new()));
        assert!(detector.detect(&frame(99)).unwrap().is_empty());
    }
}
