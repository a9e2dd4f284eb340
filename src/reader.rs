use crate::record::{self, LineShape, ParseError, Record};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read results file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A results line that was skipped, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line: usize,
    pub content: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: ParseError,
}

fn serialize_reason<S: serde::Serializer>(reason: &ParseError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReadOutcome {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedLine>,
    pub header_skipped: bool,
}

/// Parse results text that is already in memory.
pub fn parse_results(text: &str) -> ReadOutcome {
    let mut outcome = ReadOutcome::default();
    let mut shapes = Vec::new();
    let mut seen_content = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let first = !seen_content;
        seen_content = true;
        if first && record::is_header(line) {
            debug!("skipping header line");
            outcome.header_skipped = true;
            continue;
        }
        match record::parse_line(line) {
            Ok((record, shape)) => {
                shapes.push(shape);
                outcome.records.push(record);
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "rejecting malformed results line");
                outcome.rejected.push(RejectedLine {
                    line: line_no,
                    content: line.to_string(),
                    reason,
                });
            }
        }
    }

    let count = |shape: LineShape| shapes.iter().filter(|s| **s == shape).count();
    debug!(
        plain = count(LineShape::Plain),
        imaged = count(LineShape::Imaged),
        boxed = count(LineShape::Boxed),
        "line shapes"
    );
    outcome
}

/// Read and parse a results file. An unreadable file is fatal.
pub fn read_results(path: &Path) -> Result<ReadOutcome, ReadError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = parse_results(&text);
    info!(
        path = %path.display(),
        records = outcome.records.len(),
        rejected = outcome.rejected.len(),
        header = outcome.header_skipped,
        "read results file"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_header_and_blank_lines() {
        let text = "threshold\texpected\tdetected\texpected_box\tdetected_box\n\
                    0.5\t1\t1\tA\tB\n\
                    \n\
                    0.5\t0\t1\tNone\tB\n";
        let outcome = parse_results(text);
        assert!(outcome.header_skipped);
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn header_after_leading_blank_lines_is_skipped() {
        let outcome = parse_results("\n  \nthreshold\texpected\tdetected\n0.5\t1\t1\n");
        assert!(outcome.header_skipped);
        assert_eq!(outcome.records, vec![Record::new("0.5", true, true)]);
    }

    #[test]
    fn header_only_recognized_before_data() {
        let outcome = parse_results("0.5\t1\t1\nthreshold\texpected\tdetected\n");
        assert!(!outcome.header_skipped);
        // Later "expected"/"detected" tokens are ordinary truthy data.
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].parameter, "threshold");
    }

    #[test]
    fn malformed_lines_are_rejected_not_fatal() {
        let outcome = parse_results("0.5\t1\t1\nbroken\n0.5\t0\t0\n");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.rejected,
            vec![RejectedLine {
                line: 2,
                content: "broken".to_string(),
                reason: ParseError::FieldCount(1),
            }]
        );
    }

    #[test]
    fn handles_crlf_input() {
        let outcome = parse_results("0.5\t1\t0\r\n0.5\t0\t0\r\n");
        assert_eq!(outcome.records.len(), 2);
        assert!(!outcome.records[0].detected);
        assert!(!outcome.records[1].detected);
    }

    #[test]
    fn reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold\timageid\texpected\tdetected").unwrap();
        writeln!(file, "0.5\t17\t1\t1\t").unwrap();
        writeln!(file, "0.5\t17\t0\t0\t").unwrap();
        let outcome = read_results(file.path()).unwrap();
        assert!(outcome.header_skipped);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].image.as_deref(), Some("17"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read_results(&path).unwrap_err();
        let ReadError::Io { path: reported, .. } = &err;
        assert_eq!(reported, &path);
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn rejected_line_serializes_reason_as_text() {
        let rejected = RejectedLine {
            line: 3,
            content: "x".to_string(),
            reason: ParseError::EmptyParameter,
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["reason"], "empty parameter");
    }
}
