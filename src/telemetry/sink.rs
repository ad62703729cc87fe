use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Append-only event log written to a temporary file and promoted to its
/// final name by a single rename once the match is over.
pub struct EventLogSink {
    temp_path: PathBuf,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines_written: u64,
}

impl EventLogSink {
    pub fn create(temp_path: &Path, final_path: &Path) -> Result<Self, String> {
        if let Some(parent_directory) = temp_path.parent() {
            if !parent_directory.as_os_str().is_empty() {
                std::fs::create_dir_all(parent_directory).map_err(|error| {
                    format!(
                        "Failed to create event log directory '{}': {error}",
                        parent_directory.display()
                    )
                })?;
            }
        }

        match std::fs::remove_file(final_path) {
            Ok(()) => {
                tracing::info!(
                    final_log = %final_path.display(),
                    "Deleted raw event log left over from a previous run"
                );
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                return Err(format!(
                    "Failed to delete previous event log '{}': {error}",
                    final_path.display()
                ));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(temp_path)
            .map_err(|error| {
                format!(
                    "Failed to create temporary event log '{}': {error}",
                    temp_path.display()
                )
            })?;

        tracing::info!(temp_log = %temp_path.display(), "Writing temporary event log");

        Ok(Self {
            temp_path: temp_path.to_path_buf(),
            final_path: final_path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            lines_written: 0,
        })
    }

    /// Writes one line and flushes it before returning.
    pub fn append(&mut self, line: &str) -> Result<(), String> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(format!(
                "Event log '{}' was already finalized",
                self.final_path.display()
            ));
        };

        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|error| {
                format!(
                    "Failed to write event log '{}': {error}",
                    self.temp_path.display()
                )
            })?;

        self.lines_written = self.lines_written.saturating_add(1);
        Ok(())
    }

    /// Closes the temporary file and renames it to the final path.
    ///
    /// Returns `Ok(false)` when the sink was already finalized.
    pub fn finalize(&mut self) -> Result<bool, String> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(false);
        };

        writer
            .flush()
            .and_then(|()| writer.get_ref().sync_all())
            .map_err(|error| {
                format!(
                    "Failed to flush event log '{}': {error}",
                    self.temp_path.display()
                )
            })?;
        drop(writer);

        tracing::info!(
            final_log = %self.final_path.display(),
            lines_written = self.lines_written,
            "Moving temporary event log into place"
        );

        std::fs::rename(&self.temp_path, &self.final_path).map_err(|error| {
            format!(
                "Failed to finalize event log '{}' -> '{}': {error}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;

        Ok(true)
    }

    pub fn is_finalized(&self) -> bool {
        self.writer.is_none()
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::EventLogSink;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn unique_temp_directory(label: &str) -> PathBuf {
        let timestamp_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let process_id = std::process::id();
        std::env::temp_dir().join(format!(
            "matchscribe_{label}_test_{process_id}_{timestamp_nanos}"
        ))
    }

    #[test]
    fn finalize_promotes_temp_file_with_lines_in_order() {
        let temp_directory = unique_temp_directory("sink_order");
        let temp_path = temp_directory.join("tmp-events.txt");
        let final_path = temp_directory.join("raw-events.txt");

        let mut sink = EventLogSink::create(&temp_path, &final_path)
            .expect("Expected sink creation to succeed");
        sink.append("PING\ttime\t0").expect("first append");
        sink.append("DAMAGE\ttime\t0.5\tdamage\t12").expect("second append");
        sink.append("GAME_END\ttime\t1").expect("third append");

        assert!(temp_path.exists(), "Temp log should exist while recording");
        assert!(!final_path.exists(), "Final log must not be visible before finalize");

        assert!(sink.finalize().expect("Expected finalize to succeed"));

        assert!(!temp_path.exists(), "Temp log should be gone after finalize");
        let content = std::fs::read_to_string(&final_path).expect("Failed to read final log");
        assert_eq!(
            content,
            "PING\ttime\t0\nDAMAGE\ttime\t0.5\tdamage\t12\nGAME_END\ttime\t1\n"
        );

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove test directory");
    }

    #[test]
    fn appended_lines_are_visible_before_finalize() {
        let temp_directory = unique_temp_directory("sink_flush");
        let temp_path = temp_directory.join("tmp-events.txt");
        let final_path = temp_directory.join("raw-events.txt");

        let mut sink = EventLogSink::create(&temp_path, &final_path)
            .expect("Expected sink creation to succeed");
        sink.append("ON_CREATE\ttime\t3").expect("append");

        let content = std::fs::read_to_string(&temp_path).expect("Failed to read temp log");
        assert_eq!(content, "ON_CREATE\ttime\t3\n");

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove test directory");
    }

    #[test]
    fn deletes_stale_final_log_on_create() {
        let temp_directory = unique_temp_directory("sink_stale");
        std::fs::create_dir_all(&temp_directory).expect("Failed to create test directory");
        let temp_path = temp_directory.join("tmp-events.txt");
        let final_path = temp_directory.join("raw-events.txt");
        std::fs::write(&final_path, "stale\n").expect("Failed to seed stale final log");
        std::fs::write(&temp_path, "half written\n").expect("Failed to seed stale temp log");

        let mut sink = EventLogSink::create(&temp_path, &final_path)
            .expect("Expected sink creation to succeed");
        assert!(!final_path.exists(), "Stale final log should be deleted");
        assert_eq!(
            std::fs::read_to_string(&temp_path).expect("Failed to read temp log"),
            "",
            "Temp log should be truncated"
        );

        sink.append("GAME_END\ttime\t1").expect("append");
        sink.finalize().expect("finalize");
        assert_eq!(
            std::fs::read_to_string(&final_path).expect("Failed to read final log"),
            "GAME_END\ttime\t1\n"
        );

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove test directory");
    }

    #[test]
    fn second_finalize_is_a_no_op_and_append_after_finalize_fails() {
        let temp_directory = unique_temp_directory("sink_twice");
        let temp_path = temp_directory.join("tmp-events.txt");
        let final_path = temp_directory.join("raw-events.txt");

        let mut sink = EventLogSink::create(&temp_path, &final_path)
            .expect("Expected sink creation to succeed");
        sink.append("GAME_END\ttime\t1").expect("append");

        assert!(sink.finalize().expect("first finalize"));
        assert!(!sink.finalize().expect("second finalize"));
        assert!(sink.is_finalized());
        assert!(sink.append("PING\ttime\t2").is_err());
        assert_eq!(sink.lines_written(), 1);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove test directory");
    }
}
