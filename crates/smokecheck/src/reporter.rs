//! Reporter - step annotations and evidence attachments.
//!
//! Verifications annotate steps and attach evidence (screenshots on success,
//! text notes on failure) through the [`Reporter`] trait. Two sinks ship
//! with the crate:
//!
//! - [`EvidenceLog`]: in-memory, for assertions in tests
//! - [`DirectoryReporter`]: one file per attachment plus an `evidence.json`
//!   index and an `environment.properties` file
//!
//! Reporting failures are logged by callers and never fail a verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::result::SmokeResult;

/// File name of the attachment index
pub const INDEX_FILE: &str = "evidence.json";

/// File name of the environment description
pub const ENVIRONMENT_FILE: &str = "environment.properties";

/// Failure mode for scenario execution
///
/// Andon Cord: Stop the line on first failure
/// CollectAll: Run every scenario and report all failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop on first failed scenario
    AndonCord,
    /// Run everything
    #[default]
    CollectAll,
}

/// Scenario status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Every check held
    Passed,
    /// At least one check failed
    Failed,
    /// Scenario errored before it could finish
    Broken,
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Failed check messages, in order
    pub failures: Vec<String>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl ScenarioReport {
    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Evidence payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// PNG screenshot
    Png(Vec<u8>),
    /// Plain text note
    Text(String),
}

impl Attachment {
    /// File extension
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png(_) => "png",
            Self::Text(_) => "txt",
        }
    }

    /// MIME type
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Png(_) => "image/png",
            Self::Text(_) => "text/plain",
        }
    }

    /// Raw bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Png(data) => data,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// Whether this is a screenshot
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Png(_))
    }
}

/// Sink for step annotations and evidence
pub trait Reporter: Send + Sync {
    /// Annotate the start of a step
    fn step(&self, label: &str);

    /// Attach a named piece of evidence
    fn attach(&self, name: &str, attachment: Attachment) -> SmokeResult<()>;
}

/// Attachment recorded by [`EvidenceLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    /// Attachment name
    pub name: String,
    /// Payload
    pub attachment: Attachment,
}

#[derive(Debug, Default)]
struct LogState {
    steps: Vec<String>,
    evidence: Vec<Evidence>,
}

/// In-memory reporter
#[derive(Debug, Default)]
pub struct EvidenceLog {
    state: Mutex<LogState>,
}

impl EvidenceLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step labels in order
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        self.lock().steps.clone()
    }

    /// Attachments in order
    #[must_use]
    pub fn evidence(&self) -> Vec<Evidence> {
        self.lock().evidence.clone()
    }

    /// Attachment names in order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().evidence.iter().map(|e| e.name.clone()).collect()
    }

    /// Attachment by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Attachment> {
        self.lock()
            .evidence
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.attachment.clone())
    }

    /// Text of a text attachment
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Attachment::Text(text) => Some(text),
            Attachment::Png(_) => None,
        }
    }
}

impl Reporter for EvidenceLog {
    fn step(&self, label: &str) {
        self.lock().steps.push(label.to_string());
    }

    fn attach(&self, name: &str, attachment: Attachment) -> SmokeResult<()> {
        self.lock().evidence.push(Evidence {
            name: name.to_string(),
            attachment,
        });
        Ok(())
    }
}

/// Step entry in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step label
    pub label: String,
    /// When the step started
    pub at: DateTime<Utc>,
}

/// Attachment entry in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Attachment name
    pub name: String,
    /// File name relative to the results directory
    pub file: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: usize,
    /// Step active when the attachment was made
    pub step: Option<String>,
    /// When it was attached
    pub at: DateTime<Utc>,
}

/// Contents of `evidence.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceIndex {
    /// Run identifier
    pub run_id: Uuid,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Steps in order
    pub steps: Vec<StepRecord>,
    /// Attachments in order
    pub attachments: Vec<AttachmentRecord>,
}

/// Reporter writing evidence files into a results directory
#[derive(Debug)]
pub struct DirectoryReporter {
    dir: PathBuf,
    index: Mutex<EvidenceIndex>,
}

impl DirectoryReporter {
    /// Create the directory (if needed) and start a run
    pub fn create(dir: impl Into<PathBuf>) -> SmokeResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let reporter = Self {
            dir,
            index: Mutex::new(EvidenceIndex {
                run_id: Uuid::new_v4(),
                started_at: Utc::now(),
                steps: Vec::new(),
                attachments: Vec::new(),
            }),
        };
        reporter.flush()?;
        Ok(reporter)
    }

    fn lock(&self) -> MutexGuard<'_, EvidenceIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Results directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run identifier
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.lock().run_id
    }

    /// Snapshot of the index
    #[must_use]
    pub fn index(&self) -> EvidenceIndex {
        self.lock().clone()
    }

    /// Rewrite `evidence.json`
    pub fn flush(&self) -> SmokeResult<()> {
        let json = serde_json::to_string_pretty(&*self.lock())?;
        std::fs::write(self.dir.join(INDEX_FILE), json)?;
        Ok(())
    }

    /// Write `environment.properties` as sorted `key=value` lines
    pub fn write_environment(&self, properties: &BTreeMap<String, String>) -> SmokeResult<PathBuf> {
        let mut out = String::new();
        for (key, value) in properties {
            let _ = writeln!(out, "{key}={}", value.replace('\n', " "));
        }
        let path = self.dir.join(ENVIRONMENT_FILE);
        std::fs::write(&path, out)?;
        Ok(path)
    }
}

/// Lowercase, keep alphanumerics, map everything else to `_`
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if stem.is_empty() {
        "attachment".to_string()
    } else {
        stem
    }
}

impl Reporter for DirectoryReporter {
    fn step(&self, label: &str) {
        info!(step = label, "step");
        self.lock().steps.push(StepRecord {
            label: label.to_string(),
            at: Utc::now(),
        });
    }

    fn attach(&self, name: &str, attachment: Attachment) -> SmokeResult<()> {
        let file = {
            let mut index = self.lock();
            let file = format!(
                "{:03}-{}.{}",
                index.attachments.len() + 1,
                file_stem(name),
                attachment.extension()
            );
            let step = index.steps.last().map(|s| s.label.clone());
            index.attachments.push(AttachmentRecord {
                name: name.to_string(),
                file: file.clone(),
                mime_type: attachment.mime_type().to_string(),
                size_bytes: attachment.bytes().len(),
                step,
                at: Utc::now(),
            });
            file
        };
        std::fs::write(self.dir.join(&file), attachment.bytes())?;
        self.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod evidence_log_tests {
        use super::*;

        #[test]
        fn test_records_steps_and_attachments() {
            let log = EvidenceLog::new();
            log.step("Verify header");
            log.attach("header", Attachment::Png(vec![1, 2])).unwrap();
            log.attach("missing_tab_news", Attachment::Text("absent".into()))
                .unwrap();
            assert_eq!(log.steps(), vec!["Verify header".to_string()]);
            assert_eq!(log.names(), vec!["header", "missing_tab_news"]);
            assert!(log.get("header").unwrap().is_image());
            assert_eq!(log.text("missing_tab_news").as_deref(), Some("absent"));
            assert!(log.text("header").is_none());
        }
    }

    mod directory_reporter_tests {
        use super::*;

        #[test]
        fn test_writes_files_and_index() {
            let tmp = TempDir::new().unwrap();
            let reporter = DirectoryReporter::create(tmp.path().join("results")).unwrap();
            reporter.step("Open login modal");
            reporter
                .attach("login modal opened", Attachment::Png(b"png".to_vec()))
                .unwrap();
            reporter
                .attach("email_input_not_visible", Attachment::Text("no".into()))
                .unwrap();

            let dir = reporter.dir().to_path_buf();
            assert!(dir.join("001-login_modal_opened.png").exists());
            assert_eq!(
                std::fs::read_to_string(dir.join("002-email_input_not_visible.txt")).unwrap(),
                "no"
            );

            let json = std::fs::read_to_string(dir.join(INDEX_FILE)).unwrap();
            let index: EvidenceIndex = serde_json::from_str(&json).unwrap();
            assert_eq!(index.run_id, reporter.run_id());
            assert_eq!(index.steps.len(), 1);
            assert_eq!(index.attachments.len(), 2);
            assert_eq!(index.attachments[0].mime_type, "image/png");
            assert_eq!(index.attachments[1].step.as_deref(), Some("Open login modal"));
        }

        #[test]
        fn test_environment_properties() {
            let tmp = TempDir::new().unwrap();
            let reporter = DirectoryReporter::create(tmp.path()).unwrap();
            let mut props = BTreeMap::new();
            props.insert("Browser".to_string(), "Chromium".to_string());
            props.insert("Base.URL".to_string(), "https://habr.com".to_string());
            let path = reporter.write_environment(&props).unwrap();
            let text = std::fs::read_to_string(path).unwrap();
            assert_eq!(text, "Base.URL=https://habr.com\nBrowser=Chromium\n");
        }

        #[test]
        fn test_file_stem() {
            assert_eq!(file_stem("Social GitHub"), "social_github");
            assert_eq!(file_stem(""), "attachment");
            assert_eq!(file_stem("вход"), "вход");
        }
    }
}
