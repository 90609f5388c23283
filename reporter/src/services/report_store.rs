//! File-system persistence for rendered report artifacts

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::ReporterResult;
use crate::traits::ReportStore;

/// Real report store writing under a base directory
pub struct FsReportStore {
    base_dir: PathBuf,
}

impl FsReportStore {
    /// Store writing to ./output
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("./output"),
        }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn batch_file_path(&self, date: &str) -> PathBuf {
        self.base_dir.join(format!("radiology_reports_{date}.txt"))
    }

    fn case_file_path(&self, label: &str) -> PathBuf {
        self.base_dir.join("cases").join(format!("{label}.txt"))
    }

    async fn write(&self, path: &Path, content: &str) -> ReporterResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for FsReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for FsReportStore {
    async fn write_batch(&self, date: &str, content: &str) -> ReporterResult<PathBuf> {
        let path = self.batch_file_path(date);
        self.write(&path, content).await?;
        debug!("💾 Wrote batch artifact: {}", path.display());
        Ok(path)
    }

    async fn write_case(&self, label: &str, content: &str) -> ReporterResult<PathBuf> {
        let path = self.case_file_path(label);
        self.write(&path, content).await?;
        debug!("💾 Wrote case artifact: {}", path.display());
        Ok(path)
    }
}
