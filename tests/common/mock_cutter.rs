/*!
 * Mock cutter for testing
 *
 * Records every job it receives instead of spawning ffmpeg, and fails the
 * segment indices it was told to fail.
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use subsplit::cutter::{CutJob, MediaCutter};
use subsplit::errors::CutError;

#[derive(Debug, Default)]
pub struct MockCutter {
    /// Jobs received, in call order
    pub calls: Mutex<Vec<CutJob>>,
    /// 1-based indices that should fail
    pub failing: HashSet<usize>,
}

impl MockCutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: indices.iter().copied().collect(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaCutter for MockCutter {
    async fn cut(&self, _media_file: &Path, job: &CutJob) -> Result<(), CutError> {
        self.calls.lock().unwrap().push(job.clone());

        if self.failing.contains(&job.index) {
            Err(CutError::Failed {
                status: "1".to_string(),
                stderr: format!("mock failure for segment {}", job.index),
            })
        } else {
            Ok(())
        }
    }
}
