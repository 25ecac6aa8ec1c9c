use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cardiregen_core::error::{AnalysisError, Result};
use cardiregen_core::session::{FrameBlob, PhaseResult};
use cardiregen_core::submitter::FrameSubmitter;

// Mock FrameSubmitter for testing: answers by frame name and records calls.
pub struct MockSubmitter {
    responses: Mutex<HashMap<String, Result<PhaseResult>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_volume(self, frame_name: &str, volume_ml: f64) -> Self {
        let result = PhaseResult {
            volume_ml,
            rv_volume_ml: None,
            mesh_payload: None,
            source_name: frame_name.to_string(),
        };
        self.responses
            .lock()
            .unwrap()
            .insert(frame_name.to_string(), Ok(result));
        self
    }

    pub fn respond_error(self, frame_name: &str, error: AnalysisError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(frame_name.to_string(), Err(error));
        self
    }

    /// Frame names submitted so far, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, endpoint)| endpoint.clone())
            .collect()
    }
}

#[async_trait]
impl FrameSubmitter for MockSubmitter {
    async fn submit(&self, blob: &FrameBlob, endpoint: &str) -> Result<PhaseResult> {
        self.calls
            .lock()
            .unwrap()
            .push((blob.name.clone(), endpoint.to_string()));

        self.responses
            .lock()
            .unwrap()
            .get(&blob.name)
            .cloned()
            .unwrap_or_else(|| Err(AnalysisError::connectivity("no scripted response")))
    }
}

pub fn frame(name: &str) -> FrameBlob {
    FrameBlob::new(name, vec![0x1f, 0x8b, 0x08])
}
