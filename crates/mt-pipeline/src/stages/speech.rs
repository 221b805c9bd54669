use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mt_ai::{resolve_device, transcribe_audio, SpeechEngine, SpeechRequest};

use crate::stage::{TranscribeSettings, Transcriber};

/// Transcribes through a [`SpeechEngine`], resolving `auto` devices per call.
#[derive(Clone)]
pub struct SpeechTranscriber {
    engine: Arc<dyn SpeechEngine>,
}

impl SpeechTranscriber {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Transcriber for SpeechTranscriber {
    async fn transcribe(&self, audio: &Path, settings: &TranscribeSettings) -> mt_core::Result<String> {
        let request = SpeechRequest::new(settings.model.clone())
            .language(settings.language.clone())
            .device(resolve_device(Some(&settings.device)));
        transcribe_audio(self.engine.as_ref(), audio, &request).await
    }
}
