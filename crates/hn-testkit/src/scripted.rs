use std::sync::Mutex;

use async_trait::async_trait;
use hn_query::QueryDescriptor;
use hn_reactive::{
    decode_snapshot, decode_stream_handle, QueryMode, ReactiveClient, ReactiveError,
    ReactiveResult, Snapshot, StreamHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub mode: QueryMode,
    pub descriptor: QueryDescriptor,
}

/// Reactive client returning canned replies.
///
/// Raw bodies go through the real envelope decoders, so a malformed payload
/// scripted here fails exactly as it would over HTTP. An unscripted mode
/// answers `Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedReactiveClient {
    snapshot: Option<Result<Snapshot, ReactiveError>>,
    stream: Option<Result<StreamHandle, ReactiveError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedReactiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot_body(mut self, body: &str) -> Self {
        self.snapshot = Some(decode_snapshot(body.as_bytes()));
        self
    }

    pub fn with_snapshot_error(mut self, err: ReactiveError) -> Self {
        self.snapshot = Some(Err(err));
        self
    }

    pub fn with_stream_body(mut self, body: &str) -> Self {
        self.stream = Some(decode_stream_handle(body.as_bytes()));
        self
    }

    pub fn with_stream_error(mut self, err: ReactiveError) -> Self {
        self.stream = Some(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, mode: QueryMode) -> usize {
        self.calls().iter().filter(|c| c.mode == mode).count()
    }
}

#[async_trait]
impl ReactiveClient for ScriptedReactiveClient {
    async fn request(
        &self,
        descriptor: &QueryDescriptor,
        mode: QueryMode,
    ) -> Result<ReactiveResult, ReactiveError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                mode,
                descriptor: *descriptor,
            });
        }

        let unscripted = || ReactiveError::Unavailable(format!("no scripted {} reply", mode.as_str()));
        match mode {
            QueryMode::Snapshot => self
                .snapshot
                .clone()
                .unwrap_or_else(|| Err(unscripted()))
                .map(ReactiveResult::Snapshot),
            QueryMode::Stream => self
                .stream
                .clone()
                .unwrap_or_else(|| Err(unscripted()))
                .map(ReactiveResult::StreamHandle),
        }
    }
}
