#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use voice_bridge::{ConnectParams, NativeEmitter, NativeError, NativeModule, Voice};

pub type Reply = Result<Value, NativeError>;

/// Native module whose connect replies are fed by the test.
pub struct ScriptedNative {
    replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Reply>>,
    pub connect_calls: AtomicUsize,
    pub version_calls: AtomicUsize,
    pub disconnects: Mutex<Vec<Option<String>>>,
    pub tokens: Mutex<Vec<String>>,
}

impl ScriptedNative {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Reply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let native = Arc::new(Self {
            replies: tokio::sync::Mutex::new(rx),
            connect_calls: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
            disconnects: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        });
        (native, tx)
    }

    pub fn connects(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn versions(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeModule for ScriptedNative {
    async fn connect(&self, token: &str, _params: &ConnectParams) -> Result<Value, NativeError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.to_string());
        let mut replies = self.replies.lock().await;
        replies
            .recv()
            .await
            .unwrap_or_else(|| Err(NativeError::new("reply channel closed")))
    }

    async fn get_version(&self) -> Result<String, NativeError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        Ok("5.2.1".to_string())
    }

    async fn disconnect(&self, call_sid: Option<&str>) -> Result<(), NativeError> {
        self.disconnects.lock().unwrap().push(call_sid.map(str::to_string));
        tokio::task::yield_now().await;
        Ok(())
    }
}

pub struct Harness {
    pub voice: Voice,
    pub emitter: NativeEmitter,
    pub native: Arc<ScriptedNative>,
    pub replies: mpsc::UnboundedSender<Reply>,
}

pub fn harness() -> Harness {
    let (native, replies) = ScriptedNative::new();
    let emitter = NativeEmitter::new();
    let voice = Voice::builder()
        .native(native.clone())
        .events(Arc::new(emitter.clone()))
        .build()
        .expect("voice builds");
    Harness { voice, emitter, native, replies }
}
