use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Key a script uses to report a thrown exception instead of a value.
pub const BRIDGE_ERROR_KEY: &str = "__bridgeError";

type Pending = HashMap<String, oneshot::Sender<Value>>;

/// Matches replies coming back through `print_bridge_reply` to the request
/// that is waiting for them.
#[derive(Clone, Default)]
pub struct ReplyBridge {
    pending: Arc<Mutex<Pending>>,
}

pub struct PendingReply {
    pub id: String,
    rx: oneshot::Receiver<Value>,
    bridge: ReplyBridge,
}

impl ReplyBridge {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn register(&self) -> PendingReply {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.clone(), tx);
        PendingReply {
            id,
            rx,
            bridge: self.clone(),
        }
    }

    /// Delivers a reply. Unknown or already-answered ids are ignored.
    pub fn resolve(&self, id: &str, value: Value) -> bool {
        match self.lock().remove(id) {
            Some(tx) => tx.send(value).is_ok(),
            None => {
                log::debug!("dropping reply for unknown bridge request {id}");
                false
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }
}

impl PendingReply {
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<Value> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, &mut self.rx)
                .await
                .map_err(|_| anyhow!("no reply to bridge request {} within {limit:?}", self.id))?,
            None => (&mut self.rx).await,
        };
        let value = received.map_err(|_| anyhow!("bridge request {} was abandoned", self.id))?;

        if let Some(message) = value.get(BRIDGE_ERROR_KEY) {
            bail!("script error: {}", message.as_str().unwrap_or("unknown"));
        }
        Ok(value)
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.bridge.lock().remove(&self.id);
    }
}
