use super::{Outcome, Request};
use crate::error::DeliveryError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";

/// One request in flight: the payload and where its single reply goes.
#[derive(Debug)]
pub struct Envelope {
    pub payload: Value,
    pub reply: oneshot::Sender<Value>,
}

impl Envelope {
    /// Answer the request. A caller that stopped waiting is not an error.
    pub fn respond(self, reply: Value) {
        if self.reply.send(reply).is_err() {
            tracing::debug!("reply dropped, sender went away");
        }
    }
}

/// Map a raw payload onto a request family.
///
/// Tags outside the family get the uniform unknown-type failure; a known tag
/// with a bad body fails with the decode error.
pub fn decode<R: Request>(payload: Value) -> Result<R, Outcome> {
    let tag = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !R::TAGS.contains(&tag.as_str()) {
        tracing::debug!("unknown message type {:?}", tag);
        return Err(Outcome::failed(UNKNOWN_MESSAGE_TYPE));
    }
    serde_json::from_value(payload).map_err(|e| {
        tracing::warn!("malformed {} message: {}", tag, e);
        Outcome::failed(e.to_string())
    })
}

/// Sending side of a context's inbox 📨
#[derive(Debug, Clone)]
pub struct ContextHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ContextHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Deliver `payload` and wait for the one reply.
    pub async fn request(&self, payload: Value) -> Result<Value, DeliveryError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { payload, reply })
            .map_err(|_| DeliveryError::ContextClosed)?;
        rx.await.map_err(|_| DeliveryError::NoReply)
    }

    pub async fn send<T: Serialize>(&self, message: &T) -> Result<Value, DeliveryError> {
        let payload =
            serde_json::to_value(message).map_err(|e| DeliveryError::Encode(e.to_string()))?;
        self.request(payload).await
    }
}

/// Page contexts by tab id. A tab only has an entry while its content
/// script is loaded.
#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    tabs: Arc<Mutex<HashMap<u32, ContextHandle>>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tabs(&self) -> MutexGuard<'_, HashMap<u32, ContextHandle>> {
        self.tabs.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Attach a freshly loaded context, replacing the previous page of the tab.
    pub fn register(&self, tab_id: u32, handle: ContextHandle) {
        self.tabs().insert(tab_id, handle);
    }

    pub fn unregister(&self, tab_id: u32) -> bool {
        self.tabs().remove(&tab_id).is_some()
    }

    pub fn handle(&self, tab_id: u32) -> Option<ContextHandle> {
        self.tabs().get(&tab_id).cloned()
    }

    pub async fn send_to_tab<T: Serialize>(
        &self,
        tab_id: u32,
        message: &T,
    ) -> Result<Value, DeliveryError> {
        let handle = self.handle(tab_id).ok_or(DeliveryError::NoReceiver(tab_id))?;
        handle.send(message).await
    }

    /// Like `send_to_tab`, with every delivery failure read as "no response".
    pub async fn ask<T: Serialize>(&self, tab_id: u32, message: &T) -> Option<Value> {
        match self.send_to_tab(tab_id, message).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::debug!("tab {}: no response ({})", tab_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ContentRequest;
    use serde_json::json;

    #[test]
    fn test_decode_unknown_tag() {
        let err = decode::<ContentRequest>(json!({"type": "RELOAD_EVERYTHING"})).unwrap_err();
        assert_eq!(err, Outcome::failed(UNKNOWN_MESSAGE_TYPE));

        let err = decode::<ContentRequest>(json!({"no": "tag"})).unwrap_err();
        assert_eq!(err.error.as_deref(), Some(UNKNOWN_MESSAGE_TYPE));
    }

    #[test]
    fn test_decode_known_tag_with_bad_body() {
        let err = decode::<ContentRequest>(json!({"type": "JUMP_TO_TIME", "time": "soon"}))
            .unwrap_err();
        assert!(!err.success);
        assert_ne!(err.error.as_deref(), Some(UNKNOWN_MESSAGE_TYPE));
    }

    #[tokio::test]
    async fn test_request_reply_round_trip() {
        let (handle, mut inbox) = ContextHandle::channel();
        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let echoed = envelope.payload.clone();
                envelope.respond(json!({"echo": echoed}));
            }
        });

        let reply = handle.request(json!({"type": "PING"})).await.unwrap();
        assert_eq!(reply, json!({"echo": {"type": "PING"}}));
    }

    #[tokio::test]
    async fn test_delivery_failures() {
        let registry = TabRegistry::new();
        assert_eq!(
            registry.send_to_tab(7, &ContentRequest::GetStatus).await,
            Err(DeliveryError::NoReceiver(7))
        );

        let (handle, inbox) = ContextHandle::channel();
        registry.register(7, handle);
        drop(inbox);
        assert_eq!(
            registry.send_to_tab(7, &ContentRequest::GetStatus).await,
            Err(DeliveryError::ContextClosed)
        );
        assert!(registry.ask(7, &ContentRequest::GetStatus).await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_reply_is_no_reply() {
        let (handle, mut inbox) = ContextHandle::channel();
        tokio::spawn(async move {
            if let Some(envelope) = inbox.recv().await {
                drop(envelope);
            }
        });
        assert_eq!(
            handle.request(json!({"type": "GET_STATUS"})).await,
            Err(DeliveryError::NoReply)
        );
    }
}
