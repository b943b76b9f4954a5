//! In-process message bus connecting the three execution contexts.
//!
//! Each context registers one endpoint. Requests are one-shot
//! request/response pairs; a request to an unregistered context fails with
//! `NoReceiver`, the condition that drives the single inject-retry in the
//! coordinator and background paths.

use async_trait::async_trait;
use domgrab_core::protocol::{BusRequest, BusResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The three isolated execution contexts. They share no memory and
/// communicate only through the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextId {
    Background,
    ContentScript,
    Panel,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum TransportError {
    #[error("Receiving end does not exist: {0:?}")]
    NoReceiver(ContextId),
}

/// A context's message handler. Implementations must answer every request;
/// unrecognized actions get `BusResponse::unhandled` so the sender's channel
/// is never left open indefinitely.
#[async_trait]
pub trait MessageEndpoint: Send + Sync {
    async fn handle(&self, request: BusRequest) -> BusResponse;
}

/// Routes requests to registered endpoints. Cloning shares the registry, so
/// every context holds the same router.
#[derive(Clone, Default)]
pub struct MessageRouter {
    endpoints: Arc<RwLock<HashMap<ContextId, Arc<dyn MessageEndpoint>>>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, context: ContextId, endpoint: Arc<dyn MessageEndpoint>) {
        tracing::debug!(?context, "registering bus endpoint");
        self.endpoints.write().await.insert(context, endpoint);
    }

    /// Remove a context's endpoint, e.g. when devtools closes or a
    /// navigation discards the content script.
    pub async fn unregister(&self, context: ContextId) {
        tracing::debug!(?context, "unregistering bus endpoint");
        self.endpoints.write().await.remove(&context);
    }

    pub async fn is_registered(&self, context: ContextId) -> bool {
        self.endpoints.read().await.contains_key(&context)
    }

    pub async fn request(
        &self,
        target: ContextId,
        request: BusRequest,
    ) -> Result<BusResponse, TransportError> {
        let endpoint = {
            let endpoints = self.endpoints.read().await;
            endpoints
                .get(&target)
                .cloned()
                .ok_or(TransportError::NoReceiver(target))?
        };
        tracing::trace!(?target, action = request.action(), "bus request");
        Ok(endpoint.handle(request).await)
    }
}

/// Injects the picker script into the page, re-establishing the
/// content-script endpoint after a navigation or a cold start.
#[async_trait]
pub trait ScriptInjector: Send + Sync {
    async fn inject(&self) -> Result<(), domgrab_core::error::CaptureError>;
}
