//! Shared application state.
//!
//! Holds the playback queue and the collaborator handles used by handlers.

use std::sync::Arc;

use crate::events::EventBus;
use crate::models::StatusResponse;
use crate::queue_service::QueueService;
use crate::search::SearchProvider;
use crate::volume::VolumeController;

/// Top-level application state shared across handlers.
pub struct AppState {
    /// Fixed identifier reported in status responses.
    pub node_id: String,
    /// Playback queue (sole owner of pending/current).
    pub(crate) queue: QueueService,
    pub search: Arc<dyn SearchProvider>,
    pub volume: Arc<dyn VolumeController>,
    pub events: EventBus,
}

impl AppState {
    pub(crate) fn new(
        node_id: String,
        queue: QueueService,
        search: Arc<dyn SearchProvider>,
        volume: Arc<dyn VolumeController>,
        events: EventBus,
    ) -> Self {
        Self {
            node_id,
            queue,
            search,
            volume,
            events,
        }
    }

    /// Build the `/api/status` payload from a queue snapshot.
    pub fn status(&self) -> StatusResponse {
        let snapshot = self.queue.status();
        StatusResponse {
            now_playing: snapshot.current,
            queue: snapshot.pending,
            node: self.node_id.clone(),
        }
    }
}
