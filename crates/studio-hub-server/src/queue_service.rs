//! Queue management + advance logic.
//!
//! Owns `pending`/`current` and decides when to hand the next track to the
//! stream launcher. Every mutation, including the launch it may trigger,
//! happens under one lock so two racing enqueues can never start two writers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::events::EventBus;
use crate::models::Track;
use crate::process::CollaboratorError;
use crate::stream_launcher::StreamLauncher;

/// Queue contents guarded by [`QueueService`].
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pending: VecDeque<Track>,
    current: Option<Track>,
    last_id: u64,
}

/// Read-only copy of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueueSnapshot {
    pub current: Option<Track>,
    pub pending: Vec<Track>,
}

/// Errors returned by queue operations.
#[derive(Debug)]
pub(crate) enum QueueError {
    /// The launcher could not start a writer for `track`; the queue is idle.
    Launch {
        track: Track,
        source: CollaboratorError,
    },
}

#[derive(Clone)]
pub(crate) struct QueueService {
    state: Arc<Mutex<QueueState>>,
    launcher: Arc<dyn StreamLauncher>,
    events: EventBus,
}

impl QueueService {
    pub(crate) fn new(launcher: Arc<dyn StreamLauncher>, events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            launcher,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a track; start it right away when nothing is playing.
    pub(crate) fn enqueue(
        &self,
        title: Option<String>,
        url: String,
        user: Option<String>,
    ) -> Result<Track, QueueError> {
        let mut queue = self.lock();
        let id = next_track_id(&mut queue);
        let track = Track { title, url, user, id };
        queue.pending.push_back(track.clone());
        tracing::info!(
            id,
            title = track.title.as_deref().unwrap_or("-"),
            user = track.user.as_deref().unwrap_or("-"),
            pending = queue.pending.len(),
            "track queued"
        );

        let result = if queue.current.is_none() {
            self.advance_locked(&mut queue).map(|_| track)
        } else {
            Ok(track)
        };
        drop(queue);
        self.events.queue_changed();
        result
    }

    /// Finish the current track and promote the next one (or go idle).
    pub(crate) fn advance(&self) -> Result<Option<Track>, QueueError> {
        let mut queue = self.lock();
        let result = self.advance_locked(&mut queue);
        drop(queue);
        self.events.queue_changed();
        result
    }

    /// Snapshot `current` and `pending`.
    pub(crate) fn status(&self) -> QueueSnapshot {
        let queue = self.lock();
        QueueSnapshot {
            current: queue.current.clone(),
            pending: queue.pending.iter().cloned().collect(),
        }
    }

    /// Stop the running stream without touching the queue (shutdown path).
    pub(crate) fn stop_stream(&self) {
        self.launcher.stop();
    }

    /// Promote the head of `pending`. A track whose launch fails is dropped
    /// and the next one is tried, so the queue never sits idle with tracks
    /// waiting. Fails only when every remaining track failed to launch.
    fn advance_locked(&self, queue: &mut QueueState) -> Result<Option<Track>, QueueError> {
        let mut failure = None;
        while let Some(next) = queue.pending.pop_front() {
            match self.launcher.launch(&next) {
                Ok(()) => {
                    queue.current = Some(next.clone());
                    return Ok(Some(next));
                }
                Err(source) => {
                    tracing::warn!(
                        id = next.id,
                        url = %next.url,
                        error = %source,
                        "stream launch failed"
                    );
                    queue.current = None;
                    failure = Some(QueueError::Launch { track: next, source });
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        if queue.current.take().is_some() {
            self.launcher.stop();
            tracing::info!("queue drained; idle");
        }
        Ok(None)
    }
}

/// Enqueue timestamp in milliseconds, bumped to stay unique within the process.
fn next_track_id(queue: &mut QueueState) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let id = now.max(queue.last_id + 1);
    queue.last_id = id;
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestLauncher {
        launches: Mutex<Vec<String>>,
        stops: Mutex<usize>,
        fail: bool,
        fail_urls: Vec<&'static str>,
    }

    impl TestLauncher {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn failing_for(urls: &[&'static str]) -> Self {
            Self {
                fail_urls: urls.to_vec(),
                ..Self::default()
            }
        }

        fn launches(&self) -> Vec<String> {
            self.launches.lock().unwrap().clone()
        }
    }

    impl StreamLauncher for TestLauncher {
        fn launch(&self, track: &Track) -> Result<(), CollaboratorError> {
            if self.fail || self.fail_urls.iter().any(|u| *u == track.url) {
                return Err(CollaboratorError::Unavailable {
                    program: "yt-dlp".to_string(),
                    reason: "not installed".to_string(),
                });
            }
            self.launches.lock().unwrap().push(track.url.clone());
            Ok(())
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
        }
    }

    fn make_service(launcher: Arc<TestLauncher>) -> QueueService {
        QueueService::new(launcher, EventBus::new())
    }

    fn enqueue(service: &QueueService, title: &str, url: &str) -> Track {
        service
            .enqueue(Some(title.to_string()), url.to_string(), Some("alice".to_string()))
            .unwrap()
    }

    fn titles(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().filter_map(|t| t.title.as_deref()).collect()
    }

    #[test]
    fn enqueue_while_idle_launches_immediately() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());

        let track = enqueue(&service, "A", "u1");

        let status = service.status();
        assert_eq!(status.current, Some(track));
        assert!(status.pending.is_empty());
        assert_eq!(launcher.launches(), vec!["u1"]);
    }

    #[test]
    fn enqueue_while_playing_only_appends() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());

        enqueue(&service, "A", "u1");
        enqueue(&service, "B", "u2");

        let status = service.status();
        assert_eq!(status.current.as_ref().and_then(|t| t.title.as_deref()), Some("A"));
        assert_eq!(titles(&status.pending), vec!["B"]);
        assert_eq!(launcher.launches(), vec!["u1"]);
    }

    #[test]
    fn advance_preserves_fifo_order() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());
        for (title, url) in [("A", "u1"), ("B", "u2"), ("C", "u3"), ("D", "u4")] {
            enqueue(&service, title, url);
        }

        let mut played = Vec::new();
        while let Some(track) = service.advance().unwrap() {
            played.push(track.url);
        }

        assert_eq!(played, vec!["u2", "u3", "u4"]);
        assert_eq!(launcher.launches(), vec!["u1", "u2", "u3", "u4"]);
    }

    #[test]
    fn advance_on_empty_queue_goes_idle_without_launch() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());

        assert_eq!(service.advance().unwrap(), None);
        assert_eq!(service.status().current, None);
        assert!(launcher.launches().is_empty());
        assert_eq!(*launcher.stops.lock().unwrap(), 0);
    }

    #[test]
    fn advance_past_last_track_stops_stream() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());
        enqueue(&service, "A", "u1");

        assert_eq!(service.advance().unwrap(), None);

        assert_eq!(service.status().current, None);
        assert_eq!(*launcher.stops.lock().unwrap(), 1);
        assert_eq!(launcher.launches(), vec!["u1"]);
    }

    #[test]
    fn status_counts_after_enqueues_and_advances() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());
        for i in 0..5 {
            enqueue(&service, &format!("T{i}"), &format!("u{i}"));
        }
        // Five enqueues: one promoted on arrival, then two manual advances.
        service.advance().unwrap();
        let last = service.advance().unwrap().unwrap();

        let status = service.status();
        assert_eq!(status.pending.len(), 2);
        assert_eq!(status.current, Some(last));
        assert_eq!(titles(&status.pending), vec!["T3", "T4"]);
    }

    #[test]
    fn launch_failure_leaves_queue_idle() {
        let launcher = Arc::new(TestLauncher::failing());
        let service = make_service(launcher.clone());

        let err = service
            .enqueue(Some("A".to_string()), "u1".to_string(), None)
            .unwrap_err();

        let QueueError::Launch { track, source } = err;
        assert_eq!(track.url, "u1");
        assert_eq!(source.kind(), "collaborator_unavailable");
        let status = service.status();
        assert_eq!(status.current, None);
        assert!(status.pending.is_empty());
    }

    #[test]
    fn failed_launch_falls_through_to_next_pending_track() {
        let launcher = Arc::new(TestLauncher::failing_for(&["u2"]));
        let service = make_service(launcher.clone());
        for (title, url) in [("A", "u1"), ("B", "u2"), ("C", "u3")] {
            enqueue(&service, title, url);
        }

        let promoted = service.advance().unwrap().unwrap();

        assert_eq!(promoted.url, "u3");
        let status = service.status();
        assert_eq!(status.current, Some(promoted));
        assert!(status.pending.is_empty());
        assert_eq!(launcher.launches(), vec!["u1", "u3"]);
    }

    #[test]
    fn enqueue_after_failed_advance_plays_new_track() {
        let launcher = Arc::new(TestLauncher::failing_for(&["u2", "u3"]));
        let service = make_service(launcher.clone());
        for (title, url) in [("A", "u1"), ("B", "u2"), ("C", "u3")] {
            enqueue(&service, title, url);
        }

        let QueueError::Launch { track, .. } = service.advance().unwrap_err();
        assert_eq!(track.url, "u3");
        let status = service.status();
        assert_eq!(status.current, None);
        assert!(status.pending.is_empty());

        let queued = enqueue(&service, "D", "u4");

        let status = service.status();
        assert_eq!(status.current, Some(queued));
        assert!(status.pending.is_empty());
        assert_eq!(launcher.launches(), vec!["u1", "u4"]);
    }

    #[test]
    fn track_ids_are_unique_and_increasing() {
        let service = make_service(Arc::new(TestLauncher::default()));
        let ids: Vec<u64> = (0..50).map(|i| enqueue(&service, "x", &format!("u{i}")).id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn concurrent_enqueues_launch_once() {
        let launcher = Arc::new(TestLauncher::default());
        let service = make_service(launcher.clone());

        std::thread::scope(|scope| {
            for i in 0..100 {
                let service = service.clone();
                scope.spawn(move || {
                    service
                        .enqueue(Some(format!("T{i}")), format!("u{i}"), None)
                        .unwrap();
                });
            }
        });

        let launches = launcher.launches();
        assert_eq!(launches.len(), 1);
        let status = service.status();
        let current = status.current.expect("a track is playing");
        assert_eq!(current.url, launches[0]);
        assert_eq!(status.pending.len(), 99);
        assert!(status.pending.iter().all(|t| t.url != current.url));
        // Ids are assigned under the lock, so ascending ids mean arrival order.
        assert!(status.pending.windows(2).all(|w| w[0].id < w[1].id));
        assert!(status.pending.iter().all(|t| t.id > current.id));
    }
}
