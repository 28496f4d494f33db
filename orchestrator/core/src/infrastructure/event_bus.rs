// Event Bus Implementation - Pub/Sub for Workflow Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Enables real-time progress streaming to the CLI and to observers in tests.
//
// In-memory only: events are lost on restart. The persisted checklist is the
// source of truth; the bus is advisory.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::WorkflowEvent;
use crate::domain::project::ProjectId;

/// Event bus for publishing and subscribing to workflow events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<WorkflowEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity. Capacity
    /// bounds how many events are buffered before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create an event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: WorkflowEvent) {
        debug!("publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("no subscribers listening to event");
        }
    }

    /// Subscribe to all workflow events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to events for a single project
    pub fn subscribe_project(&self, project_id: ProjectId) -> ProjectEventReceiver {
        ProjectEventReceiver {
            receiver: self.sender.subscribe(),
            project_id,
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for all workflow events
pub struct EventReceiver {
    receiver: broadcast::Receiver<WorkflowEvent>,
}

impl EventReceiver {
    /// Receive the next event (blocks until one is available)
    pub async fn recv(&mut self) -> Result<WorkflowEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<WorkflowEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to a single project's events
pub struct ProjectEventReceiver {
    receiver: broadcast::Receiver<WorkflowEvent>,
    project_id: ProjectId,
}

impl ProjectEventReceiver {
    /// Receive the next event for the subscribed project, skipping others
    pub async fn recv(&mut self) -> Result<WorkflowEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if event.project_id() == self.project_id {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("event bus is closed")]
    Closed,

    #[error("no events available")]
    Empty,

    #[error("receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn publish_subscribe_round_trip() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        let project_id = ProjectId::new();
        bus.publish(WorkflowEvent::ProjectStarted {
            project_id,
            at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            WorkflowEvent::ProjectStarted { project_id: id, .. } => assert_eq!(id, project_id),
            other => panic!("wrong event received: {other:?}"),
        }
    }

    #[tokio::test]
    async fn project_subscription_filters_other_projects() {
        let bus = EventBus::new(10);
        let project_id = ProjectId::new();
        let other_id = ProjectId::new();
        let mut receiver = bus.subscribe_project(project_id);

        bus.publish(WorkflowEvent::PhaseCompleted {
            project_id: other_id,
            phase: 1,
            at: Utc::now(),
        });
        bus.publish(WorkflowEvent::PhaseCompleted {
            project_id,
            phase: 2,
            at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            WorkflowEvent::PhaseCompleted { project_id: id, phase, .. } => {
                assert_eq!(id, project_id);
                assert_eq!(phase, 2);
            }
            other => panic!("wrong event received: {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let bus = EventBus::new(10);
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(WorkflowEvent::ProjectCompleted {
            project_id: ProjectId::new(),
            at: Utc::now(),
        });

        receiver1.recv().await.unwrap();
        receiver2.recv().await.unwrap();
    }
}
