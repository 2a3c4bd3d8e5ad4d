//! Host-to-background event delivery.
//!
//! A host owns one [`SurfaceEvents`] hub and publishes pointer and resize
//! events into it. Each background instance holds its own [`Subscription`];
//! dropping the subscription is the whole deregistration, and the hub prunes
//! disconnected subscribers on the next publish.

use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};

use crate::types::SurfaceSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Pointer moved to a client-space position; `width`/`height` are the
    /// surface dimensions at the time of the move.
    PointerMoved {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Resized(SurfaceSize),
}

#[derive(Debug, Default)]
pub struct SurfaceEvents {
    subscribers: Vec<Sender<SurfaceEvent>>,
}

impl SurfaceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        Subscription { receiver }
    }

    /// Delivers `event` to every live subscriber.
    pub fn publish(&mut self, event: SurfaceEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving half owned by a background instance.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<SurfaceEvent>,
}

impl Subscription {
    /// Yields every event queued since the last drain, oldest first.
    pub fn drain(&self) -> TryIter<'_, SurfaceEvent> {
        self.receiver.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_events_in_order() {
        let mut hub = SurfaceEvents::new();
        let subscription = hub.subscribe();
        hub.publish(SurfaceEvent::Resized(SurfaceSize::new(10, 10)));
        hub.publish(SurfaceEvent::PointerMoved {
            x: 1.0,
            y: 2.0,
            width: 10.0,
            height: 10.0,
        });

        let events: Vec<_> = subscription.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SurfaceEvent::Resized(_)));
        assert!(matches!(events[1], SurfaceEvent::PointerMoved { .. }));
        assert_eq!(subscription.drain().count(), 0);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let mut hub = SurfaceEvents::new();
        let kept = hub.subscribe();
        let dropped = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(dropped);
        hub.publish(SurfaceEvent::Resized(SurfaceSize::new(1, 1)));
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(kept.drain().count(), 1);
    }
}
