//! Latest-value publisher
//!
//! A [`Publisher`] holds the most recent value it was updated with.
//! Subscriptions created after an update immediately observe that value;
//! intermediate values are not queued. Once finished, subscriptions drain
//! the final value and then stop.

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    version: u64,
    finished: bool,
}

/// Sending half
#[derive(Debug)]
pub struct Publisher<T> {
    sender: watch::Sender<Slot<T>>,
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        let (sender, _) = watch::channel(Slot {
            value: None,
            version: 0,
            finished: false,
        });
        Self { sender }
    }
}

impl<T: Clone> Publisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current value. Ignored once finished.
    pub fn update(&self, value: T) {
        self.sender.send_modify(|slot| {
            if slot.finished {
                return;
            }
            slot.value = Some(value);
            slot.version += 1;
        });
    }

    /// Mark the stream of values as complete.
    pub fn finish(&self) {
        self.sender.send_modify(|slot| slot.finished = true);
    }

    pub fn is_finished(&self) -> bool {
        self.sender.borrow().finished
    }

    /// Current value, if any update happened yet
    pub fn latest(&self) -> Option<T> {
        self.sender.borrow().value.clone()
    }

    pub fn subscription(&self) -> Subscription<T> {
        Subscription {
            receiver: self.sender.subscribe(),
            seen: 0,
        }
    }
}

/// Receiving half
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    receiver: watch::Receiver<Slot<T>>,
    seen: u64,
}

impl<T: Clone> Subscription<T> {
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().value.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.receiver.borrow().finished
    }

    /// Wait for a value this subscription has not seen yet.
    ///
    /// Returns `None` once the publisher is finished (or dropped) and the
    /// final value has been observed.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if let Some(outcome) = self.poll_slot() {
                return outcome;
            }
            if self.receiver.changed().await.is_err() {
                return self.poll_slot().flatten();
            }
        }
    }

    fn poll_slot(&mut self) -> Option<Option<T>> {
        let slot = self.receiver.borrow_and_update();
        if slot.version > self.seen {
            self.seen = slot.version;
            return Some(slot.value.clone());
        }
        if slot.finished {
            return Some(None);
        }
        None
    }
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    /// Invoke `callback` with the latest value and every later update.
    ///
    /// The callback is dropped when the publisher finishes.
    pub fn then<F>(mut self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(T) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(value) = self.next().await {
                callback(value);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_new_subscription_sees_nothing_before_update() {
        let publisher = Publisher::<i32>::new();
        let subscription = publisher.subscription();

        assert_eq!(subscription.latest(), None);
        assert!(!subscription.is_finished());
    }

    #[tokio::test]
    async fn test_late_subscription_receives_latest_value_only() {
        let publisher = Publisher::new();
        publisher.update(20);
        publisher.update(30);

        let mut subscription = publisher.subscription();
        assert_eq!(subscription.next().await, Some(30));

        publisher.update(40);
        assert_eq!(subscription.next().await, Some(40));
    }

    #[tokio::test]
    async fn test_finish_drains_then_ends() {
        let publisher = Publisher::new();
        let mut subscription = publisher.subscription();

        publisher.update(1);
        publisher.finish();
        publisher.update(2);

        assert!(publisher.is_finished());
        assert_eq!(subscription.next().await, Some(1));
        assert_eq!(subscription.next().await, None);
        assert_eq!(publisher.latest(), Some(1));
    }

    #[tokio::test]
    async fn test_dropped_publisher_ends_subscription() {
        let publisher = Publisher::<u8>::new();
        let mut subscription = publisher.subscription();
        drop(publisher);

        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_then_calls_back_and_releases_callback_on_finish() {
        let publisher = Publisher::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        publisher.update(20);
        let handle = publisher
            .subscription()
            .then(move |value| sink.lock().unwrap().push(value));

        publisher.finish();
        handle.await.unwrap();

        assert_eq!(*received.lock().unwrap(), vec![20]);
        assert_eq!(Arc::strong_count(&received), 1);
    }
}
