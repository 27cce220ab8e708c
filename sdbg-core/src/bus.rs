//! Thread-safe event queue: many publishers, one draining consumer.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::message::Message;

/// Unbounded, FIFO, non-blocking event queue.
///
/// `publish` never blocks. `drain` removes and returns every message
/// currently enqueued, in enqueue order, without blocking when the bus is
/// empty. Concurrent publishers are safe; concurrent drainers are safe but
/// not coordinated with each other (the engine only ever has one).
#[derive(Debug, Default)]
pub struct MessageBus {
    queue: Mutex<VecDeque<Message>>,
}

impl MessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn publish(&self, message: Message) {
        self.queue.lock().push_back(message);
    }

    #[must_use]
    pub fn drain(&self) -> Vec<Message> {
        let mut queue = self.queue.lock();
        queue.drain(..).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_fifo_order_and_empties_bus() {
        let bus = MessageBus::new();
        bus.publish(Message::ThreadStarted { thread_id: 1 });
        bus.publish(Message::ThreadStarted { thread_id: 2 });

        let drained = bus.drain();
        assert_eq!(
            drained,
            vec![
                Message::ThreadStarted { thread_id: 1 },
                Message::ThreadStarted { thread_id: 2 },
            ]
        );
        assert!(bus.is_empty());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn concurrent_publishers_preserve_all_messages() {
        use std::sync::Arc;
        use std::thread;

        let bus = Arc::new(MessageBus::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for _ in 0..50 {
                        bus.publish(Message::ThreadStarted { thread_id: i });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(bus.drain().len(), 400);
    }
}
