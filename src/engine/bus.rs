//! Typed publish/subscribe event bus.
//!
//! Each subscription owns an unbounded queue drained by its own dispatcher
//! task, so:
//! - publishing never blocks and never runs handler code
//! - one subscriber's events are handled one at a time in publish order
//! - a slow or panicking subscriber cannot stall or crash any other
//!
//! Every queued event carries a [`WorkToken`] that is released only after its
//! handler returns. Handlers register follow-up work with the task group
//! before returning, which keeps the completion barrier up for as long as
//! any further event could still be published.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{PoisonError, RwLock};

use futures::FutureExt;
use tokio::sync::mpsc;

use super::barrier::{panic_message, TaskGroup, WorkToken};

/// Event topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Host,
    PortOpen,
    Url,
    PageResponsive,
    RunEnd,
}

/// An event and its payload. One variant per topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A host to port-scan.
    Host(String),
    /// `port` accepted a TCP connection on `host`.
    PortOpen { port: u16, host: String },
    /// A URL to request.
    Url(String),
    /// A page was fetched and stored under this URL.
    PageResponsive(String),
    /// All pipeline work has drained; release run-scoped resources.
    RunEnd,
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Host(_) => Topic::Host,
            Event::PortOpen { .. } => Topic::PortOpen,
            Event::Url(_) => Topic::Url,
            Event::PageResponsive(_) => Topic::PageResponsive,
            Event::RunEnd => Topic::RunEnd,
        }
    }
}

struct Subscription {
    subscriber: String,
    queue: mpsc::UnboundedSender<(Event, WorkToken)>,
}

/// Event bus bound to one run's task group.
pub struct EventBus {
    subscriptions: RwLock<HashMap<Topic, Vec<Subscription>>>,
    tasks: TaskGroup,
}

impl EventBus {
    pub fn new(tasks: TaskGroup) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            tasks,
        }
    }

    /// Calls `handler` for every event published to `topic` from now on.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F, Fut>(&self, topic: Topic, subscriber: &str, handler: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Event, WorkToken)>();
        let name = subscriber.to_string();

        tokio::spawn(async move {
            while let Some((event, token)) = rx.recv().await {
                let dispatch = AssertUnwindSafe(async { handler(event).await }).catch_unwind();
                if let Err(panic) = dispatch.await {
                    log::error!(
                        "[{name}] handler for {topic:?} panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
                drop(token);
            }
            log::trace!("[{name}] dispatcher for {topic:?} stopped");
        });

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push(Subscription {
                subscriber: subscriber.to_string(),
                queue: tx,
            });
    }

    /// Queues `event` for every current subscriber of its topic and returns
    /// how many subscribers received it.
    pub fn publish(&self, event: Event) -> usize {
        let topic = event.topic();
        let subscriptions = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(subs) = subscriptions.get(&topic) else {
            log::trace!("No subscribers for {topic:?}");
            return 0;
        };

        let mut delivered = 0;
        for sub in subs {
            if sub.queue.send((event.clone(), self.tasks.token())).is_ok() {
                delivered += 1;
            } else {
                log::debug!("[{}] dispatcher gone, dropping {topic:?}", sub.subscriber);
            }
        }
        delivered
    }

    /// Number of subscriptions for `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }

    /// Drops every subscription. Dispatchers finish their queued events and
    /// exit, releasing the handlers they own.
    pub fn close(&self) {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new(TaskGroup::new(1));
        assert_eq!(bus.publish(Event::RunEnd), 0);
    }

    #[tokio::test]
    async fn test_order_preserved_per_subscriber() {
        let tasks = TaskGroup::new(4);
        let bus = EventBus::new(tasks.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.subscribe(Topic::Url, "recorder", move |event| {
            let sink = Arc::clone(&sink);
            async move {
                if let Event::Url(url) = event {
                    // Earlier events sleep longer; order must still hold
                    let n: u64 = url.trim_start_matches("http://h").parse().unwrap();
                    tokio::time::sleep(Duration::from_millis(10 - n)).await;
                    sink.lock().unwrap().push(n);
                }
            }
        });

        for n in 0..10 {
            bus.publish(Event::Url(format!("http://h{n}")));
        }
        tasks.join_all().await;
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let tasks = TaskGroup::new(4);
        let bus = EventBus::new(tasks.clone());
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        bus.subscribe(Topic::PageResponsive, "pages", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.publish(Event::Url("http://example.com/".into()));
        bus.publish(Event::PageResponsive("http://example.com/".into()));
        tasks.join_all().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_isolated() {
        let tasks = TaskGroup::new(4);
        let bus = EventBus::new(tasks.clone());
        let survived = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Topic::Url, "faulty", |_| async {
            panic!("handler fault");
        });
        let counter = Arc::clone(&survived);
        bus.subscribe(Topic::Url, "healthy", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(bus.publish(Event::Url("http://a/".into())), 2);
        assert_eq!(bus.publish(Event::Url("http://b/".into())), 2);
        tokio::time::timeout(Duration::from_secs(2), tasks.join_all())
            .await
            .expect("a panicking handler must release its events");
        assert_eq!(survived.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_publisher_or_siblings() {
        let tasks = TaskGroup::new(4);
        let bus = EventBus::new(tasks.clone());
        let fast = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Topic::PageResponsive, "slow", |_| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
        });
        let counter = Arc::clone(&fast);
        bus.subscribe(Topic::PageResponsive, "fast", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let started = std::time::Instant::now();
        bus.publish(Event::PageResponsive("http://a/".into()));
        assert!(started.elapsed() < Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fast.load(Ordering::SeqCst), 1);
        assert!(tasks.pending() >= 1, "slow handler still holds the barrier");
        tasks.join_all().await;
    }

    #[tokio::test]
    async fn test_close_drops_subscriptions() {
        let bus = EventBus::new(TaskGroup::new(1));
        bus.subscribe(Topic::RunEnd, "x", |_| async {});
        assert_eq!(bus.subscriber_count(Topic::RunEnd), 1);
        bus.close();
        assert_eq!(bus.subscriber_count(Topic::RunEnd), 0);
        assert_eq!(bus.publish(Event::RunEnd), 0);
    }
}
