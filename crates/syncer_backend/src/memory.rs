//! In-process backend.

use crate::backend::{Backend, Publisher, RequestHandler};
use crate::error::{BackendError, BackendResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use syncer_protocol::Message;
use tracing::debug;

/// Rendezvous point for in-process repliers, publishers and subscribers.
///
/// Endpoints are plain names. Reply endpoints and publish topics live in
/// separate namespaces, so a server may use the same name for both.
///
/// # Thread Safety
///
/// The hub is shared through an `Arc` and may be used from any thread.
/// Requests run the bound handler on the calling thread, which stands in for
/// the transport thread of a network backend.
#[derive(Default)]
pub struct InMemoryHub {
    repliers: RwLock<HashMap<String, RequestHandler>>,
    topics: RwLock<HashMap<String, Vec<Sender<Message>>>>,
}

impl InMemoryHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends a request to the replier bound at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NoReplier`] if nothing is bound there.
    pub fn request(&self, endpoint: &str, request: &Message) -> BackendResult<Message> {
        let handler = self
            .repliers
            .read()
            .get(endpoint)
            .cloned()
            .ok_or_else(|| BackendError::NoReplier(endpoint.to_owned()))?;
        // The lock is released before the handler runs.
        Ok(handler(request))
    }

    /// Subscribes to every message published on `topic` from now on.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        self.topics
            .write()
            .entry(topic.to_owned())
            .or_default()
            .push(sender);
        Subscription {
            topic: topic.to_owned(),
            receiver,
        }
    }

    /// Returns true if a replier is bound at `endpoint`.
    pub fn has_replier(&self, endpoint: &str) -> bool {
        self.repliers.read().contains_key(endpoint)
    }

    /// Returns the number of live subscribers on `topic`.
    ///
    /// Subscribers dropped since the last publish are still counted.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    fn bind(&self, endpoint: &str, handler: RequestHandler) -> BackendResult<()> {
        let mut repliers = self.repliers.write();
        if repliers.contains_key(endpoint) {
            return Err(BackendError::AddressInUse(endpoint.to_owned()));
        }
        repliers.insert(endpoint.to_owned(), handler);
        debug!(endpoint, "replier bound");
        Ok(())
    }

    fn unbind(&self, endpoint: &str) {
        if self.repliers.write().remove(endpoint).is_some() {
            debug!(endpoint, "replier unbound");
        }
    }

    /// Delivers `message` to every subscriber of `topic`, pruning the ones
    /// that went away. Returns the number of deliveries.
    fn publish(&self, topic: &str, message: &Message) -> usize {
        let mut topics = self.topics.write();
        let Some(subscribers) = topics.get_mut(topic) else {
            return 0;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.send(message.clone()).is_ok());
        if subscribers.len() < before {
            debug!(topic, pruned = before - subscribers.len(), "dropped gone subscribers");
        }
        subscribers.len()
    }
}

impl fmt::Debug for InMemoryHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut repliers: Vec<_> = self.repliers.read().keys().cloned().collect();
        repliers.sort();
        let mut topics: Vec<_> = self
            .topics
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.len()))
            .collect();
        topics.sort();
        f.debug_struct("InMemoryHub")
            .field("repliers", &repliers)
            .field("topics", &topics)
            .finish()
    }
}

/// Configuration of an in-memory endpoint.
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Hub the endpoint lives on.
    pub hub: Arc<InMemoryHub>,
    /// Endpoint name.
    pub endpoint: String,
}

impl InMemoryConfig {
    /// Creates a configuration for `endpoint` on `hub`.
    pub fn new(hub: Arc<InMemoryHub>, endpoint: impl Into<String>) -> Self {
        Self {
            hub,
            endpoint: endpoint.into(),
        }
    }

    /// Returns a configuration for another endpoint on the same hub.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// A bound in-memory reply endpoint. Unbinds on drop.
#[derive(Debug)]
pub struct InMemoryReplier {
    hub: Arc<InMemoryHub>,
    endpoint: String,
}

impl InMemoryReplier {
    /// Returns the endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for InMemoryReplier {
    fn drop(&mut self) {
        self.hub.unbind(&self.endpoint);
    }
}

/// An in-memory publish endpoint.
#[derive(Debug)]
pub struct InMemoryPublisher {
    hub: Arc<InMemoryHub>,
    topic: String,
}

impl InMemoryPublisher {
    /// Returns the topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Publisher for InMemoryPublisher {
    fn publish(&self, message: Message) -> BackendResult<()> {
        let delivered = self.hub.publish(&self.topic, &message);
        debug!(topic = %self.topic, bytes = message.len(), delivered, "published");
        Ok(())
    }
}

/// Receiving end of a topic subscription.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: Receiver<Message>,
}

impl Subscription {
    /// Returns the topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the next message if one is already queued.
    pub fn try_recv(&self) -> Option<Message> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until the next message arrives.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Disconnected`] once the hub is gone and the
    /// queue is empty.
    pub fn recv(&self) -> BackendResult<Message> {
        self.receiver
            .recv()
            .map_err(|_| BackendError::Disconnected(self.topic.clone()))
    }

    /// Waits up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Timeout`] if nothing arrives in time, or
    /// [`BackendError::Disconnected`] if the hub is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> BackendResult<Message> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => BackendError::Timeout(self.topic.clone()),
            RecvTimeoutError::Disconnected => BackendError::Disconnected(self.topic.clone()),
        })
    }

    /// Takes every message queued so far.
    pub fn drain(&self) -> Vec<Message> {
        self.receiver.try_iter().collect()
    }
}

/// Backend connecting endpoints through an [`InMemoryHub`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

impl Backend for InMemoryBackend {
    type Config = InMemoryConfig;
    type Replier = InMemoryReplier;
    type Publisher = InMemoryPublisher;

    fn replier(config: &InMemoryConfig, handler: RequestHandler) -> BackendResult<InMemoryReplier> {
        config.hub.bind(&config.endpoint, handler)?;
        Ok(InMemoryReplier {
            hub: Arc::clone(&config.hub),
            endpoint: config.endpoint.clone(),
        })
    }

    fn publisher(config: &InMemoryConfig) -> BackendResult<InMemoryPublisher> {
        Ok(InMemoryPublisher {
            hub: Arc::clone(&config.hub),
            topic: config.endpoint.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn echo() -> RequestHandler {
        Arc::new(|req: &Message| Message::new(format!("echo:{req}")))
    }

    #[test]
    fn request_reaches_bound_replier() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "rep");
        let _replier = InMemoryBackend::replier(&config, echo()).unwrap();

        let reply = hub.request("rep", &Message::from("hi")).unwrap();
        assert_eq!(reply.as_str(), "echo:hi");
    }

    #[test]
    fn request_without_replier_fails() {
        let hub = InMemoryHub::new();
        assert!(matches!(
            hub.request("nobody", &Message::bootstrap()),
            Err(BackendError::NoReplier(_))
        ));
    }

    #[test]
    fn double_bind_is_rejected() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "rep");
        let _first = InMemoryBackend::replier(&config, echo()).unwrap();
        assert!(matches!(
            InMemoryBackend::replier(&config, echo()),
            Err(BackendError::AddressInUse(_))
        ));
    }

    #[test]
    fn dropping_replier_unbinds() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "rep");
        let replier = InMemoryBackend::replier(&config, echo()).unwrap();
        assert_eq!(replier.endpoint(), "rep");
        assert!(hub.has_replier("rep"));

        drop(replier);
        assert!(!hub.has_replier("rep"));
        // The name can be bound again.
        let _again = InMemoryBackend::replier(&config, echo()).unwrap();
    }

    #[test]
    fn publish_preserves_order_for_each_subscriber() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "pub");
        let a = hub.subscribe("pub");
        let b = hub.subscribe("pub");
        let publisher = InMemoryBackend::publisher(&config).unwrap();

        for i in 0..5 {
            publisher.publish(Message::new(i.to_string())).unwrap();
        }

        let expected: Vec<_> = (0..5).map(|i| Message::new(i.to_string())).collect();
        assert_eq!(a.drain(), expected);
        assert_eq!(b.drain(), expected);
    }

    #[test]
    fn late_subscriber_misses_earlier_messages() {
        let hub = Arc::new(InMemoryHub::new());
        let publisher =
            InMemoryBackend::publisher(&InMemoryConfig::new(Arc::clone(&hub), "pub")).unwrap();
        publisher.publish(Message::from("early")).unwrap();

        let late = hub.subscribe("pub");
        assert!(late.try_recv().is_none());
        publisher.publish(Message::from("late")).unwrap();
        assert_eq!(late.try_recv().unwrap().as_str(), "late");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = Arc::new(InMemoryHub::new());
        let publisher =
            InMemoryBackend::publisher(&InMemoryConfig::new(Arc::clone(&hub), "pub")).unwrap();
        let kept = hub.subscribe("pub");
        let gone = hub.subscribe("pub");
        assert_eq!(hub.subscriber_count("pub"), 2);

        drop(gone);
        publisher.publish(Message::from("x")).unwrap();
        assert_eq!(hub.subscriber_count("pub"), 1);
        assert_eq!(kept.try_recv().unwrap().as_str(), "x");
    }

    #[test]
    fn recv_timeout_reports_timeout() {
        let hub = InMemoryHub::new();
        let sub = hub.subscribe("quiet");
        assert!(matches!(
            sub.recv_timeout(Duration::from_millis(10)),
            Err(BackendError::Timeout(_))
        ));
    }

    #[test]
    fn recv_waits_for_publisher_thread() {
        let hub = Arc::new(InMemoryHub::new());
        let sub = hub.subscribe("pub");
        let config = InMemoryConfig::new(Arc::clone(&hub), "pub");

        let handle = thread::spawn(move || {
            let publisher = InMemoryBackend::publisher(&config).unwrap();
            publisher.publish(Message::from("later")).unwrap();
        });

        assert_eq!(sub.recv().unwrap().as_str(), "later");
        handle.join().unwrap();
    }

    #[test]
    fn recv_after_hub_dropped_disconnects() {
        let hub = InMemoryHub::new();
        let sub = hub.subscribe("pub");
        drop(hub);
        assert!(matches!(sub.recv(), Err(BackendError::Disconnected(_))));
    }

    #[test]
    fn concurrent_requests() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "rep");
        let _replier = InMemoryBackend::replier(&config, echo()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let hub = Arc::clone(&hub);
                thread::spawn(move || {
                    let req = Message::new(i.to_string());
                    hub.request("rep", &req).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().as_str(), format!("echo:{i}"));
        }
    }

    #[test]
    fn same_name_for_reply_and_publish() {
        let hub = Arc::new(InMemoryHub::new());
        let config = InMemoryConfig::new(Arc::clone(&hub), "both");
        let sub = hub.subscribe("both");
        let _replier = InMemoryBackend::replier(&config, echo()).unwrap();
        let publisher = InMemoryBackend::publisher(&config).unwrap();
        assert_eq!(publisher.topic(), "both");

        publisher.publish(Message::from("p")).unwrap();
        assert_eq!(sub.try_recv().unwrap().as_str(), "p");
        assert_eq!(hub.request("both", &Message::from("r")).unwrap().as_str(), "echo:r");
    }
}
