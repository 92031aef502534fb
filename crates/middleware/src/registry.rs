use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur when registering endpoints.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is already bound to a different type.
    #[error("'{name}' is bound to {registered}, not {requested}")]
    TypeMismatch {
        /// The resolved topic or service name.
        name: String,
        /// The type the name is bound to.
        registered: &'static str,
        /// The type that was requested.
        requested: &'static str,
    },

    /// A service with this name is already advertised.
    #[error("service '{0}' is already advertised")]
    ServiceExists(String),
}

/// The subscription links and publisher count of one topic.
pub struct Topic<L> {
    name: String,
    links: RwLock<Vec<Arc<L>>>,
    publishers: AtomicUsize,
}

impl<L> Debug for Topic<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("subscribers", &self.links.read().len())
            .field("publishers", &self.publishers.load(Ordering::Relaxed))
            .finish()
    }
}

impl<L> Topic<L> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            links: RwLock::new(Vec::new()),
            publishers: AtomicUsize::new(0),
        }
    }

    /// The resolved topic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the attached subscription links.
    #[must_use]
    pub fn links(&self) -> Vec<Arc<L>> {
        self.links.read().clone()
    }

    /// Number of attached subscription links.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.links.read().len()
    }
}

trait ErasedTopic: Send + Sync + 'static {
    fn is_idle(&self) -> bool;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<L: Send + Sync + 'static> ErasedTopic for Topic<L> {
    fn is_idle(&self) -> bool {
        self.links.read().is_empty() && self.publishers.load(Ordering::Acquire) == 0
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct TopicEntry {
    type_name: &'static str,
    topic: Arc<dyn ErasedTopic>,
}

struct ServiceEntry {
    type_name: &'static str,
    link: Arc<dyn Any + Send + Sync>,
}

/// A registry of topics and services, keyed by resolved name.
///
/// Each name is bound to the type of its first registration for as long as
/// any endpoint uses it. Backends keep one registry per process; it plays
/// the part of the middleware's discovery graph.
#[derive(Default)]
pub struct Registry {
    topics: DashMap<String, TopicEntry>,
    services: DashMap<String, ServiceEntry>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("topics", &self.topics.len())
            .field("services", &self.services.len())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_topic<L, F>(
        &self,
        name: &str,
        message_type: &'static str,
        f: F,
    ) -> Result<Arc<Topic<L>>, RegistryError>
    where
        L: Send + Sync + 'static,
        F: FnOnce(&Topic<L>),
    {
        let entry = self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| TopicEntry {
                type_name: message_type,
                topic: Arc::new(Topic::<L>::new(name)),
            });

        let topic = entry
            .topic
            .clone()
            .into_any()
            .downcast::<Topic<L>>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                registered: entry.type_name,
                requested: message_type,
            })?;

        // Mutate while the shard is locked so a concurrent prune cannot
        // remove the entry between lookup and registration.
        f(&topic);
        drop(entry);

        Ok(topic)
    }

    fn prune_topic(&self, name: &str) {
        if self
            .topics
            .remove_if(name, |_, entry| entry.topic.is_idle())
            .is_some()
        {
            trace!(topic = name, "topic has no endpoints left, removed");
        }
    }

    /// Registers a publisher on a topic.
    ///
    /// # Errors
    /// Returns an error if the topic is bound to another message type.
    pub fn add_publisher<L>(
        &self,
        name: &str,
        message_type: &'static str,
    ) -> Result<Arc<Topic<L>>, RegistryError>
    where
        L: Send + Sync + 'static,
    {
        self.with_topic(name, message_type, |topic: &Topic<L>| {
            topic.publishers.fetch_add(1, Ordering::AcqRel);
        })
    }

    /// Unregisters a publisher.
    pub fn remove_publisher<L>(&self, topic: &Arc<Topic<L>>)
    where
        L: Send + Sync + 'static,
    {
        topic.publishers.fetch_sub(1, Ordering::AcqRel);
        self.prune_topic(&topic.name);
    }

    /// Attaches a subscription link to a topic.
    ///
    /// # Errors
    /// Returns an error if the topic is bound to another message type.
    pub fn attach<L>(
        &self,
        name: &str,
        message_type: &'static str,
        link: Arc<L>,
    ) -> Result<Arc<Topic<L>>, RegistryError>
    where
        L: Send + Sync + 'static,
    {
        self.with_topic(name, message_type, move |topic: &Topic<L>| {
            topic.links.write().push(link);
        })
    }

    /// Detaches a subscription link.
    pub fn detach<L>(&self, topic: &Arc<Topic<L>>, link: &Arc<L>)
    where
        L: Send + Sync + 'static,
    {
        topic.links.write().retain(|other| !Arc::ptr_eq(other, link));
        self.prune_topic(&topic.name);
    }

    /// Advertises a service link.
    ///
    /// # Errors
    /// Returns an error if the name is already advertised.
    pub fn advertise_service<L>(
        &self,
        name: &str,
        service_type: &'static str,
        link: Arc<L>,
    ) -> Result<(), RegistryError>
    where
        L: Send + Sync + 'static,
    {
        match self.services.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::ServiceExists(name.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(ServiceEntry {
                    type_name: service_type,
                    link,
                });
                debug!(service = name, "service advertised");
                Ok(())
            }
        }
    }

    /// Looks up an advertised service link.
    ///
    /// # Errors
    /// Returns an error if the name is bound to another service type.
    pub fn lookup_service<L>(
        &self,
        name: &str,
        service_type: &'static str,
    ) -> Result<Option<Arc<L>>, RegistryError>
    where
        L: Send + Sync + 'static,
    {
        let Some(entry) = self.services.get(name) else {
            return Ok(None);
        };
        entry
            .link
            .clone()
            .downcast::<L>()
            .map(Some)
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                registered: entry.type_name,
                requested: service_type,
            })
    }

    /// Withdraws a service link, if it is still the advertised one.
    pub fn withdraw_service<L>(&self, name: &str, link: &Arc<L>)
    where
        L: Send + Sync + 'static,
    {
        let target = Arc::as_ptr(link).cast::<()>();
        if self
            .services
            .remove_if(name, |_, entry| Arc::as_ptr(&entry.link).cast::<()>() == target)
            .is_some()
        {
            debug!(service = name, "service withdrawn");
        }
    }

    /// Whether a service with this name is advertised.
    #[must_use]
    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Whether any endpoint uses this topic.
    #[must_use]
    pub fn has_topic(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }
}
