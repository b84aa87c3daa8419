//! Block context: header, store access and emitted events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStore;
use crate::kv::KvStore;
use crate::prefix::{PrefixRead, PrefixStore};

/// The parts of a block header the module consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    /// Header timestamp. The only notion of "now" available to state logic.
    pub time: DateTime<Utc>,
}

impl BlockHeader {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// A typed, attribute-carrying event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Execution context for one block (or one transaction branch of it).
///
/// Bundles the store, the block header and the event sink. State logic must
/// not look anywhere else for time or randomness.
pub struct Context<'a> {
    store: &'a mut dyn KvStore,
    header: BlockHeader,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn KvStore, header: BlockHeader) -> Self {
        Self {
            store,
            header,
            events: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        self.header.time
    }

    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    /// Read-only view of a module namespace.
    pub fn kv(&self, namespace: &str) -> PrefixRead<'_> {
        PrefixRead::new(&*self.store, &namespace_prefix(namespace))
    }

    /// Read-write view of a module namespace.
    pub fn kv_mut(&mut self, namespace: &str) -> PrefixStore<'_> {
        PrefixStore::new(&mut *self.store, &namespace_prefix(namespace))
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` against a cache branch of this context.
    ///
    /// On `Ok` the branch's writes and events are committed into this
    /// context; on `Err` both are discarded and this context is unchanged.
    pub fn run_atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Context<'_>) -> Result<T, E>,
    {
        let header = self.header.clone();
        let mut cache = CacheStore::new(&mut *self.store);
        let (result, events) = {
            let mut branch = Context::new(&mut cache, header);
            let result = f(&mut branch);
            (result, branch.take_events())
        };
        match result {
            Ok(value) => {
                cache.write();
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                debug!(
                    height = self.header.height,
                    discarded_writes = cache.pending_len(),
                    "Discarding failed branch"
                );
                Err(err)
            }
        }
    }
}

fn namespace_prefix(namespace: &str) -> Vec<u8> {
    let mut prefix = namespace.as_bytes().to_vec();
    prefix.push(b'/');
    prefix
}
