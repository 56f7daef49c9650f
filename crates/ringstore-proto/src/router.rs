//! Reply routing by request id.
//!
//! Each in-flight protocol instance registers a delivery callback under the
//! request id it stamped into its outgoing messages. The listener hands every
//! reply to [`Router::deliver`], which forwards it to the owning instance.
//! A route stays registered until removed, so one request can collect
//! replies from many peers.

use std::collections::HashMap;
use std::sync::RwLock;

use ringstore_core::Message;

type Deliver = Box<dyn Fn(Message) + Send + Sync>;

/// Map from request id to the instance awaiting its replies.
#[derive(Default)]
pub struct Router {
    routes: RwLock<HashMap<u64, Deliver>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route replies carrying `request_id` to `deliver`.
    pub fn register<F>(&self, request_id: u64, deliver: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request_id, Box::new(deliver));
    }

    pub fn remove(&self, request_id: u64) -> bool {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&request_id)
            .is_some()
    }

    /// Hand a reply to its route. Returns false if nobody is waiting for it.
    pub fn deliver(&self, reply: Message) -> bool {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        match routes.get(&reply.request_id()) {
            Some(deliver) => {
                deliver(reply);
                true
            }
            None => false,
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
