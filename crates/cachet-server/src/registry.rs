//! Hostname-to-server dispatch.
//!
//! One process can serve several servers; every request is routed by its
//! `Host` header to the engine registered for that hostname. Keys are
//! loaded once at registration and live for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::Storage;
use crate::{Result, ServerEngine, ServerError};

/// Registry of engines keyed by hostname.
#[derive(Default)]
pub struct Registry<S: Storage> {
    servers: HashMap<String, Arc<ServerEngine<S>>>,
}

impl<S: Storage> Registry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            servers: HashMap::new(),
        }
    }

    /// Register an engine under one or more hostnames.
    pub fn register(&mut self, hostnames: &[&str], engine: ServerEngine<S>) -> Arc<ServerEngine<S>> {
        let engine = Arc::new(engine);
        for hostname in hostnames {
            self.servers
                .insert(hostname.to_string(), Arc::clone(&engine));
        }
        engine
    }

    /// Dispatch a request `Host` value to its engine.
    ///
    /// Ports are ignored; an unregistered hostname is `UnknownServer`.
    pub fn dispatch(&self, host: &str) -> Result<Arc<ServerEngine<S>>> {
        let hostname = host.split(':').next().unwrap_or(host);
        self.servers
            .get(hostname)
            .cloned()
            .ok_or_else(|| ServerError::UnknownServer(hostname.to_string()))
    }
}
