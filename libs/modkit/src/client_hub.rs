//! Type-keyed registry of in-process clients.
//!
//! A provider module registers its public API once under the trait object type
//! (`hub.register::<dyn directory::DirectoryApi>(client)`); consumers fetch it by the
//! same type during their own `init`. Re-registering replaces the previous value;
//! `Arc`s already handed out stay valid.

use parking_lot::RwLock;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not registered: {type_name}")]
    NotFound { type_name: &'static str },
}

type Boxed = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<TypeId, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the interface type `T` (usually `dyn SomeApi`).
    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.write().insert(TypeId::of::<T>(), Box::new(client));
    }

    /// Fetch a client by interface type `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<T>>())
            .cloned()
            .ok_or(ClientHubError::NotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
