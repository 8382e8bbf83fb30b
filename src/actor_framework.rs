//! # Actor Framework
//!
//! A generic record store built as an actor. Each [`ResourceActor`] owns one
//! collection and applies requests strictly one at a time, so any single request
//! is atomic. Every record carries a version that is bumped on each successful
//! mutation; [`ResourceClient::update`] can be made conditional on the version a
//! caller read earlier (compare-and-swap).

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Patches, and Actions)
// =============================================================================

/// Trait that any record must implement to be managed by [`ResourceActor`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Collection name used in errors and logs.
    const KIND: &'static str;

    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;
    type CreateParams: Send + Debug + 'static;
    type Patch: Send + Debug + 'static;
    type Action: Send + Debug + 'static;
    type ActionResult: Send + Debug + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full record from its id and creation parameters.
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a domain-specific command. Runs against a working copy; the
    /// stored record is only replaced when this returns `Ok`.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub entity: T,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameworkError<E> {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
    #[error("{kind} {id} changed concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        kind: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("{kind} records need an explicit id")]
    IdRequired { kind: &'static str },
    #[error("{0}")]
    Entity(E),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the request")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T::Id, T::Error>,
    },
    Insert {
        id: T::Id,
        params: T::CreateParams,
        respond_to: Response<(), T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<Versioned<T>>, T::Error>,
    },
    List {
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        expected_version: Option<u64>,
        respond_to: Response<Versioned<T>, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<(), T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

struct Record<T> {
    entity: T,
    version: u64,
}

type IdGenerator<Id> = Box<dyn Fn() -> Id + Send + Sync>;

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, Record<T>>,
    next_id_fn: Option<IdGenerator<T::Id>>,
}

impl<T: Entity> ResourceActor<T> {
    /// Actor that assigns ids itself on `create`.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        Self::build(buffer_size, Some(Box::new(next_id_fn)))
    }

    /// Actor whose records are keyed by caller-chosen ids (`insert` only).
    pub fn keyed(buffer_size: usize) -> (Self, ResourceClient<T>) {
        Self::build(buffer_size, None)
    }

    fn build(buffer_size: usize, next_id_fn: Option<IdGenerator<T::Id>>) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn,
        };
        (actor, ResourceClient::new(sender))
    }

    #[instrument(name = "resource_actor", fields(kind = T::KIND), skip(self))]
    pub async fn run(mut self) {
        info!("Resource actor starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.create(params));
                }
                ResourceRequest::Insert { id, params, respond_to } => {
                    let _ = respond_to.send(self.insert(id, params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.get(&id)));
                }
                ResourceRequest::List { respond_to } => {
                    let items = self.store.values().map(|r| r.entity.clone()).collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    patch,
                    expected_version,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.update(id, patch, expected_version));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.delete(id));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.apply_action(id, action));
                }
                ResourceRequest::Shutdown => {
                    info!("Resource actor shutting down");
                    break;
                }
            }
        }

        info!(records = self.store.len(), "Resource actor stopped");
    }

    fn not_found(id: &T::Id) -> FrameworkError<T::Error> {
        FrameworkError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        }
    }

    fn create(&mut self, params: T::CreateParams) -> Result<T::Id, FrameworkError<T::Error>> {
        let next_id = self
            .next_id_fn
            .as_ref()
            .ok_or(FrameworkError::IdRequired { kind: T::KIND })?;
        let id = next_id();
        self.insert(id.clone(), params)?;
        Ok(id)
    }

    fn insert(&mut self, id: T::Id, params: T::CreateParams) -> Result<(), FrameworkError<T::Error>> {
        if self.store.contains_key(&id) {
            return Err(FrameworkError::AlreadyExists {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        let mut entity = T::from_create_params(id.clone(), params).map_err(FrameworkError::Entity)?;
        entity.on_create().map_err(FrameworkError::Entity)?;
        debug!(id = %id, "Record created");
        self.store.insert(id, Record { entity, version: 1 });
        Ok(())
    }

    fn get(&self, id: &T::Id) -> Option<Versioned<T>> {
        self.store.get(id).map(|record| Versioned {
            version: record.version,
            entity: record.entity.clone(),
        })
    }

    fn update(
        &mut self,
        id: T::Id,
        patch: T::Patch,
        expected_version: Option<u64>,
    ) -> Result<Versioned<T>, FrameworkError<T::Error>> {
        let record = self.store.get_mut(&id).ok_or_else(|| Self::not_found(&id))?;
        if let Some(expected) = expected_version {
            if expected != record.version {
                debug!(id = %id, expected, actual = record.version, "Version conflict");
                return Err(FrameworkError::VersionConflict {
                    kind: T::KIND,
                    id: id.to_string(),
                    expected,
                    actual: record.version,
                });
            }
        }
        let mut working = record.entity.clone();
        working.on_update(patch).map_err(FrameworkError::Entity)?;
        record.entity = working;
        record.version += 1;
        Ok(Versioned {
            version: record.version,
            entity: record.entity.clone(),
        })
    }

    fn delete(&mut self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        let record = self.store.get(&id).ok_or_else(|| Self::not_found(&id))?;
        record.entity.on_delete().map_err(FrameworkError::Entity)?;
        self.store.remove(&id);
        debug!(id = %id, "Record deleted");
        Ok(())
    }

    fn apply_action(&mut self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let record = self.store.get_mut(&id).ok_or_else(|| Self::not_found(&id))?;
        let mut working = record.entity.clone();
        let result = working.handle_action(action).map_err(FrameworkError::Entity)?;
        record.entity = working;
        record.version += 1;
        Ok(result)
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T::Id, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn insert(&self, id: T::Id, params: T::CreateParams) -> Result<(), FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Insert {
            id,
            params,
            respond_to,
        })
        .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError<T::Error>> {
        Ok(self.get_versioned(id).await?.map(|v| v.entity))
    }

    pub async fn get_versioned(&self, id: T::Id) -> Result<Option<Versioned<T>>, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::List { respond_to })
            .await
    }

    /// Apply `patch`. With `expected_version` set, the write only happens if the
    /// record is still at that version.
    pub async fn update(
        &self,
        id: T::Id,
        patch: T::Patch,
        expected_version: Option<u64>,
    ) -> Result<Versioned<T>, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Update {
            id,
            patch,
            expected_version,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    pub async fn shutdown(&self) -> Result<(), FrameworkError<T::Error>> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

// =============================================================================
// 5. TESTS
// =============================================================================
