//! # In-Memory Persistence
//!
//! A reference implementation of the [`Repo`](crate::Repo) contract built on
//! actors: each model source gets a [`StoreActor`] running in its own task, reached
//! through a cloneable [`StoreClient`]. [`MemoryRepo`] routes repo calls to the right
//! client by source name.
//!
//! The actor loop processes one request at a time, which gives each source
//! serialized access to its records without locks.

mod actor;
mod client;
mod memory;
mod message;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use memory::MemoryRepo;
pub use message::{Response, StoreRequest};
