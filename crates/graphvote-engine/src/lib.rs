//! Graph Vote Engine - optimistic dual-tier voting
//!
//! Turns a user's vote click into an immediate local update, reconciles it
//! with the server, and recovers cleanly when the network disagrees.
//!
//! # Architecture
//!
//! - **State**: [`VoteStateContainer`] holds counts, stance and the in-flight
//!   flag for one (entity, tier) and notifies observers on every change
//! - **Controller**: [`VoteController`] runs apply → call → reconcile or
//!   rollback → bounded retry
//! - **Metadata**: [`MetadataSynchronizer`] mirrors the stance onto node
//!   metadata so a remounted node starts from its last known vote
//! - **Visibility**: [`VisibilityWatcher`] recomputes the detail threshold
//!   from inclusion votes
//! - **Backend**: [`VoteBackend`] is the network boundary;
//!   [`MemoryVoteServer`] is an in-memory authoritative implementation
//!
//! Each tier of an entity has its own controller and state. They never
//! block each other; [`EntityVotes`] wires both up for a node.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use graphvote_engine::{EngineConfig, EntityVotes, InMemoryMetadata, MemoryVoteServer, NodeVoteSummary};
//! use graphvote_core::{EntityKind, VoteStatus, VoteTier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Arc::new(MemoryVoteServer::new());
//!     let metadata = Arc::new(InMemoryMetadata::new());
//!     let votes = EntityVotes::new(EntityKind::Statement, "s-1", server, metadata, EngineConfig::default())?;
//!     votes.initialize(NodeVoteSummary::default(), false).await;
//!     let outcome = votes.handle_vote(VoteTier::Inclusion, VoteStatus::Agree).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod controller;
pub mod entity;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod state;
pub mod visibility;
pub mod wire;

pub use backend::VoteBackend;
pub use config::EngineConfig;
pub use context::{EndpointTemplate, VoteIntentContext};
pub use controller::{InitialVotes, VoteController, VoteOutcome};
pub use entity::{EntityVotes, NodeVoteSummary};
pub use error::{Error, Result};
pub use memory::{CallKind, CallRecord, MemoryVoteServer};
pub use metadata::{InMemoryMetadata, MetadataStore, MetadataSynchronizer, StatusRecord};
pub use state::{LastOutcome, VoteGate, VoteObserver, VoteState, VoteStateContainer};
pub use visibility::VisibilityWatcher;
pub use wire::{UserVoteStatusResponse, VotePayload, VoteRequest, VoteTally};
