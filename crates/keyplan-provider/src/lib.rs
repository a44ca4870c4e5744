//! # keyplan-provider
//!
//! Keyword metrics provider access for keyplan.
//!
//! All outbound calls share one [`RequestScheduler`], which serializes them,
//! spaces them by the provider's minimum interval, and retries tasks the
//! provider reports as still queued. [`DataForSeoClient`] implements
//! [`KeywordDataProvider`](keyplan_core::KeywordDataProvider) on top of it.

pub mod client;
pub mod ideas;
pub mod scheduler;
pub mod types;

pub use client::{DataForSeoClient, ProviderCheck, ProviderConfig};
pub use ideas::{chunk, group_ideas_by_seed, SeedIdeas};
pub use scheduler::{Attempt, RequestScheduler, SchedulerConfig};
pub use types::{KeywordTask, ProviderResponse, ProviderTask, ResultItem};
