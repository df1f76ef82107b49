//! Intelligence adapter contract and registry
//!
//! Every external source sits behind [`IntelAdapter`]. Adapters never fail
//! the pipeline: unavailability is an ordinary value the aggregator records
//! and moves past.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::{EntityKind, ResolvedEntity, SourceTier};

use super::community::CommunityInfo;
use super::dexscreener::MarketData;
use super::github::RepoOwnerProfile;
use super::rdap::DomainRecord;
use super::security::SecurityReport;
use super::wayback::ArchiveHistory;
use super::website::SiteCrawl;

/// Why an adapter produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum Unavailable {
    NotFound,
    RateLimited,
    NetworkError(String),
    NotApplicable,
    TimedOut,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NotFound => f.write_str("not-found"),
            Unavailable::RateLimited => f.write_str("rate-limited"),
            Unavailable::NetworkError(detail) => write!(f, "network-error: {}", detail),
            Unavailable::NotApplicable => f.write_str("not-applicable"),
            Unavailable::TimedOut => f.write_str("timed-out"),
        }
    }
}

impl From<AppError> for Unavailable {
    fn from(err: AppError) -> Self {
        match err.code {
            ErrorCode::ExternalNotFound => Unavailable::NotFound,
            ErrorCode::ExternalRateLimited => Unavailable::RateLimited,
            ErrorCode::ExternalTimeout => Unavailable::TimedOut,
            _ => Unavailable::NetworkError(err.message),
        }
    }
}

/// Typed output of one source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum Payload {
    SecurityReport(SecurityReport),
    MarketData(MarketData),
    DomainRecord(DomainRecord),
    RepoOwner(RepoOwnerProfile),
    Community(CommunityInfo),
    Archive(ArchiveHistory),
    SiteCrawl(SiteCrawl),
}

/// Result of one adapter invocation
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutcome {
    Available(Payload),
    Unavailable(Unavailable),
}

impl AdapterOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, AdapterOutcome::Available(_))
    }
}

impl<T: Into<Payload>> From<Result<T, Unavailable>> for AdapterOutcome {
    fn from(result: Result<T, Unavailable>) -> Self {
        match result {
            Ok(payload) => AdapterOutcome::Available(payload.into()),
            Err(reason) => AdapterOutcome::Unavailable(reason),
        }
    }
}

macro_rules! payload_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$ty> for Payload {
            fn from(value: $ty) -> Self {
                Payload::$variant(value)
            }
        })+
    };
}

payload_from! {
    SecurityReport => SecurityReport,
    MarketData => MarketData,
    DomainRecord => DomainRecord,
    RepoOwnerProfile => RepoOwner,
    CommunityInfo => Community,
    ArchiveHistory => Archive,
    SiteCrawl => SiteCrawl,
}

/// Uniform contract for one external intelligence source
#[async_trait]
pub trait IntelAdapter: Send + Sync {
    /// Stable identifier, used in logs and report sources
    fn id(&self) -> &'static str;

    /// Source priority tier
    fn tier(&self) -> SourceTier;

    /// Entity kinds this source can say anything about
    fn applies_to(&self) -> &'static [EntityKind];

    /// Fetch evidence for an entity. Must not panic on source failure.
    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome;
}

/// Adapter catalog, tagged by kind and priority
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn IntelAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn IntelAdapter>) -> &mut Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with(mut self, adapter: impl IntelAdapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// Adapters applicable to `kind`, in priority order: tier first, then
    /// registration order (the sort is stable)
    pub fn applicable(&self, kind: EntityKind) -> Vec<Arc<dyn IntelAdapter>> {
        let mut selected: Vec<_> = self
            .adapters
            .iter()
            .filter(|a| a.applies_to().contains(&kind))
            .cloned()
            .collect();
        selected.sort_by_key(|a| a.tier());
        selected
    }
}
