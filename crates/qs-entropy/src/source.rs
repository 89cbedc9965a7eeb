//! Random source abstraction and the per-pull triple source

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use qs_slot::{REEL_COUNT, Triple};

use crate::error::{EntropyError, EntropyResult};
use crate::kind::SourceKind;
use crate::local::LocalSampler;

/// Something that produces draws in `0..8`
#[async_trait]
pub trait RandomSource: Send + Sync {
    /// Which selector this source answers to
    fn kind(&self) -> SourceKind;

    /// Can a draw be served without waiting?
    async fn is_ready(&self) -> bool {
        true
    }

    /// `count` draws, each in `0..8`
    async fn draw(&self, count: usize) -> EntropyResult<Vec<u8>>;
}

/// Hands out one triple per pull
#[async_trait]
pub trait TripleProvider: Send + Sync {
    /// Triple from the named provider
    async fn next_triple(&self, kind: SourceKind) -> EntropyResult<Triple>;

    /// Providers that can serve a pull right now
    async fn available_sources(&self) -> Vec<SourceKind>;
}

/// What to do when the selected provider fails with a retryable error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Surface the error
    #[default]
    None,
    /// Serve the pull from the local sampler instead
    LocalSimulator,
}

/// Provider set for one machine
///
/// Built once and shared by whoever needs randomness. A local simulator is
/// always registered, the others only when configured. Fallback goes through
/// whichever local simulator is registered.
pub struct TripleSource {
    providers: HashMap<SourceKind, Arc<dyn RandomSource>>,
    fallback: FallbackPolicy,
}

impl TripleSource {
    /// Start a builder around a local sampler
    pub fn builder(local: LocalSampler) -> TripleSourceBuilder {
        TripleSourceBuilder::new(local)
    }

    /// Only the local sampler
    pub fn local_only(local: LocalSampler) -> Self {
        Self::builder(local).build()
    }

    /// Triple for a selector string such as `"remote-device"`
    ///
    /// The selector is validated before any provider is contacted.
    pub async fn next_triple_for(&self, selector: &str) -> EntropyResult<Triple> {
        let kind: SourceKind = selector.parse()?;
        self.next_triple(kind).await
    }

    /// Fallback policy in use
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Is a provider configured for this selector?
    pub fn is_configured(&self, kind: SourceKind) -> bool {
        self.providers.contains_key(&kind)
    }

    async fn draw_triple(&self, kind: SourceKind) -> EntropyResult<Triple> {
        let provider = self.providers.get(&kind).ok_or_else(|| {
            EntropyError::ProviderUnavailable(format!("{} is not configured", kind))
        })?;
        let draws = provider.draw(REEL_COUNT).await?;
        triple_from_draws(&draws)
    }
}

#[async_trait]
impl TripleProvider for TripleSource {
    async fn next_triple(&self, kind: SourceKind) -> EntropyResult<Triple> {
        match self.draw_triple(kind).await {
            Err(e)
                if e.is_retryable()
                    && kind != SourceKind::LocalSimulator
                    && self.fallback == FallbackPolicy::LocalSimulator =>
            {
                log::warn!("[TripleSource] {} failed ({}), using local simulator", kind, e);
                self.draw_triple(SourceKind::LocalSimulator).await
            }
            other => other,
        }
    }

    async fn available_sources(&self) -> Vec<SourceKind> {
        let mut ready = Vec::with_capacity(SourceKind::ALL.len());
        for kind in SourceKind::ALL {
            if let Some(provider) = self.providers.get(&kind) {
                if provider.is_ready().await {
                    ready.push(kind);
                }
            }
        }
        ready
    }
}

/// Turn exactly three draws into a triple
pub fn triple_from_draws(draws: &[u8]) -> EntropyResult<Triple> {
    let draws: [u8; REEL_COUNT] = draws.try_into().map_err(|_| {
        EntropyError::Decode(format!("expected {} draws, got {}", REEL_COUNT, draws.len()))
    })?;
    Triple::from_draws(draws).map_err(|e| EntropyError::Decode(e.to_string()))
}

/// Builder for [`TripleSource`]
pub struct TripleSourceBuilder {
    providers: HashMap<SourceKind, Arc<dyn RandomSource>>,
    fallback: FallbackPolicy,
}

impl TripleSourceBuilder {
    fn new(local: LocalSampler) -> Self {
        let mut providers: HashMap<SourceKind, Arc<dyn RandomSource>> = HashMap::new();
        providers.insert(SourceKind::LocalSimulator, Arc::new(local));
        Self {
            providers,
            fallback: FallbackPolicy::None,
        }
    }

    /// Add or replace a provider under its own kind
    ///
    /// A `LocalSimulator` source replaces the built-in sampler for direct
    /// pulls and for fallback alike.
    pub fn provider(mut self, source: Arc<dyn RandomSource>) -> Self {
        self.providers.insert(source.kind(), source);
        self
    }

    /// Set the fallback policy
    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn build(self) -> TripleSource {
        TripleSource {
            providers: self.providers,
            fallback: self.fallback,
        }
    }
}
