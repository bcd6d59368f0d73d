// ── Change-aware publishing ──
//
// Writes the derived document into one attribute slot per interested
// consumer, but only when the stored value differs. Every write also bumps
// the consumer's own timestamp so observers of the consumer record see
// that a dependent update happened. An unchanged document produces no
// writes at all.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{CoreError, StoreError};
use crate::model::EntityId;
use crate::netcfg::ConfigDocument;
use crate::store::ConsumerRepository;

/// What happened to one consumer's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Created,
    Updated,
    Unchanged,
}

impl SlotOutcome {
    pub fn is_write(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Step at which publishing to a consumer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Read,
    Write,
    Touch,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "reading slot",
            Self::Write => "writing slot",
            Self::Touch => "touching consumer",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
    pub consumer: EntityId,
    pub stage: PublishStage,
    pub error: StoreError,
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer {}: {} failed: {}", self.consumer, self.stage, self.error)
    }
}

/// Per-run publish summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub attempted: usize,
    pub created: Vec<EntityId>,
    pub updated: Vec<EntityId>,
    pub unchanged: Vec<EntityId>,
}

impl PublishReport {
    /// Number of consumers whose slot was written.
    pub fn changed(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    fn record(&mut self, consumer: EntityId, outcome: SlotOutcome) {
        match outcome {
            SlotOutcome::Created => self.created.push(consumer),
            SlotOutcome::Updated => self.updated.push(consumer),
            SlotOutcome::Unchanged => self.unchanged.push(consumer),
        }
    }
}

impl fmt::Display for PublishReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} consumers: {} created, {} updated, {} unchanged",
            self.attempted,
            self.created.len(),
            self.updated.len(),
            self.unchanged.len()
        )
    }
}

// ── Consumer discovery ───────────────────────────────────────────

/// Service instances whose interest marker lists `capability`, by id.
pub fn interested_consumers<C>(
    repo: &C,
    marker: &str,
    capability: &str,
) -> Result<Vec<EntityId>, StoreError>
where
    C: ConsumerRepository + ?Sized,
{
    let ids: BTreeSet<EntityId> = repo
        .attributes_named(marker)?
        .into_iter()
        .filter(|attr| attr.lists_capability(marker, capability))
        .map(|attr| attr.service_instance_id)
        .collect();
    Ok(ids.into_iter().collect())
}

// ── Publisher ────────────────────────────────────────────────────

/// Publishes documents into a named attribute slot.
pub struct Publisher<'a, C: ConsumerRepository + ?Sized> {
    repo: &'a C,
    channel: &'a str,
}

impl<'a, C: ConsumerRepository + ?Sized> Publisher<'a, C> {
    pub fn new(repo: &'a C, channel: &'a str) -> Self {
        Self { repo, channel }
    }

    /// Publish `document` to every consumer in `consumers`.
    ///
    /// A failing consumer never stops the others; failures are collected
    /// and returned together once every consumer has been attempted.
    pub fn publish(
        &self,
        document: &ConfigDocument,
        consumers: &[EntityId],
    ) -> Result<PublishReport, CoreError> {
        let mut report = PublishReport::default();
        let mut failures = Vec::new();

        for consumer in consumers {
            report.attempted += 1;
            match self.publish_one(document, consumer) {
                Ok(outcome) => report.record(consumer.clone(), outcome),
                Err(failure) => {
                    warn!(%failure, "publish failed");
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(CoreError::Publish { report, failures })
        }
    }

    fn publish_one(
        &self,
        document: &ConfigDocument,
        consumer: &EntityId,
    ) -> Result<SlotOutcome, PublishFailure> {
        let fail = |stage: PublishStage| {
            move |error: StoreError| PublishFailure {
                consumer: consumer.clone(),
                stage,
                error,
            }
        };

        let existing = self
            .repo
            .attribute(consumer, self.channel)
            .map_err(fail(PublishStage::Read))?;

        let outcome = match existing {
            Some(attr) if attr.value == document.as_str() => {
                debug!(%consumer, channel = self.channel, "slot already up to date");
                SlotOutcome::Unchanged
            }
            Some(attr) => {
                info!(%consumer, channel = self.channel, "updating attribute");
                self.repo
                    .update_attribute(&attr.id, document.as_str())
                    .map_err(fail(PublishStage::Write))?;
                SlotOutcome::Updated
            }
            None => {
                info!(%consumer, channel = self.channel, "saving generated config");
                self.repo
                    .create_attribute(consumer, self.channel, document.as_str())
                    .map_err(fail(PublishStage::Write))?;
                SlotOutcome::Created
            }
        };

        if outcome.is_write() {
            self.repo
                .touch_service_instance(consumer)
                .map_err(fail(PublishStage::Touch))?;
        }
        Ok(outcome)
    }
}
