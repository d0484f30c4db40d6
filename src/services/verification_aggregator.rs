// src/services/verification_aggregator.rs
//! Verification aggregation.
//!
//! A DID can hold one verification per verifier and nothing on-chain ranks them.
//! The aggregator fetches every verifier's record concurrently and reduces them to
//! a single summary:
//! 1. Records from the zero verifier are discarded
//! 2. The highest-level active, unexpired record wins
//! 3. Otherwise the highest-level remaining record is reported as Expired or Revoked
//! 4. With no records at all the summary is level 0, status None
//!
//! A failed per-verifier fetch is logged and counted as "no record"; it never
//! aborts the resolution.

use crate::contracts::VerificationSource;
use crate::models::did::{VerificationLevel, VerificationRecord};
use chrono::Utc;
use ethers_core::types::{Address, H256};
use futures::future::join_all;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which status to report for a record that is both expired and revoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPrecedence {
    #[default]
    Revoked,
    Expired,
}

/// How to order records that share the highest level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Most recently issued, then latest expiration, then verifier order
    #[default]
    NewestTimestamp,
    /// Latest expiration, then most recently issued, then verifier order
    LatestExpiration,
    /// First verifier in the verifier list
    VerifierOrder,
}

/// Display policy for [`VerificationAggregator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    pub status_precedence: StatusPrecedence,
    pub tie_break: TieBreak,
}

/// Aggregated status of a DID's verifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedStatus {
    Active,
    Expired,
    Revoked,
    None,
}

/// Result of [`VerificationAggregator::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Raw level of the selected record, 0 when there is none
    pub level: u64,
    pub tier: VerificationLevel,
    pub status: ResolvedStatus,
    pub record: Option<VerificationRecord>,
}

impl VerificationSummary {
    pub fn none() -> Self {
        VerificationSummary {
            level: 0,
            tier: VerificationLevel::None,
            status: ResolvedStatus::None,
            record: None,
        }
    }

    fn from_record(record: &VerificationRecord, status: ResolvedStatus) -> Self {
        VerificationSummary {
            level: record.level,
            tier: record.tier(),
            status,
            record: Some(record.clone()),
        }
    }
}

/// Reduces per-verifier records to one [`VerificationSummary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationAggregator {
    policy: AggregationPolicy,
}

impl VerificationAggregator {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Resolves `did_id` against `verifiers` at the current time.
    pub async fn resolve<S>(&self, source: &S, did_id: H256, verifiers: &[Address]) -> VerificationSummary
    where
        S: VerificationSource + ?Sized,
    {
        self.resolve_at(source, did_id, verifiers, unix_now()).await
    }

    /// Resolves `did_id` against `verifiers` as of `now` (seconds since epoch).
    pub async fn resolve_at<S>(&self, source: &S, did_id: H256, verifiers: &[Address], now: u64) -> VerificationSummary
    where
        S: VerificationSource + ?Sized,
    {
        let records = collect_records(source, did_id, verifiers).await;
        self.summarize(&records, now)
    }

    /// Resolves `did_id` against the on-chain verifier set.
    ///
    /// When the verifier set cannot be read, `fallback` (usually the session
    /// account) is used as the only verifier.
    pub async fn resolve_for_did<S>(&self, source: &S, did_id: H256, fallback: Option<Address>) -> VerificationSummary
    where
        S: VerificationSource + ?Sized,
    {
        let verifiers = verifier_set_or_fallback(source, fallback).await;
        self.resolve(source, did_id, &verifiers).await
    }

    /// Pure reduction over already fetched, non-null records in verifier order.
    pub fn summarize(&self, records: &[VerificationRecord], now: u64) -> VerificationSummary {
        let indexed = records.iter().enumerate().filter(|(_, r)| !r.is_null());

        let (current, lapsed): (Vec<_>, Vec<_>) =
            indexed.partition(|(_, record)| record.is_active() && !record.is_expired_at(now));

        if let Some((_, best)) = current.into_iter().max_by(|a, b| self.rank(*a, *b)) {
            return VerificationSummary::from_record(best, ResolvedStatus::Active);
        }

        match lapsed.into_iter().max_by(|a, b| self.rank(*a, *b)) {
            Some((_, best)) => VerificationSummary::from_record(best, self.lapsed_status(best, now)),
            None => VerificationSummary::none(),
        }
    }

    fn lapsed_status(&self, record: &VerificationRecord, now: u64) -> ResolvedStatus {
        let expired = record.is_expired_at(now);
        let revoked = !record.is_active();
        match (expired, revoked) {
            (true, true) => match self.policy.status_precedence {
                StatusPrecedence::Revoked => ResolvedStatus::Revoked,
                StatusPrecedence::Expired => ResolvedStatus::Expired,
            },
            (true, false) => ResolvedStatus::Expired,
            _ => ResolvedStatus::Revoked,
        }
    }

    // Greater means "ranks higher"; earlier verifiers win the final tie.
    fn rank(&self, (ia, a): (usize, &VerificationRecord), (ib, b): (usize, &VerificationRecord)) -> Ordering {
        let by_order = ib.cmp(&ia);
        let tie = match self.policy.tie_break {
            TieBreak::NewestTimestamp => a
                .timestamp
                .cmp(&b.timestamp)
                .then(a.expiration.cmp(&b.expiration))
                .then(by_order),
            TieBreak::LatestExpiration => a
                .expiration
                .cmp(&b.expiration)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(by_order),
            TieBreak::VerifierOrder => by_order,
        };
        a.level.cmp(&b.level).then(tie)
    }
}

/// Fetches every verifier's record for `did_id` concurrently.
///
/// Null records are dropped. A failed fetch is logged and treated as absent.
/// The result keeps verifier order.
pub async fn collect_records<S>(source: &S, did_id: H256, verifiers: &[Address]) -> Vec<VerificationRecord>
where
    S: VerificationSource + ?Sized,
{
    let fetches = verifiers.iter().map(|verifier| source.verification(did_id, *verifier));
    let results = join_all(fetches).await;

    verifiers
        .iter()
        .zip(results)
        .filter_map(|(verifier, result)| match result {
            Ok(record) if record.is_null() => None,
            Ok(record) => Some(record),
            Err(e) => {
                warn!("verification of {:#x} by {:#x} unavailable: {}", did_id, verifier, e);
                None
            }
        })
        .collect()
}

/// Reads the verifier set, falling back to `fallback` (or nothing) on failure.
pub async fn verifier_set_or_fallback<S>(source: &S, fallback: Option<Address>) -> Vec<Address>
where
    S: VerificationSource + ?Sized,
{
    match source.verifier_set().await {
        Ok(verifiers) => verifiers,
        Err(e) => {
            warn!("failed to read verifier set, falling back to session account: {}", e);
            fallback.into_iter().collect()
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
