//! In-memory job record store
//!
//! Same conditional-write contract as the Postgres store, guarded by a single
//! mutex. Records do not survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mlpipe_core::domain::job::{JobFailure, JobRecord, JobStatus};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::job::{Claim, JobStore, StoreResult, Transition};

#[derive(Default)]
pub struct InMemoryJobStore {
    records: Mutex<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn claim(&self, candidate: JobRecord) -> StoreResult<Claim> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        match records.get(&candidate.job_id) {
            Some(existing) if !existing.status.is_terminal() => {
                Ok(Claim::Existing(existing.clone()))
            }
            Some(existing) => {
                let mut record = candidate;
                record.attempt = existing.attempt + 1;
                records.insert(record.job_id.clone(), record.clone());
                Ok(Claim::Created(record))
            }
            None => {
                let mut record = candidate;
                record.attempt = 1;
                records.insert(record.job_id.clone(), record.clone());
                Ok(Claim::Created(record))
            }
        }
    }

    async fn transition(&self, t: &Transition) -> StoreResult<Option<JobRecord>> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(record) = records.get_mut(&t.job_id) else {
            return Ok(None);
        };

        if record.attempt != t.attempt || record.status != t.from {
            return Ok(None);
        }

        record.status = t.to;
        if t.to.is_terminal() {
            record.ended_at = Some(t.at);
        }
        if let Some(error) = &t.error {
            record.error = Some(error.clone());
        }
        if let Some(handle) = &t.external_handle {
            record.external_handle = Some(handle.clone());
        }

        Ok(Some(record.clone()))
    }

    async fn find_by_id(&self, job_id: &str) -> StoreResult<Option<JobRecord>> {
        Ok(self.records.lock().unwrap_or_else(PoisonError::into_inner).get(job_id).cloned())
    }

    async fn list(&self, status: Option<JobStatus>) -> StoreResult<Vec<JobRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let mut jobs: Vec<JobRecord> = records
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(jobs)
    }

    async fn fail_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        failure: &JobFailure,
    ) -> StoreResult<Vec<JobRecord>> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        let failed = records
            .values_mut()
            .filter(|r| r.status == JobStatus::Pending && r.started_at < cutoff)
            .map(|r| {
                r.status = JobStatus::Failed;
                r.ended_at = Some(now);
                r.error = Some(failure.clone());
                r.clone()
            })
            .collect();

        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{network, train_action};
    use chrono::Duration;
    use mlpipe_core::domain::job::FailureKind;
    use std::sync::Arc;

    fn candidate(key: &str) -> JobRecord {
        JobRecord::pending(train_action(key), network(), Utc::now())
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_while_active() {
        let store = InMemoryJobStore::new();

        let first = store.claim(candidate("raw/a.csv")).await.unwrap();
        let second = store.claim(candidate("raw/a.csv")).await.unwrap();

        assert!(matches!(first, Claim::Created(_)));
        match second {
            Claim::Existing(record) => assert_eq!(record.attempt, 1),
            other => panic!("expected existing record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_claim_replaces_terminal_record() {
        let store = InMemoryJobStore::new();

        let Claim::Created(record) = store.claim(candidate("raw/a.csv")).await.unwrap() else {
            panic!("expected fresh claim");
        };
        let failure = JobFailure::new(FailureKind::Submission, "rejected");
        store
            .transition(&Transition::new(&record, JobStatus::Failed).with_error(failure))
            .await
            .unwrap()
            .unwrap();

        match store.claim(candidate("raw/a.csv")).await.unwrap() {
            Claim::Created(replaced) => {
                assert_eq!(replaced.attempt, 2);
                assert_eq!(replaced.status, JobStatus::Pending);
                assert!(replaced.error.is_none());
            }
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transition_requires_expected_state() {
        let store = InMemoryJobStore::new();
        let Claim::Created(record) = store.claim(candidate("raw/a.csv")).await.unwrap() else {
            panic!("expected fresh claim");
        };

        let running = store
            .transition(&Transition::new(&record, JobStatus::Running).with_handle("arn:1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(running.external_handle.as_deref(), Some("arn:1"));
        assert!(running.ended_at.is_none());

        // Stale view of the record: still thinks it is Pending
        let stale = store
            .transition(&Transition::new(&record, JobStatus::Failed))
            .await
            .unwrap();
        assert!(stale.is_none());

        let done = store
            .transition(&Transition::new(&running, JobStatus::Succeeded))
            .await
            .unwrap()
            .unwrap();
        assert!(done.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_claims_create_once() {
        let store = Arc::new(InMemoryJobStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.claim(candidate("raw/a.csv")).await.unwrap() })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), Claim::Created(_)) {
                created += 1;
            }
        }

        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_fail_stale_pending() {
        let store = InMemoryJobStore::new();
        let mut old = candidate("raw/old.csv");
        old.started_at = Utc::now() - Duration::minutes(30);
        store.claim(old.clone()).await.unwrap();
        store.claim(candidate("raw/new.csv")).await.unwrap();

        let failure = JobFailure::new(FailureKind::Abandoned, "never submitted");
        let reaped = store
            .fail_stale_pending(Utc::now() - Duration::minutes(5), &failure)
            .await
            .unwrap();

        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].job_id, old.job_id);
        assert_eq!(
            store.list(Some(JobStatus::Pending)).await.unwrap().len(),
            1
        );
    }
}
