//! In-memory implementation of the store traits.
//!
//! Used by tests, the CLI, and the WASM bindings. Every trait call takes the
//! lock once, so each call is atomic with respect to the others, which is
//! what the guarded-write contract needs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::assessment::{Assessment, AssessmentStatus};
use crate::error::StoreError;
use crate::slot::{ExamSlot, NewExamSlot, SlotPatch};
use crate::store::{AssessmentStore, SlotFilter, SlotStore, StoreResult, VersionGuard};

/// Serializable contents of a store: the input and output format of the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    #[serde(default)]
    pub slots: Vec<ExamSlot>,
}

/// Store backed by vectors behind a `tokio` read/write lock.
///
/// Slots are kept in insertion order, and `select_slots` returns them in that
/// order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Snapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records. Ids and versions are kept as given.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.inner.read().await.clone()
    }
}

fn slot_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        entity: "slot",
        id: id.to_string(),
    }
}

fn assessment_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        entity: "assessment",
        id: id.to_string(),
    }
}

#[async_trait]
impl SlotStore for InMemoryStore {
    async fn insert_slot(&self, data: NewExamSlot) -> StoreResult<ExamSlot> {
        let slot = ExamSlot::from_new(Uuid::new_v4().to_string(), data);
        self.inner.write().await.slots.push(slot.clone());
        Ok(slot)
    }

    async fn get_slot(&self, id: &str) -> StoreResult<ExamSlot> {
        self.inner
            .read()
            .await
            .slots
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| slot_not_found(id))
    }

    async fn select_slots(&self, filter: &SlotFilter) -> StoreResult<Vec<ExamSlot>> {
        Ok(self
            .inner
            .read()
            .await
            .slots
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn update_slot(
        &self,
        id: &str,
        patch: &SlotPatch,
        guards: &[VersionGuard],
    ) -> StoreResult<ExamSlot> {
        let mut inner = self.inner.write().await;

        let index = inner
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| slot_not_found(id))?;

        for guard in guards {
            let found = inner
                .slots
                .iter()
                .find(|s| s.id == guard.slot_id)
                .map_or(0, |s| s.version);
            if found != guard.version {
                return Err(StoreError::VersionMismatch {
                    slot_id: guard.slot_id.clone(),
                    expected: guard.version,
                    found,
                });
            }
        }

        let slot = &mut inner.slots[index];
        patch.apply_to(slot);
        slot.version += 1;
        Ok(slot.clone())
    }

    async fn delete_slot(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let index = inner
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| slot_not_found(id))?;
        inner.slots.remove(index);
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn insert_assessment(&self, assessment: Assessment) -> StoreResult<Assessment> {
        let mut inner = self.inner.write().await;
        if inner.assessments.iter().any(|a| a.id == assessment.id) {
            return Err(StoreError::Backend(format!(
                "duplicate assessment id: {}",
                assessment.id
            )));
        }
        inner.assessments.push(assessment.clone());
        Ok(assessment)
    }

    async fn get_assessment(&self, id: &str) -> StoreResult<Assessment> {
        self.inner
            .read()
            .await
            .assessments
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| assessment_not_found(id))
    }

    async fn transition_status(
        &self,
        id: &str,
        from: AssessmentStatus,
        to: AssessmentStatus,
    ) -> StoreResult<Assessment> {
        if !from.can_transition_to(to) {
            return Err(StoreError::Backend(format!(
                "illegal status transition: {from} -> {to}"
            )));
        }
        let mut inner = self.inner.write().await;
        let assessment = inner
            .assessments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| assessment_not_found(id))?;
        if assessment.status != from {
            return Err(StoreError::StatusMismatch {
                assessment_id: id.to_string(),
                expected: from,
                found: assessment.status,
            });
        }
        assessment.status = to;
        Ok(assessment.clone())
    }
}
