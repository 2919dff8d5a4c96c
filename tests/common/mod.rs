//! Scripted in-memory control plane shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tagwright::error::RemoteError;
use tagwright::remote::{
    DeleteOutcome, OperationClient, OperationHandle, ProbeStatus, RemoteResult, TagClient,
};
use tagwright::tags::TagSet;

/// A call received by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTags(String),
    Tag(String, TagSet),
    Untag(String, Vec<String>),
    Delete { target: String, token: String },
    Describe(String),
}

/// Remote operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListTags,
    Tag,
    Untag,
    Delete,
    Describe,
}

/// In-memory remote service.
///
/// Deletable objects carry a probe script. A delete of an object with an
/// empty script completes synchronously; otherwise it returns a pending
/// operation whose probes replay the script, repeating the last entry.
#[derive(Default)]
pub struct FakeCloud {
    tags: Mutex<HashMap<String, TagSet>>,
    objects: Mutex<HashMap<String, VecDeque<ProbeStatus>>>,
    failures: Mutex<HashMap<(String, Op), RemoteError>>,
    calls: Mutex<Vec<Call>>,
    describe_delay: Duration,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(self, identifier: &str, tags: TagSet) -> Self {
        self.tags.lock().unwrap().insert(identifier.to_string(), tags);
        self
    }

    pub fn with_object(self, target: &str, probes: Vec<ProbeStatus>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(target.to_string(), probes.into());
        self
    }

    pub fn failing(self, identifier: &str, op: Op, err: RemoteError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((identifier.to_string(), op), err);
        self
    }

    /// Makes every operation probe take `delay` before answering.
    pub fn with_describe_delay(mut self, delay: Duration) -> Self {
        self.describe_delay = delay;
        self
    }

    pub fn tags_of(&self, identifier: &str) -> Option<TagSet> {
        self.tags.lock().unwrap().get(identifier).cloned()
    }

    pub fn exists(&self, target: &str) -> bool {
        self.objects.lock().unwrap().contains_key(target)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Tag(..) | Call::Untag(..) | Call::Delete { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_failure(&self, identifier: &str, op: Op) -> RemoteResult<()> {
        match self
            .failures
            .lock()
            .unwrap()
            .get(&(identifier.to_string(), op))
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(identifier: &str) -> RemoteError {
    RemoteError::not_found("ResourceNotFoundException", format!("{identifier} not found"))
}

#[async_trait]
impl TagClient for FakeCloud {
    async fn list_tags(&self, identifier: &str) -> RemoteResult<TagSet> {
        self.record(Call::ListTags(identifier.to_string()));
        self.scripted_failure(identifier, Op::ListTags)?;
        self.tags_of(identifier).ok_or_else(|| not_found(identifier))
    }

    async fn tag_resource(&self, identifier: &str, tags: &TagSet) -> RemoteResult<()> {
        self.record(Call::Tag(identifier.to_string(), tags.clone()));
        self.scripted_failure(identifier, Op::Tag)?;

        let mut all = self.tags.lock().unwrap();
        let current = all.get(identifier).cloned().ok_or_else(|| not_found(identifier))?;
        let merged = tags
            .iter()
            .fold(current, |set, t| set.insert(t.key.clone(), t.value.clone()));
        all.insert(identifier.to_string(), merged);
        Ok(())
    }

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> RemoteResult<()> {
        self.record(Call::Untag(identifier.to_string(), keys.to_vec()));
        self.scripted_failure(identifier, Op::Untag)?;

        let mut all = self.tags.lock().unwrap();
        let current = all.get(identifier).cloned().ok_or_else(|| not_found(identifier))?;
        let kept: TagSet = current
            .iter()
            .filter(|t| !keys.contains(&t.key))
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect();
        all.insert(identifier.to_string(), kept);
        Ok(())
    }
}

#[async_trait]
impl OperationClient for FakeCloud {
    async fn delete(&self, target: &str, request_token: &str) -> RemoteResult<DeleteOutcome> {
        self.record(Call::Delete {
            target: target.to_string(),
            token: request_token.to_string(),
        });
        self.scripted_failure(target, Op::Delete)?;

        let mut objects = self.objects.lock().unwrap();
        let pending = match objects.get(target) {
            None => return Err(not_found(target)),
            Some(probes) => !probes.is_empty(),
        };
        if pending {
            Ok(DeleteOutcome::Pending(OperationHandle::new(format!("op-{target}"))))
        } else {
            objects.remove(target);
            Ok(DeleteOutcome::Completed)
        }
    }

    async fn describe_operation(
        &self,
        target: &str,
        _operation: &OperationHandle,
    ) -> RemoteResult<ProbeStatus> {
        self.record(Call::Describe(target.to_string()));
        if !self.describe_delay.is_zero() {
            tokio::time::sleep(self.describe_delay).await;
        }
        self.scripted_failure(target, Op::Describe)?;

        let mut objects = self.objects.lock().unwrap();
        let Some(probes) = objects.get_mut(target) else {
            return Ok(ProbeStatus::NotFound);
        };
        let status = if probes.len() > 1 {
            probes.pop_front()
        } else {
            probes.front().cloned()
        };
        let status = status.unwrap_or(ProbeStatus::NotFound);
        if status == ProbeStatus::state("SUCCEEDED") || status == ProbeStatus::NotFound {
            objects.remove(target);
        }
        Ok(status)
    }
}
