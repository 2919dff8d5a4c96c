//! Tag reconciliation.
//!
//! Converges the tags attached to a remote object toward a desired set with
//! the fewest calls: one removal call for the stale keys and one tagging call
//! for the added and updated pairs. Keys owned by the platform are never
//! touched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::ErrorAggregator;
use crate::config::TagsConfig;
use crate::error::{Mutation, ReconcileError, RemoteError, Result};
use crate::remote::TagClient;
use crate::tags::{KeyCase, ReservedKeys, TagDiff, TagSet};

/// How the removal and tagging calls relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOrder {
    /// Remove first; a failed removal skips the tagging call.
    #[default]
    Sequential,
    /// Issue both calls; failures of either are reported together.
    Independent,
}

/// What an update changed remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUpdateReport {
    /// Object the update targeted.
    pub identifier: String,
    /// Keys removed.
    pub removed: Vec<String>,
    /// Pairs added or overwritten.
    pub applied: TagSet,
    /// Number of remote mutation calls issued.
    pub calls: usize,
}

impl TagUpdateReport {
    fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            removed: Vec::new(),
            applied: TagSet::new(),
            calls: 0,
        }
    }

    /// Returns true if the object already matched the desired tags.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.calls == 0
    }
}

/// Reconciles the tags of remote objects through a [`TagClient`].
pub struct TagReconciler<C: TagClient> {
    /// Remote tagging API.
    client: C,
    /// Keys excluded from every diff.
    reserved: ReservedKeys,
    /// Relation between the removal and tagging calls.
    order: MutationOrder,
    /// Key comparison policy applied to both sides of a diff.
    key_case: KeyCase,
}

impl<C: TagClient> TagReconciler<C> {
    /// Creates a reconciler ignoring `aws:` keys and removing before tagging.
    pub fn new(client: C) -> Self {
        Self {
            client,
            reserved: ReservedKeys::aws(),
            order: MutationOrder::default(),
            key_case: KeyCase::default(),
        }
    }

    /// Creates a reconciler from the `tags` configuration section.
    pub fn from_config(client: C, config: &TagsConfig) -> Self {
        Self {
            client,
            reserved: config.reserved_keys(),
            order: config.mutation_order,
            key_case: config.key_case,
        }
    }

    /// Replaces the reserved key policy.
    #[must_use]
    pub fn with_reserved(mut self, reserved: ReservedKeys) -> Self {
        self.reserved = reserved;
        self
    }

    /// Sets the mutation order.
    #[must_use]
    pub const fn with_mutation_order(mut self, order: MutationOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the key comparison policy.
    #[must_use]
    pub const fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    /// The wrapped client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Converges the tags of `identifier` from `current` to `desired`.
    ///
    /// Issues no call when the sets already agree outside reserved keys.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError::Mutation`] naming the identifier and the
    /// failed call. In [`MutationOrder::Independent`] mode failures of both
    /// calls are returned together as an aggregated error.
    pub async fn update_tags(
        &self,
        identifier: &str,
        current: &TagSet,
        desired: &TagSet,
    ) -> Result<TagUpdateReport> {
        let current = current.clone().with_key_case(self.key_case);
        let desired = desired.clone().with_key_case(self.key_case);
        let diff = TagDiff::compute(&current, &desired).without_reserved(&self.reserved);
        let mut report = TagUpdateReport::new(identifier);

        if diff.is_empty() {
            debug!("Tags of {identifier} already up to date");
            return Ok(report);
        }

        let mut failures = ErrorAggregator::new();

        let removed = diff.removed_keys();
        if !removed.is_empty() {
            info!("Removing {} tag(s) from {identifier}", removed.len());
            report.calls += 1;
            match self.client.untag_resource(identifier, &removed).await {
                Ok(()) => report.removed = removed,
                Err(source) => {
                    let err = mutation_error(identifier, Mutation::TagRemove, source);
                    if self.order == MutationOrder::Sequential {
                        return Err(err.into());
                    }
                    failures.push(identifier, err);
                }
            }
        }

        let apply = diff.to_apply();
        if !apply.is_empty() {
            info!("Applying {} tag(s) to {identifier}", apply.len());
            report.calls += 1;
            match self.client.tag_resource(identifier, &apply).await {
                Ok(()) => report.applied = apply,
                Err(source) => {
                    let err = mutation_error(identifier, Mutation::TagAdd, source);
                    if self.order == MutationOrder::Sequential {
                        return Err(err.into());
                    }
                    failures.push(identifier, err);
                }
            }
        }

        failures.error_or_nil()?;
        Ok(report)
    }

    /// Reads the current tags of `identifier` and converges them to `desired`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError::Mutation`] if listing or mutating fails.
    pub async fn reconcile_tags(&self, identifier: &str, desired: &TagSet) -> Result<TagUpdateReport> {
        let current = self.list_tags(identifier).await?;
        self.update_tags(identifier, &current, desired).await
    }

    /// Reads the value of a single tag.
    ///
    /// A present key with an absent value yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the object has no tag named `key`, or a
    /// [`ReconcileError::Mutation`] if listing fails.
    pub async fn get_tag(&self, identifier: &str, key: &str) -> Result<Option<String>> {
        let tags = self.list_tags(identifier).await?.with_key_case(self.key_case);
        match tags.get(key) {
            Some(tag) => Ok(tag.value.clone()),
            None => Err(mutation_error(
                identifier,
                Mutation::TagList,
                RemoteError::not_found("TagNotFound", format!("tag {key} not found")),
            )
            .into()),
        }
    }

    async fn list_tags(&self, identifier: &str) -> Result<TagSet> {
        let tags = self
            .client
            .list_tags(identifier)
            .await
            .map_err(|source| mutation_error(identifier, Mutation::TagList, source))?;
        debug!("{identifier} carries {} tag(s)", tags.len());
        Ok(tags)
    }
}

fn mutation_error(identifier: &str, mutation: Mutation, source: RemoteError) -> ReconcileError {
    ReconcileError::Mutation {
        identifier: identifier.to_string(),
        mutation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagwrightError;
    use async_trait::async_trait;
    use mockall::{Sequence, mock};

    mock! {
        Tags {}

        #[async_trait]
        impl TagClient for Tags {
            async fn list_tags(&self, identifier: &str) -> crate::remote::RemoteResult<TagSet>;
            async fn tag_resource(&self, identifier: &str, tags: &TagSet) -> crate::remote::RemoteResult<()>;
            async fn untag_resource(&self, identifier: &str, keys: &[String]) -> crate::remote::RemoteResult<()>;
        }
    }

    const ARN: &str = "arn:aws:states:eu-west-1:123456789012:stateMachine:sm";

    fn tags(pairs: &[(&str, Option<&str>)]) -> TagSet {
        pairs
            .iter()
            .fold(TagSet::new(), |set, (k, v)| set.insert(*k, v.map(String::from)))
    }

    #[tokio::test]
    async fn test_matching_sets_issue_no_calls() {
        let mut client = MockTags::new();
        client.expect_untag_resource().never();
        client.expect_tag_resource().never();

        let reconciler = TagReconciler::new(client);
        let set = tags(&[("Name", Some("x")), ("Env", Some("prod"))]);

        let report = reconciler.update_tags(ARN, &set, &set.clone()).await.unwrap();
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_removes_before_adding() {
        let mut client = MockTags::new();
        let mut seq = Sequence::new();
        client
            .expect_untag_resource()
            .withf(|id, keys| id == ARN && keys == ["Stale".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        client
            .expect_tag_resource()
            .withf(|id, tags| {
                id == ARN && tags.len() == 2 && tags.contains_key("Name") && tags.contains_key("New")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let reconciler = TagReconciler::new(client);
        let current = tags(&[("Name", Some("old")), ("Stale", Some("1"))]);
        let desired = tags(&[("Name", Some("new")), ("New", Some("2"))]);

        let report = reconciler.update_tags(ARN, &current, &desired).await.unwrap();
        assert_eq!(report.calls, 2);
        assert_eq!(report.removed, vec!["Stale".to_string()]);
        assert_eq!(report.applied.len(), 2);
    }

    #[tokio::test]
    async fn test_reserved_keys_untouched() {
        let mut client = MockTags::new();
        client.expect_untag_resource().never();
        client
            .expect_tag_resource()
            .withf(|_, tags| tags.len() == 1 && tags.contains_key("Name"))
            .times(1)
            .returning(|_, _| Ok(()));

        let reconciler = TagReconciler::new(client);
        let current = tags(&[("aws:cloudformation:stack-name", Some("s"))]);
        let desired = tags(&[("Name", Some("x"))]);

        let report = reconciler.update_tags(ARN, &current, &desired).await.unwrap();
        assert_eq!(report.calls, 1);
        assert!(report.removed.is_empty());
    }

    #[tokio::test]
    async fn test_case_insensitive_keys_match() {
        let mut client = MockTags::new();
        client.expect_untag_resource().never();
        client.expect_tag_resource().never();

        let reconciler = TagReconciler::new(client).with_key_case(KeyCase::Insensitive);
        let current = tags(&[("NAME", Some("x"))]);
        let desired = tags(&[("name", Some("x"))]);

        let report = reconciler.update_tags(ARN, &current, &desired).await.unwrap();
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_failed_removal_skips_tagging() {
        let mut client = MockTags::new();
        client
            .expect_untag_resource()
            .times(1)
            .returning(|_, _| Err(RemoteError::fatal("AccessDenied", "not allowed")));
        client.expect_tag_resource().never();

        let reconciler = TagReconciler::new(client);
        let current = tags(&[("Stale", Some("1"))]);
        let desired = tags(&[("Name", Some("x"))]);

        let err = reconciler.update_tags(ARN, &current, &desired).await.unwrap_err();
        match err {
            TagwrightError::Reconcile(ReconcileError::Mutation {
                identifier,
                mutation,
                source,
            }) => {
                assert_eq!(identifier, ARN);
                assert_eq!(mutation, Mutation::TagRemove);
                assert_eq!(source.code, "AccessDenied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_independent_mode_reports_both_failures() {
        let mut client = MockTags::new();
        client
            .expect_untag_resource()
            .times(1)
            .returning(|_, _| Err(RemoteError::fatal("AccessDenied", "remove denied")));
        client
            .expect_tag_resource()
            .times(1)
            .returning(|_, _| Err(RemoteError::fatal("AccessDenied", "tag denied")));

        let reconciler =
            TagReconciler::new(client).with_mutation_order(MutationOrder::Independent);
        let current = tags(&[("Stale", Some("1"))]);
        let desired = tags(&[("Name", Some("x"))]);

        let err = reconciler.update_tags(ARN, &current, &desired).await.unwrap_err();
        let TagwrightError::Aggregated(agg) = err else {
            panic!("expected aggregated error");
        };
        assert_eq!(agg.len(), 2);
        let message = agg.to_string();
        assert!(message.contains("tag-remove"));
        assert!(message.contains("tag-add"));
    }

    #[tokio::test]
    async fn test_reconcile_lists_then_updates() {
        let mut client = MockTags::new();
        client
            .expect_list_tags()
            .withf(|id| id == ARN)
            .times(1)
            .returning(|_| Ok(TagSet::from_pairs([("Name", "x")])));
        client.expect_untag_resource().never();
        client.expect_tag_resource().never();

        let reconciler = TagReconciler::new(client);
        let report = reconciler
            .reconcile_tags(ARN, &tags(&[("Name", Some("x"))]))
            .await
            .unwrap();
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_get_tag() {
        let mut client = MockTags::new();
        client
            .expect_list_tags()
            .returning(|_| Ok(TagSet::from_pairs([("Name", "x")]).insert("bare", None)));

        let reconciler = TagReconciler::new(client);
        assert_eq!(
            reconciler.get_tag(ARN, "Name").await.unwrap(),
            Some("x".to_string())
        );
        assert_eq!(reconciler.get_tag(ARN, "bare").await.unwrap(), None);

        let err = reconciler.get_tag(ARN, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_tag_follows_key_case() {
        let mut client = MockTags::new();
        client
            .expect_list_tags()
            .returning(|_| Ok(TagSet::from_pairs([("Name", "x")])));

        let reconciler = TagReconciler::new(client).with_key_case(KeyCase::Insensitive);
        assert_eq!(
            reconciler.get_tag(ARN, "name").await.unwrap(),
            Some("x".to_string())
        );
        assert_eq!(
            reconciler.get_tag(ARN, "NAME").await.unwrap(),
            Some("x".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_failure_names_identifier() {
        let mut client = MockTags::new();
        client
            .expect_list_tags()
            .returning(|_| Err(RemoteError::not_found("ResourceNotFound", "gone")));

        let reconciler = TagReconciler::new(client);
        let err = reconciler.reconcile_tags(ARN, &TagSet::new()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("tag-list"));
        assert!(err.to_string().contains(ARN));
    }
}
