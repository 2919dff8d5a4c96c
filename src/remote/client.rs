//! Remote client traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::tags::TagSet;

use super::types::{DeleteOutcome, OperationHandle, ProbeStatus};

/// Result of a single remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Tag capabilities of a remote service.
#[async_trait]
pub trait TagClient: Send + Sync {
    /// Lists the tags currently attached to `identifier`.
    ///
    /// Fails with a not-found [`RemoteError`] if the object is absent.
    async fn list_tags(&self, identifier: &str) -> RemoteResult<TagSet>;

    /// Adds or overwrites `tags` on `identifier`.
    async fn tag_resource(&self, identifier: &str, tags: &TagSet) -> RemoteResult<()>;

    /// Removes `keys` from `identifier`.
    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> RemoteResult<()>;
}

/// Asynchronous delete capabilities of a remote service.
#[async_trait]
pub trait OperationClient: Send + Sync {
    /// Starts deleting `target`.
    ///
    /// `request_token` is unique per call and lets the remote side
    /// deduplicate retried requests.
    async fn delete(&self, target: &str, request_token: &str) -> RemoteResult<DeleteOutcome>;

    /// Reports the status of `operation` acting on `target`.
    async fn describe_operation(
        &self,
        target: &str,
        operation: &OperationHandle,
    ) -> RemoteResult<ProbeStatus>;
}

#[async_trait]
impl<T: TagClient + ?Sized> TagClient for Arc<T> {
    async fn list_tags(&self, identifier: &str) -> RemoteResult<TagSet> {
        (**self).list_tags(identifier).await
    }

    async fn tag_resource(&self, identifier: &str, tags: &TagSet) -> RemoteResult<()> {
        (**self).tag_resource(identifier, tags).await
    }

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> RemoteResult<()> {
        (**self).untag_resource(identifier, keys).await
    }
}

#[async_trait]
impl<T: TagClient + ?Sized> TagClient for Box<T> {
    async fn list_tags(&self, identifier: &str) -> RemoteResult<TagSet> {
        (**self).list_tags(identifier).await
    }

    async fn tag_resource(&self, identifier: &str, tags: &TagSet) -> RemoteResult<()> {
        (**self).tag_resource(identifier, tags).await
    }

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> RemoteResult<()> {
        (**self).untag_resource(identifier, keys).await
    }
}

#[async_trait]
impl<T: OperationClient + ?Sized> OperationClient for Arc<T> {
    async fn delete(&self, target: &str, request_token: &str) -> RemoteResult<DeleteOutcome> {
        (**self).delete(target, request_token).await
    }

    async fn describe_operation(
        &self,
        target: &str,
        operation: &OperationHandle,
    ) -> RemoteResult<ProbeStatus> {
        (**self).describe_operation(target, operation).await
    }
}

#[async_trait]
impl<T: OperationClient + ?Sized> OperationClient for Box<T> {
    async fn delete(&self, target: &str, request_token: &str) -> RemoteResult<DeleteOutcome> {
        (**self).delete(target, request_token).await
    }

    async fn describe_operation(
        &self,
        target: &str,
        operation: &OperationHandle,
    ) -> RemoteResult<ProbeStatus> {
        (**self).describe_operation(target, operation).await
    }
}
