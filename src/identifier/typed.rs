//! Typed composite identifiers used by common resource shapes.

use std::fmt;
use std::str::FromStr;

use crate::error::IdentifierError;

use super::codec::IdentifierCodec;

/// Identifier of a single tag managed as its own resource: `resource,key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagResourceId {
    /// Identifier of the tagged resource, typically an ARN.
    pub resource: String,
    /// The tag key.
    pub key: String,
}

impl TagResourceId {
    /// Creates a tag resource identifier.
    #[must_use]
    pub fn new(resource: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            key: key.into(),
        }
    }

    /// Encodes the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is empty or contains the separator.
    pub fn encode(&self) -> Result<String, IdentifierError> {
        IdentifierCodec::default().encode(&[self.resource.as_str(), self.key.as_str()])
    }
}

impl FromStr for TagResourceId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [resource, key] = IdentifierCodec::default().decode_fixed::<2>(s)?;
        Ok(Self { resource, key })
    }
}

impl fmt::Display for TagResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.resource, self.key)
    }
}

/// Identifier of a stack set instance: `stackSetName,accountID,region`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackSetInstanceId {
    /// Name of the owning stack set.
    pub stack_set_name: String,
    /// Target account.
    pub account_id: String,
    /// Target region.
    pub region: String,
}

impl StackSetInstanceId {
    /// Creates a stack set instance identifier.
    #[must_use]
    pub fn new(
        stack_set_name: impl Into<String>,
        account_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            stack_set_name: stack_set_name.into(),
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Encodes the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if any part is empty or contains the separator.
    pub fn encode(&self) -> Result<String, IdentifierError> {
        IdentifierCodec::default().encode(&self.fields())
    }

    /// Returns the identifier fields in encoding order.
    #[must_use]
    pub fn fields(&self) -> [&str; 3] {
        [
            self.stack_set_name.as_str(),
            self.account_id.as_str(),
            self.region.as_str(),
        ]
    }
}

impl FromStr for StackSetInstanceId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [stack_set_name, account_id, region] = IdentifierCodec::default().decode_fixed::<3>(s)?;
        Ok(Self {
            stack_set_name,
            account_id,
            region,
        })
    }
}

impl fmt::Display for StackSetInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.stack_set_name, self.account_id, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_resource_id_parse() {
        let id: TagResourceId = "arn:aws:dynamodb:us-west-2:123456789012:table/t,Owner"
            .parse()
            .expect("valid id");
        assert_eq!(id.resource, "arn:aws:dynamodb:us-west-2:123456789012:table/t");
        assert_eq!(id.key, "Owner");
    }

    #[test]
    fn test_tag_resource_id_rejects_missing_key() {
        assert!("arn:aws:dynamodb:us-west-2:123456789012:table/t".parse::<TagResourceId>().is_err());
        assert!("arn,".parse::<TagResourceId>().is_err());
    }

    #[test]
    fn test_tag_key_with_separator_cannot_be_encoded() {
        let id = TagResourceId::new("arn:aws:sqs:eu-west-1:1:q", "a,b");
        assert!(id.encode().is_err());
    }

    #[test]
    fn test_stack_set_instance_id() {
        let id = StackSetInstanceId::new("tf-acc-test", "123456789012", "eu-central-1");
        let encoded = id.encode().expect("valid fields");
        assert_eq!(encoded, id.to_string());

        let parsed: StackSetInstanceId = encoded.parse().expect("round trip");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_stack_set_instance_id_wrong_arity() {
        let err = "tf-acc-test,123456789012"
            .parse::<StackSetInstanceId>()
            .expect_err("two fields");
        assert!(matches!(
            err,
            IdentifierError::Malformed { expected: 3, found: 2, .. }
        ));
    }
}
