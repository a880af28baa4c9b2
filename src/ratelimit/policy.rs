//! Admission policies and limiter sharing scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ShelfError};

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: u32 = 3;
/// Leak rate (requests per second) used when none is configured.
pub const DEFAULT_LEAK_RATE: u32 = 1;

/// Parameters of a leaky bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPolicy {
    /// Maximum number of admitted requests held in the bucket at once
    pub capacity: u32,
    /// Requests released from the bucket per second
    pub leak_rate: u32,
}

impl LimitPolicy {
    /// Create a validated policy.
    ///
    /// Both values must be positive: a zero capacity would reject every
    /// request, and a zero leak rate would never release a slot.
    pub fn new(capacity: u32, leak_rate: u32) -> Result<Self> {
        let policy = Self {
            capacity,
            leak_rate,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that both parameters are positive.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ShelfError::Config(
                "rate limit capacity must be positive".to_string(),
            ));
        }
        if self.leak_rate == 0 {
            return Err(ShelfError::Config(
                "rate limit leak_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            leak_rate: DEFAULT_LEAK_RATE,
        }
    }
}

impl fmt::Display for LimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capacity={} leak_rate={}/s", self.capacity, self.leak_rate)
    }
}

/// Which requests share a limiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterScope {
    /// One limiter per registered route
    #[default]
    PerRoute,
    /// A single limiter shared by every protected route
    Global,
    /// One limiter per route and client address
    PerClient,
}

impl fmt::Display for LimiterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimiterScope::PerRoute => "per_route",
            LimiterScope::Global => "global",
            LimiterScope::PerClient => "per_client",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_policy() {
        let policy = LimitPolicy::new(3, 1).unwrap();
        assert_eq!(policy.capacity, 3);
        assert_eq!(policy.leak_rate, 1);
        assert_eq!(policy, LimitPolicy::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = LimitPolicy::new(0, 1).unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_zero_leak_rate_rejected() {
        let err = LimitPolicy::new(3, 0).unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
        assert!(err.to_string().contains("leak_rate"));
    }

    #[test]
    fn test_parse_policy_yaml() {
        let yaml = r#"
capacity: 10
leak_rate: 5
"#;
        let policy: LimitPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy, LimitPolicy::new(10, 5).unwrap());
    }

    #[test]
    fn test_deserialized_policy_still_needs_validation() {
        let policy: LimitPolicy = serde_yaml::from_str("capacity: 0\nleak_rate: 1\n").unwrap();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_parse_scope() {
        let scope: LimiterScope = serde_yaml::from_str("per_client").unwrap();
        assert_eq!(scope, LimiterScope::PerClient);
        let scope: LimiterScope = serde_yaml::from_str("global").unwrap();
        assert_eq!(scope, LimiterScope::Global);
        assert_eq!(LimiterScope::default(), LimiterScope::PerRoute);
        assert_eq!(LimiterScope::PerClient.to_string(), "per_client");
    }
}
