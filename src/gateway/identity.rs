//! Caller identity.

use std::borrow::Cow;

/// Who a request is made on behalf of.
///
/// Callers without an identity are `Anonymous` rather than an empty or
/// sentinel string, so no real client id can collide with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Client(String),
    Anonymous,
    /// The gateway's own health probes.
    HealthProbe,
}

impl Identity {
    /// Identity from an optional header value. Blank values are anonymous.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Identity::Client(v.to_owned()),
            _ => Identity::Anonymous,
        }
    }

    /// Key used for admission control. Client keys are namespaced so they
    /// never equal the anonymous key.
    pub fn limiter_key(&self) -> Cow<'_, str> {
        match self {
            Identity::Client(id) => Cow::Owned(format!("client:{id}")),
            Identity::Anonymous => Cow::Borrowed("anonymous"),
            Identity::HealthProbe => Cow::Borrowed("health-check"),
        }
    }

    /// Health probes are never subject to admission control.
    pub fn is_rate_limited(&self) -> bool {
        !matches!(self, Identity::HealthProbe)
    }

    /// Value sent to the backend in the forwarded-identity header.
    pub fn forwarded_value(&self) -> &str {
        match self {
            Identity::Client(id) => id,
            Identity::Anonymous => "anonymous",
            Identity::HealthProbe => "health-check",
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.forwarded_value())
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Identity::Client(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(Identity::from_header(Some("alice")), Identity::Client("alice".into()));
        assert_eq!(Identity::from_header(Some("  ")), Identity::Anonymous);
        assert_eq!(Identity::from_header(None), Identity::Anonymous);
    }

    #[test]
    fn test_keys_do_not_collide() {
        let spoofed_anonymous = Identity::from("anonymous");
        let spoofed_probe = Identity::from("health-check");

        assert_ne!(spoofed_anonymous.limiter_key(), Identity::Anonymous.limiter_key());
        assert_ne!(spoofed_probe.limiter_key(), Identity::HealthProbe.limiter_key());
        assert!(spoofed_probe.is_rate_limited());
        assert!(!Identity::HealthProbe.is_rate_limited());
    }
}
