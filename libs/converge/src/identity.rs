//! Object identity.

use std::fmt;
use std::str::FromStr;

use crate::error::ConvergeError;

/// A `(namespace, name)` pair identifying a runtime object to observe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentity {
    pub namespace: String,
    pub name: String,
}

impl ObjectIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectIdentity {
    type Err = ConvergeError;

    /// Parse `namespace/name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, name)) = s.split_once('/') else {
            return Err(ConvergeError::InvalidIdentity(s.to_string()));
        };

        let namespace = namespace.trim();
        let name = name.trim();
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(ConvergeError::InvalidIdentity(s.to_string()));
        }

        Ok(Self::new(namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = ObjectIdentity::new("gatekeeper-system", "gatekeeper-audit");
        assert_eq!(id.to_string(), "gatekeeper-system/gatekeeper-audit");
    }

    #[test]
    fn test_parse() {
        let id: ObjectIdentity = "gatekeeper-system/gatekeeper-controller-manager"
            .parse()
            .unwrap();
        assert_eq!(id.namespace, "gatekeeper-system");
        assert_eq!(id.name, "gatekeeper-controller-manager");

        assert!("no-slash".parse::<ObjectIdentity>().is_err());
        assert!("/name".parse::<ObjectIdentity>().is_err());
        assert!("ns/".parse::<ObjectIdentity>().is_err());
        assert!("ns/a/b".parse::<ObjectIdentity>().is_err());
    }
}
