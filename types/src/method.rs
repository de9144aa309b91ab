//! Method identity: `(service-name, method-name)`.

use core::fmt;

/// Identifies one RPC method within the registry.
///
/// Both components are plain UTF-8 strings, matching the wire representation used
/// by every protocol in [`polyrpc_wire`](../polyrpc_wire/index.html) (service and method
/// names are carried as strings on the wire, never as integers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodId {
    service: String,
    method: String,
}

impl MethodId {
    #[must_use]
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::MethodId;

    #[test]
    fn display_joins_service_and_method_with_slash() {
        let id = MethodId::new("Echo", "Ping");
        assert_eq!(id.to_string(), "Echo/Ping");
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(MethodId::new("A", "B"), MethodId::new("A", "B"));
        assert_ne!(MethodId::new("A", "B"), MethodId::new("A", "C"));
    }
}
