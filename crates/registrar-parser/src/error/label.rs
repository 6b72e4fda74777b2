//! Labeled origins for diagnostic messages.

use registrar_core::provenance::ProvenanceOrigin;

/// A message attached to a place in the source document.
///
/// - **Primary labels** mark where the problem is.
/// - **Secondary labels** point at related places, such as the first
///   definition of a duplicated name.
///
/// ```text
/// error[E304]: named instance `MyFoo` is defined multiple times
///   --> registry.yaml (NamedInstances[3].Name)
///   --> registry.yaml (NamedInstances[0].Name): first defined here
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    origin: ProvenanceOrigin,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(origin: ProvenanceOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(origin: ProvenanceOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the origin this label applies to.
    pub fn origin(&self) -> &ProvenanceOrigin {
        &self.origin
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let origin = ProvenanceOrigin::new("a.yaml", "NamedInstances[0]");
        let label = Label::primary(origin.clone(), "error here");

        assert_eq!(label.origin(), &origin);
        assert_eq!(label.message(), "error here");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(
            ProvenanceOrigin::new("a.yaml", "Namespaces[0]"),
            "first defined here",
        );

        assert_eq!(label.origin().logical_path(), "Namespaces[0]");
        assert!(label.is_secondary());
    }
}
