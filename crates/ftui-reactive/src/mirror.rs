#![forbid(unsafe_code)]

//! Structured, read-only views of publishers and conduits for tooling.
//!
//! A [`Mirror`] names its subject and lists labelled children. It is purely
//! observational: building one never changes behavior.

use std::fmt;

/// A labelled child entry in a [`Mirror`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorChild {
    pub label: &'static str,
    pub value: String,
}

/// Structured description of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    pub subject: String,
    pub children: Vec<MirrorChild>,
}

impl Mirror {
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            children: Vec::new(),
        }
    }

    /// Append a child entry.
    #[must_use]
    pub fn with_child(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.children.push(MirrorChild {
            label,
            value: value.into(),
        });
        self
    }

    /// Look up a child by label.
    #[must_use]
    pub fn child(&self, label: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.value.as_str())
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)?;
        if self.children.is_empty() {
            return Ok(());
        }
        f.write_str(" { ")?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", child.label, child.value)?;
        }
        f.write_str(" }")
    }
}

/// Types that expose a [`Mirror`].
pub trait Reflect {
    fn mirror(&self) -> Mirror;
}

/// Type name without module path or generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    struct Probe<T>(T);

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name::<Probe<Vec<u8>>>(), "Probe");
        assert_eq!(short_type_name::<u32>(), "u32");
    }

    #[test]
    fn display_lists_children() {
        let mirror = Mirror::new("ObservableObjectPublisher").with_child("downstream", "Sink");
        assert_eq!(mirror.to_string(), "ObservableObjectPublisher { downstream: Sink }");
        assert_eq!(mirror.child("downstream"), Some("Sink"));
        assert_eq!(mirror.child("missing"), None);
    }

    #[test]
    fn display_without_children() {
        assert_eq!(Mirror::new("Empty").to_string(), "Empty");
    }
}
