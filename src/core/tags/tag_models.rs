// Tags - named labels shared by many questions.
//
// A Tag is a handle: cloning it does not copy the usage counter, every clone
// points at the same catalog entry. This is what lets approving an edit on one
// question move the system-wide count.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct TagEntry {
    name: String,
    usage_count: AtomicU64,
}

#[derive(Clone)]
pub struct Tag {
    entry: Arc<TagEntry>,
}

impl Tag {
    /// Create a catalog entry with no usages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            entry: Arc::new(TagEntry {
                name: normalize_name(&name.into()),
                usage_count: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Number of questions whose approved content currently carries this tag.
    pub fn usage_count(&self) -> u64 {
        self.entry.usage_count.load(Ordering::Relaxed)
    }

    pub fn increment_usage(&self) {
        self.entry.usage_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Never goes below zero.
    pub fn decrement_usage(&self) {
        let _ = self
            .entry
            .usage_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                Some(count.saturating_sub(1))
            });
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("name", &self.name())
            .field("usage_count", &self.usage_count())
            .finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tag names are case-insensitive and never carry surrounding whitespace.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drop repeated tags, keeping the first occurrence of each name.
pub fn dedup_tags(tags: Vec<Tag>) -> Vec<Tag> {
    let mut unique: Vec<Tag> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

/// Move usage counts from the tags of the content being replaced to the tags of
/// the content replacing it. Tags present on both sides end up unchanged.
pub fn reconcile_usage(previous: &[Tag], current: &[Tag]) {
    for tag in previous {
        tag.decrement_usage();
    }
    for tag in current {
        tag.increment_usage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_counter() {
        let ruby = Tag::new("ruby");
        let same = ruby.clone();

        same.increment_usage();
        same.increment_usage();

        assert_eq!(ruby.usage_count(), 2);
    }

    #[test]
    fn test_decrement_saturates_at_zero() {
        let java = Tag::new("java");
        java.decrement_usage();
        assert_eq!(java.usage_count(), 0);
    }

    #[test]
    fn test_names_are_normalized() {
        assert_eq!(Tag::new("  Ruby "), Tag::new("ruby"));
        assert_eq!(Tag::new("Ruby").name(), "ruby");
    }

    #[test]
    fn test_dedup_keeps_first() {
        let tags = dedup_tags(vec![Tag::new("a"), Tag::new("b"), Tag::new("A")]);
        let names: Vec<&str> = tags.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_reconcile_shared_tag_nets_zero() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let rails = Tag::new("rails");
        ruby.increment_usage();
        rails.increment_usage();

        reconcile_usage(
            &[ruby.clone(), rails.clone()],
            &[java.clone(), rails.clone()],
        );

        assert_eq!(ruby.usage_count(), 0);
        assert_eq!(java.usage_count(), 1);
        assert_eq!(rails.usage_count(), 1);
    }
}
