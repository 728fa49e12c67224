// shared key/id types
use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Hierarchy`](crate::core::hierarchy::Hierarchy) arena.
pub type NodeId = u32;

/// Grouping value of one nesting level.
///
/// `NoParent` marks a record whose declared parent group is absent. Groups
/// carrying it are the ones the reconciler dissolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Value(String),
    Missing,
    NoParent,
}

impl GroupKey {
    pub fn is_no_parent(&self) -> bool {
        matches!(self, GroupKey::NoParent)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, GroupKey::Missing)
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            GroupKey::Value(v) => Some(v),
            _ => None,
        }
    }

    //normalize an optional parent reference: absent -> NoParent
    pub fn parent<K: Into<GroupKey>>(key: Option<K>) -> GroupKey {
        key.map(Into::into).unwrap_or(GroupKey::NoParent)
    }
}

impl From<&str> for GroupKey {
    fn from(v: &str) -> Self {
        GroupKey::Value(v.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(v: String) -> Self {
        GroupKey::Value(v)
    }
}

impl From<&String> for GroupKey {
    fn from(v: &String) -> Self {
        GroupKey::Value(v.clone())
    }
}

//required level: absent -> Missing
impl<T: Into<GroupKey>> From<Option<T>> for GroupKey {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(GroupKey::Missing)
    }
}

macro_rules! key_from_display {
    ($($t:ty),*) => {
        $(
            impl From<$t> for GroupKey {
                fn from(v: $t) -> Self {
                    GroupKey::Value(v.to_string())
                }
            }
        )*
    };
}

key_from_display!(i32, i64, u32, u64, usize, bool, char);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Value(v) => write!(f, "{v}"),
            GroupKey::Missing => write!(f, "<missing>"),
            GroupKey::NoParent => write!(f, "<no parent>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_normalizes_absent_to_no_parent() {
        assert_eq!(GroupKey::parent::<&str>(None), GroupKey::NoParent);
        assert_eq!(GroupKey::parent(Some("p1")), GroupKey::Value("p1".into()));
        assert_eq!(GroupKey::parent(Some(7u32)), GroupKey::Value("7".into()));
    }

    #[test]
    fn sentinel_is_distinct_from_any_value() {
        //a literal string that looks like a sentinel is still just a value
        let k = GroupKey::from("__noParent");
        assert!(!k.is_no_parent());
        assert_eq!(k.as_value(), Some("__noParent"));
        assert!(GroupKey::NoParent.is_no_parent());
        assert!(GroupKey::Missing.is_missing());
    }
}
