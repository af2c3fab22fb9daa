//! Route table: the client's view of reachable groups.

use std::collections::BTreeSet;

use creel_types::GroupId;

/// The set of replica groups the client currently has routes to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    groups: BTreeSet<GroupId>,
}

impl RouteTable {
    /// Build a route table from the given reachable groups.
    pub fn new(groups: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    /// Whether a route to `group` exists.
    pub fn is_reachable(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    /// Whether routes exist to every group in `groups`.
    pub fn covers(&self, groups: &[GroupId]) -> bool {
        groups.iter().all(|g| self.groups.contains(g))
    }

    /// Number of reachable groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group is reachable.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
