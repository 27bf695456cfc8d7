//! Data models for CIM entities.
//!
//! These mirror the JSON the IAM server returns:
//!
//! - `User`, `Group`, `Policy` (with `Statement`): managed records
//! - `List<T>`: envelope returned by list endpoints
//! - `CreatedId`: body returned by create endpoints
//!
//! Fields the console does not know about are kept in an `extra` map so an
//! update sends back everything it received.

pub mod group;
pub mod policy;
pub mod user;

use serde::{Deserialize, Serialize};

pub use group::Group;
pub use policy::{Effect, Policy, Statement};
pub use user::User;

/// The three entity types the console manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Groups,
    Policies,
}

impl ResourceKind {
    /// Collection path segment, e.g. `users`
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Groups => "groups",
            ResourceKind::Policies => "policies",
        }
    }

    pub fn collection_path(&self) -> String {
        format!("/{}", self.segment())
    }

    /// Path of one record. The id is percent-encoded as a single segment.
    pub fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.segment(), urlencoding::encode(id))
    }

    /// Capitalized singular name for messages
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Users => "User",
            ResourceKind::Groups => "Group",
            ResourceKind::Policies => "Policy",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Users => "Users",
            ResourceKind::Groups => "Groups",
            ResourceKind::Policies => "Policies",
        }
    }
}

/// Anything that can be shown as a row and deleted by id.
pub trait Record {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedId {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths() {
        assert_eq!(ResourceKind::Users.collection_path(), "/users");
        assert_eq!(ResourceKind::Groups.item_path("g1"), "/groups/g1");
        assert_eq!(ResourceKind::Policies.item_path("p-9"), "/policies/p-9");
        assert_eq!(ResourceKind::Policies.singular(), "Policy");
        assert_eq!(ResourceKind::Policies.plural(), "Policies");
    }

    #[test]
    fn test_parse_list_envelope() {
        let json = r#"{"data":[{"id":"g1","account_id":"a","name":"ops","desc":""}],"limit":20,"offset":0,"total":1}"#;
        let list: List<Group> = serde_json::from_str(json).unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.total, 1);
        assert_eq!(list.data[0].name, "ops");
    }

    #[test]
    fn test_parse_list_without_paging_fields() {
        let list: List<Group> = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(list.data.is_empty());
        assert_eq!(list.limit, 0);
    }
}
