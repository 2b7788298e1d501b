use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Closed set of permission tiers. The `roles` table stays free text; a role
/// row maps onto one of these by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Administrator,
    Trainer,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Account,
    Role,
    Activity,
    Training,
    Attendance,
    Competition,
    Result,
    Statistics,
    Report,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Account,
        Resource::Role,
        Resource::Activity,
        Resource::Training,
        Resource::Attendance,
        Resource::Competition,
        Resource::Result,
        Resource::Statistics,
        Resource::Report,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];
}

/// `Own` grants only rows the actor owns (their profile, their sessions, their
/// attendance); `Any` grants every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Own,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: Resource,
    pub operation: Operation,
    pub scope: Scope,
}

const fn grant(resource: Resource, operation: Operation, scope: Scope) -> Permission {
    Permission {
        resource,
        operation,
        scope,
    }
}

static MEMBER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(grant(Resource::Account, Operation::Read, Scope::Own));
    permissions.insert(grant(Resource::Account, Operation::Update, Scope::Own));
    permissions.insert(grant(Resource::Attendance, Operation::Read, Scope::Own));
    permissions.insert(grant(Resource::Result, Operation::Read, Scope::Own));
    permissions.insert(grant(Resource::Report, Operation::Read, Scope::Own));

    permissions.insert(grant(Resource::Activity, Operation::Read, Scope::Any));
    permissions.insert(grant(Resource::Competition, Operation::Read, Scope::Any));
    permissions.insert(grant(Resource::Training, Operation::Read, Scope::Any));

    permissions
});

static TRAINER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(MEMBER_PERMISSIONS.iter().copied());

    for resource in Resource::ALL {
        if resource != Resource::Statistics {
            permissions.insert(grant(resource, Operation::Read, Scope::Any));
        }
    }
    permissions.insert(grant(Resource::Statistics, Operation::Read, Scope::Own));

    for resource in [Resource::Training, Resource::Attendance] {
        for operation in Operation::ALL {
            permissions.insert(grant(resource, operation, Scope::Own));
        }
    }

    permissions
});

static ADMINISTRATOR_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    for resource in Resource::ALL {
        for operation in Operation::ALL {
            permissions.insert(grant(resource, operation, Scope::Any));
        }
    }

    permissions
});

static NO_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(HashSet::new);

impl RoleKind {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            RoleKind::Member => &MEMBER_PERMISSIONS,
            RoleKind::Trainer => &TRAINER_PERMISSIONS,
            RoleKind::Administrator => &ADMINISTRATOR_PERMISSIONS,
        }
    }

    /// Permission set for a role row that may not map to any kind.
    pub fn permissions_for(kind: Option<RoleKind>) -> &'static HashSet<Permission> {
        match kind {
            Some(kind) => kind.permissions(),
            None => &NO_PERMISSIONS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Administrator => "Administrator",
            RoleKind::Trainer => "Trainer",
            RoleKind::Member => "Member",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [RoleKind::Administrator, RoleKind::Trainer, RoleKind::Member]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Read => f.write_str("read"),
            Operation::Update => f.write_str("update"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}
