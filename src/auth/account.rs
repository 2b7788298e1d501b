use chrono::NaiveDate;
use serde::Serialize;

use super::RoleKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub kind: Option<RoleKind>,
}

impl Role {
    pub fn new(id: i64, name: String) -> Self {
        let kind = RoleKind::from_name(&name);
        Self { id, name, kind }
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbRole {
    pub id: i64,
    pub name: String,
}

impl From<DbRole> for Role {
    fn from(role: DbRole) -> Self {
        Role::new(role.id, role.name)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAccount {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
}

impl From<DbAccount> for Account {
    fn from(account: DbAccount) -> Self {
        Self {
            id: account.id.unwrap_or_default(),
            first_name: account.first_name.unwrap_or_default(),
            last_name: account.last_name.unwrap_or_default(),
            email: account.email.unwrap_or_default(),
            birth_date: account.birth_date,
            role: Role::new(
                account.role_id.unwrap_or_default(),
                account.role_name.unwrap_or_default(),
            ),
        }
    }
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role.kind
    }

    pub fn is(&self, kind: RoleKind) -> bool {
        self.role.kind == Some(kind)
    }
}
