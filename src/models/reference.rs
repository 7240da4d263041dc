//! Reference tables guarded against deletion while still referenced

use serde::Serialize;
use utoipa::ToSchema;

/// Reference entities that are hard-deleted only when nothing points at them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Role,
    Author,
    MaterialType,
    LoanStatus,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Role,
        ReferenceKind::Author,
        ReferenceKind::MaterialType,
        ReferenceKind::LoanStatus,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Role => "roles",
            ReferenceKind::Author => "authors",
            ReferenceKind::MaterialType => "material_types",
            ReferenceKind::LoanStatus => "loan_status",
        }
    }

    /// Human-readable singular name
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Role => "role",
            ReferenceKind::Author => "author",
            ReferenceKind::MaterialType => "material type",
            ReferenceKind::LoanStatus => "loan status",
        }
    }

    /// Label used at the start of a sentence
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceKind::Role => "Role",
            ReferenceKind::Author => "Author",
            ReferenceKind::MaterialType => "Material type",
            ReferenceKind::LoanStatus => "Loan status",
        }
    }

    /// (table, foreign key column) of the rows referencing this entity
    pub fn dependents(&self) -> (&'static str, &'static str) {
        match self {
            ReferenceKind::Role => ("users", "role_id"),
            ReferenceKind::Author => ("materials", "author_id"),
            ReferenceKind::MaterialType => ("materials", "type_id"),
            ReferenceKind::LoanStatus => ("loans", "status_id"),
        }
    }

    pub fn dependent_label(&self) -> &'static str {
        match self {
            ReferenceKind::Role => "user(s)",
            ReferenceKind::Author | ReferenceKind::MaterialType => "material(s)",
            ReferenceKind::LoanStatus => "loan(s)",
        }
    }

    /// Lock the entity row for the rest of the transaction, returning its name
    pub fn lock_sql(&self) -> String {
        format!("SELECT name FROM {} WHERE id = $1 FOR UPDATE", self.table())
    }

    pub fn count_dependents_sql(&self) -> String {
        let (table, column) = self.dependents();
        format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, column)
    }

    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1", self.table())
    }
}

/// Response for a successful reference deletion
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}
