//! Data models for Biblio

pub mod loan;
pub mod material;
pub mod reference;
pub mod role;
pub mod user;

// Re-export commonly used types
pub use loan::{Loan, LoanState};
pub use material::Material;
pub use reference::ReferenceKind;
pub use role::Role;
pub use user::User;
