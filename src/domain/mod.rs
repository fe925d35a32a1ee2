//! Domain model
//!
//! Persisted control-plane entities the upgraders read and mutate. Entity
//! lifecycles are owned by the domain services; the upgrade framework treats
//! them as mutable, paginated, filterable collections.

pub mod api;
pub mod application;
pub mod installation;
pub mod page;
pub mod role;
pub mod tenant;

pub use api::{Api, Category};
pub use application::{ApiKeyMode, Application};
pub use installation::Installation;
pub use page::{Page, Pageable};
pub use role::{Role, RoleScope};
pub use tenant::{Environment, Organization};
