//! Domain types shared across the workspace

mod network;
mod permissions;
mod restrictions;

pub use network::{normalize_source_ip, Cidr};
pub use permissions::{PermissionMap, Permissions};
pub use restrictions::Restrictions;
