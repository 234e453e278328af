//! Cache module - region handles and the client-side region registry.
//!
//! ## Architecture
//!
//! - `RegionTemplate` - Config shared by every region one client creates
//! - `Region` - Byte-level handle to a named cluster-side region
//! - `TypedRegion` - Serde-encoded view over a `Region`
//! - `RegionRegistry` - Name-keyed map of handles a client has already opened
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sessions = client.get_region("sessions")?;
//! sessions.put(b"user:42", b"token".to_vec())?;
//!
//! let users: TypedRegion<i64, User> = client.get_typed_region("users")?;
//! users.insert(&42, &user)?;
//! ```

mod config;
mod region;
mod registry;
mod typed;

pub use config::RegionTemplate;
pub use region::Region;
pub use registry::RegionRegistry;
pub use typed::TypedRegion;
