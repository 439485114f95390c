mod claims;
mod context;
mod gate;
mod role;

pub use claims::{decode_claims, Claims, DecodeError};
pub use context::{Session, SessionContext};
pub use gate::{Access, AuthGate, Menu, MenuLink, APP_TITLE};
pub use role::UserRole;
