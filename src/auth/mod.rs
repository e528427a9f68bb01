pub mod claims;
pub mod errors;
pub mod extractors;
pub mod jwt;
pub mod password;

pub use claims::*;
pub use errors::*;
pub use extractors::*;
pub use jwt::*;
pub use password::*;
