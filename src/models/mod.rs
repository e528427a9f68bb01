pub mod course;
pub mod folder;
pub mod resource;
pub mod user;

pub use course::*;
pub use folder::*;
pub use resource::*;
pub use user::*;
