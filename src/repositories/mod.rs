pub mod course_repository;
pub mod favorite_repository;
pub mod folder_repository;
pub mod resource_repository;
pub mod user_repository;

pub use course_repository::*;
pub use favorite_repository::*;
pub use folder_repository::*;
pub use resource_repository::*;
pub use user_repository::*;
