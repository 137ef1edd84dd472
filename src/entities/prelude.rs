pub use super::images::Entity as Images;
pub use super::users::Entity as Users;
