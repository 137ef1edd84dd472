pub mod prelude;

pub mod images;
pub mod users;
