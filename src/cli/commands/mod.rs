mod create_user;

pub use create_user::cmd_create_user;
