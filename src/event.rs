pub mod notification;
pub mod validate;
