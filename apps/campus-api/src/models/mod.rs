pub mod announcement;
pub mod event;
pub mod group;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;
