//! Database entities.

#![allow(missing_docs)]

pub mod district;
pub mod notification;
pub mod report;
pub mod user;

pub use district::Entity as District;
pub use notification::Entity as Notification;
pub use report::Entity as Report;
pub use user::Entity as User;
