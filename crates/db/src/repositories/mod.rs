//! Database repositories.

#![allow(missing_docs)]

pub mod district;
pub mod notification;
pub mod report;
pub mod user;

pub use district::DistrictRepository;
pub use notification::NotificationRepository;
pub use report::ReportRepository;
pub use user::UserRepository;
