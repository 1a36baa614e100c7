//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod district;
pub mod gate;
pub mod notification;
pub mod report;

pub use account::{
    AccountService, RegisterAgentInput, RegisterUserInput, UpdateProfileInput,
};
pub use district::{CreateDistrictInput, DistrictService};
pub use gate::{AuthorizationGate, Identity};
pub use notification::NotificationService;
pub use report::{CreateReportInput, ReportService, ReportView};
