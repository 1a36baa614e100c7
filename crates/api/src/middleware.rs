//! API middleware.

#![allow(missing_docs)]

use civiq_core::{AccountService, DistrictService, NotificationService, ReportService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub district_service: DistrictService,
    pub report_service: ReportService,
    pub notification_service: NotificationService,
}
