//! The URIs of the pages and API endpoints.

/// The root route which redirects to the bills page.
pub const ROOT: &str = "/";
/// The page for recording and reviewing bills.
pub const BILLS_VIEW: &str = "/bills";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to add a bill (POST) or get all bills with their totals as JSON (GET).
pub const BILLS_API: &str = "/api/bills";
/// The route to delete every bill.
pub const CLEAR_BILLS: &str = "/api/bills/clear";
/// The route to delete every bill when admin mode is turned on.
pub const WIPE_BILLS: &str = "/api/bills/wipe";
/// The route to end the current session.
pub const END_SESSION: &str = "/api/session/end";
