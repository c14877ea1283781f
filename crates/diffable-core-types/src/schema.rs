//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Snapshot shape
pub const FIELD_SECTION_COUNT: &str = "section_count";
pub const FIELD_ITEM_COUNT: &str = "item_count";

// Changeset shape
pub const FIELD_CHANGE_COUNT: &str = "change_count";
pub const FIELD_PATCH_OUTCOME: &str = "patch_outcome";
pub const FIELD_ANIMATE: &str = "animate";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
