//! Structured logging facility
//!
//! - one initialization point, [`init`], installing the subscriber for a [`Profile`]
//! - operation macros [`log_op_start!`](crate::log_op_start),
//!   [`log_op_end!`](crate::log_op_end) and [`log_op_error!`](crate::log_op_error)
//!   emitting the field names from `diffable_core_types::schema`
//! - an in-memory capture layer for log assertions in tests
//!
//! Only boundary operations (`apply_snapshot`, `cell`, `supplementary_view`)
//! emit start/end events. The differ, the snapshot and the applicator log
//! at debug level.
//!
//! ```rust
//! use diffable_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
