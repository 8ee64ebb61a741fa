//! flowcheck: declarative UI flow runner
//!
//! Runs ordered UI steps (navigate, type, click, select, assert) against a
//! live page through a [`Driver`] and reports where a flow stopped:
//!
//! ```text
//! Flow (YAML or code)
//!   └── steps: [Step]
//!          │
//!          ▼
//! FlowRunner<D: Driver>   Pending(0) → Pending(1) → … → Passed
//!          │                    └── any failure → Failed(i)
//!          ▼
//! Driver ── PlaywrightDriver (node bridge) or any test double
//!          │
//!          ▼
//! RunReport / SuiteReport (JSON)
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod ordering;
pub mod playwright;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod step;
pub mod storefront;

pub use config::FlowConfig;
pub use driver::{Driver, ElementHandle};
pub use error::{FlowError, FlowResult};
pub use ordering::{ProductRow, SortOrder};
pub use report::{FailureKind, RunReport, RunState, SuiteReport};
pub use runner::{run_suite, FlowRunner, DEFAULT_WAIT};
pub use step::{Flow, Step};
