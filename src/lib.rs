pub mod arrears;
pub mod config;
pub mod decimal;
pub mod due_date;
pub mod engine;
pub mod errors;
pub mod events;
pub mod notify;
pub mod obligation;
pub mod schedule;
pub mod status;
pub mod types;

// re-export key types
pub use arrears::{calculate_arrears, ArrearsCalculation, INTEREST_CAP_MULTIPLE, MAX_DAYS_LATE};
pub use config::EngineConfig;
pub use decimal::{Money, Rate};
pub use due_date::resolve_due_date;
pub use engine::{EngineTickReport, PaymentEngine};
pub use errors::{EngineError, Result};
pub use events::{EngineEvent, EventStore};
pub use notify::{
    InMemoryNotificationLog, NotificationLogStore, NotificationRecord, NotificationScheduler,
    Notifier, PaymentTransitionWatcher, TickSummary, WatcherSummary,
};
pub use obligation::{InstallmentPlan, Obligation, ObligationSource, StaticObligationSource};
pub use schedule::{InstallmentEntry, InstallmentSchedule};
pub use status::derive_status;
pub use types::{
    ArrearsKind, InstallmentCounts, InstallmentKind, NotificationKind, ObligationId, PaymentMode,
    PaymentStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
