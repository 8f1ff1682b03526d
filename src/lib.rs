pub mod config;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod guard;
pub mod logging;
pub mod payments;
pub mod registry;
pub mod store;
pub mod types;
pub mod validation;

// re-export key types
pub use config::{CreditConfig, PhoneNormalization, RegistryConfig, ValidationConfig};
pub use decimal::{Money, Rate};
pub use entities::{Bank, BankDraft, BankPatch, Client, ClientDraft, ClientPatch, Credit, CreditDraft, CreditPatch};
pub use errors::{RegistryError, Result};
pub use events::{EventStore, RegistryEvent};
pub use guard::{DeleteCheck, DeleteDetails, DeleteGuard, DeleteOutcome};
pub use payments::{
    compute_installment, compute_total_payable, derive_terms, AmortizationSchedule, CreditTerms,
    ScheduledPayment,
};
pub use registry::{ClientWithCredits, CreditRegistry, CreditStatistics};
pub use store::{EntityStore, InMemoryStore};
pub use types::{BankId, BankStatus, BankType, ClientId, CreditId, CreditOwner, CreditType, PersonType};
pub use validation::{ClientEntry, ValidationErrors};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
