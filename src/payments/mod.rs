pub mod amortization;

pub use amortization::{
    compute_installment, compute_total_payable, derive_terms, AmortizationSchedule, CreditTerms,
    ScheduledPayment,
};
