//! Core types and business rules for the bevplatform case-management client.

pub mod entities;
pub mod enums;
pub mod format;
pub mod permissions;
pub mod sanitize;

pub use entities::{
    Activity, ActivityDetails, Appropriation, Case, GrantRequest, InternalPaymentRecipient,
    Municipality, NewAppropriation, NewCase, NewPayment, Payment, PaymentPlan, PaymentUpdate,
    Price, SchoolDistrict, Section, Team, User,
};
pub use enums::{
    ActivityStatus, ActivityType, AppropriationStatus, PaymentCostType, PaymentFrequency,
    PaymentMethod, PaymentType, Profile, RecipientType, Rights,
};
pub use permissions::PaymentCapabilities;
pub use sanitize::{RecipientDirectory, RequestMode, SanitizeContext, SanitizeError};
