//! Who may do what to payments and activities.
//!
//! The server is the authority on every rule here; these predicates only let a
//! client hide actions that would be refused anyway.

use chrono::NaiveDate;

use crate::entities::{Activity, Payment};
use crate::enums::{ActivityStatus, PaymentMethod, PaymentType, Profile};

/// Days around the planned date in which a batch-processed payment may already
/// have been picked up by payroll or the cash run.
pub const BATCH_WARNING_DAYS: i64 = 2;

/// Manual payment rows are only allowed on individual payment plans of
/// activities that are not yet granted.
pub fn can_create_payment(
    profile: Profile,
    status: ActivityStatus,
    payment_type: PaymentType,
) -> bool {
    payment_type == PaymentType::IndividualPayment
        && status != ActivityStatus::Granted
        && profile.rights().edit
}

pub fn can_delete_payment(
    profile: Profile,
    status: ActivityStatus,
    payment_type: PaymentType,
) -> bool {
    can_create_payment(profile, status, payment_type)
}

/// Privileged profiles may edit payments of any plan type until the activity
/// is granted.
pub fn can_edit_payment(
    profile: Profile,
    status: ActivityStatus,
    payment_type: PaymentType,
) -> bool {
    can_create_payment(profile, status, payment_type)
        || (profile.rights().privileged && status != ActivityStatus::Granted)
}

/// Whether `payment` may be registered as paid from the client.
pub fn is_payable(profile: Profile, status: ActivityStatus, payment: &Payment) -> bool {
    if status != ActivityStatus::Granted {
        return false;
    }
    let rights = profile.rights();
    if rights.privileged {
        return true;
    }
    payment.is_payable_manually
        && !payment.paid
        && rights.edit
        && !payment.payment_method.is_batch_processed()
}

/// Warning shown before editing a payment an external batch may overwrite.
///
/// The edit is still allowed: a manual change close to the planned date can be
/// silently replaced when payroll (SD) or the cash run picks the payment up.
pub fn warn_edit_payment(payment: &Payment, today: NaiveDate) -> Option<String> {
    let system = match payment.payment_method {
        PaymentMethod::Sd => "SD-løn",
        PaymentMethod::Cash => "kontant udbetaling",
        PaymentMethod::Invoice | PaymentMethod::Internal => return None,
    };
    let days = (payment.date - today).num_days();
    if days.abs() > BATCH_WARNING_DAYS {
        return None;
    }
    Some(format!(
        "Betalingen den {} behandles snart af {system}. Manuelle ændringer kan blive overskrevet.",
        payment.date.format("%d.%m.%Y")
    ))
}

/// Editing a granted activity goes through an adjustment instead.
pub fn can_edit_activity(profile: Profile, status: ActivityStatus) -> bool {
    profile.rights().edit && status != ActivityStatus::Granted
}

/// Create an EXPECTED adjustment of a granted activity.
pub fn can_adjust_activity(profile: Profile, status: ActivityStatus) -> bool {
    profile.rights().edit && status == ActivityStatus::Granted
}

pub fn can_delete_activity(profile: Profile, status: ActivityStatus) -> bool {
    profile.rights().edit
        && matches!(
            status,
            ActivityStatus::Draft | ActivityStatus::Budgeted | ActivityStatus::Expected
        )
}

/// An appropriation can be granted when something in it is awaiting approval.
pub fn can_grant_appropriation(profile: Profile, activities: &[Activity]) -> bool {
    profile.rights().grant && activities.iter().any(|a| a.status.awaits_approval())
}

/// Payment capability flags for one activity, evaluated once per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentCapabilities {
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl PaymentCapabilities {
    pub fn evaluate(profile: Profile, status: ActivityStatus, payment_type: PaymentType) -> Self {
        Self {
            can_create: can_create_payment(profile, status, payment_type),
            can_edit: can_edit_payment(profile, status, payment_type),
            can_delete: can_delete_payment(profile, status, payment_type),
        }
    }

    /// Flags for an activity, or all false when it has no payment plan.
    pub fn for_activity(profile: Profile, activity: &Activity) -> Self {
        match &activity.payment_plan {
            Some(plan) => Self::evaluate(profile, activity.status, plan.payment_type),
            None => Self {
                can_create: false,
                can_edit: false,
                can_delete: false,
            },
        }
    }
}
