//! Turns an activity edit model into the payload the API accepts.
//!
//! The edit model carries every field the form may have touched, including
//! values left over from a cost type the user switched away from. The payload
//! keeps only what belongs to the chosen cost type, with cleared fields sent as
//! explicit `null` so the server does not fall back to its own defaults.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::entities::{Activity, InternalPaymentRecipient, Price};
use crate::enums::{
    ActivityStatus, ActivityType, PaymentCostType, PaymentFrequency, PaymentMethod, PaymentType,
    RecipientType,
};

/// Individual payment plans start one week out so the first rows can be entered.
pub const INDIVIDUAL_PAYMENT_LEAD_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("activity has no payment plan")]
    MissingPaymentPlan,

    #[error("unknown internal payment recipient: {0}")]
    UnknownInternalRecipient(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Create,
    Update,
}

/// Recipient name → id lookup for INTERNAL recipients.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    by_name: HashMap<String, i64>,
}

impl RecipientDirectory {
    pub fn new(recipients: &[InternalPaymentRecipient]) -> Self {
        Self {
            by_name: recipients.iter().map(|r| (r.name.clone(), r.id)).collect(),
        }
    }

    pub fn id_for(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }
}

/// Everything the sanitizer needs besides the activity itself.
#[derive(Debug, Clone)]
pub struct SanitizeContext<'a> {
    pub today: NaiveDate,
    pub recipients: &'a RecipientDirectory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPlanPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub payment_type: PaymentType,
    pub payment_cost_type: Option<PaymentCostType>,
    pub payment_amount: Option<f64>,
    pub payment_units: Option<f64>,
    pub payment_rate: Option<i64>,
    pub price_per_unit: Option<Price>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub payment_day_of_month: Option<u32>,
    pub recipient_type: Option<RecipientType>,
    pub recipient_id: Option<String>,
    pub recipient_name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_method_details: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub appropriation: i64,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub details: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub note: String,
    pub modifies: Option<i64>,
    pub payment_plan: PaymentPlanPayload,
}

/// Build the create/update payload for `activity`.
///
/// Read-only fields (monthly plan, payments, price history, total cost) have no
/// place in the payload types and are dropped by construction.
pub fn sanitize_activity(
    activity: &Activity,
    mode: RequestMode,
    ctx: &SanitizeContext<'_>,
) -> Result<ActivityPayload, SanitizeError> {
    let plan = activity
        .payment_plan
        .as_ref()
        .ok_or(SanitizeError::MissingPaymentPlan)?;

    let mut start_date = activity.start_date;
    let cost_type = plan.payment_cost_type.unwrap_or_default();

    let mut out = PaymentPlanPayload {
        id: plan.id,
        payment_type: plan.payment_type,
        payment_cost_type: Some(cost_type),
        payment_amount: plan.payment_amount,
        payment_units: plan.payment_units,
        payment_rate: plan.payment_rate,
        price_per_unit: plan.price_per_unit.clone(),
        payment_frequency: plan.payment_frequency,
        payment_day_of_month: plan.payment_day_of_month,
        recipient_type: plan.recipient_type,
        recipient_id: plan.recipient_id.clone(),
        recipient_name: plan.recipient_name.clone(),
        payment_method: plan.payment_method,
        payment_method_details: plan.payment_method_details,
    };

    match cost_type {
        PaymentCostType::PerUnit => {
            out.payment_amount = None;
            out.payment_rate = None;
            let price_unset = out.price_per_unit.as_ref().is_none_or(|p| p.amount.is_none());
            if mode == RequestMode::Create
                && activity.status == ActivityStatus::Expected
                && price_unset
                && let Some(current) = plan.current_price(ctx.today)
            {
                debug!(current, "defaulting unit price from price history");
                let start = out
                    .price_per_unit
                    .as_ref()
                    .and_then(|p| p.start_date)
                    .or(activity.start_date);
                out.price_per_unit = Some(Price {
                    amount: Some(current),
                    start_date: start,
                });
            }
        }
        PaymentCostType::GlobalRate => {
            out.payment_amount = None;
            out.price_per_unit = None;
        }
        PaymentCostType::Fixed => {
            out.payment_rate = None;
            out.price_per_unit = None;
            out.payment_units = None;
        }
    }

    if out.payment_frequency != Some(PaymentFrequency::Monthly) {
        out.payment_day_of_month = None;
    }

    if plan.payment_type == PaymentType::IndividualPayment {
        if mode == RequestMode::Create {
            start_date = Some(ctx.today + Duration::days(INDIVIDUAL_PAYMENT_LEAD_DAYS));
        }
        out.payment_cost_type = None;
        out.payment_amount = None;
        out.payment_units = None;
        out.payment_rate = None;
        out.price_per_unit = None;

        if out.recipient_type == Some(RecipientType::Internal) && out.recipient_id.is_none() {
            let name = out.recipient_name.clone().unwrap_or_default();
            let id = ctx
                .recipients
                .id_for(&name)
                .ok_or(SanitizeError::UnknownInternalRecipient(name))?;
            out.recipient_id = Some(id.to_string());
        }
    }

    Ok(ActivityPayload {
        id: match mode {
            RequestMode::Create => None,
            RequestMode::Update => activity.id,
        },
        appropriation: activity.appropriation,
        activity_type: activity.activity_type,
        status: activity.status,
        details: activity.details,
        start_date,
        end_date: activity.end_date,
        note: activity.note.clone(),
        modifies: activity.modifies,
        payment_plan: out,
    })
}
