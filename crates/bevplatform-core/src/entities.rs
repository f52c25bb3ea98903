//! Entities as served by the case-management API.
//!
//! These are read-through copies; the server owns every record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{
    ActivityStatus, ActivityType, AppropriationStatus, PaymentCostType, PaymentFrequency,
    PaymentMethod, PaymentType, Profile, RecipientType,
};

/// Monetary fields arrive either as JSON numbers or as decimal strings ("500.00").
pub mod amount {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Raw::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid amount: {s:?}"))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_opt(deserializer)?.ok_or_else(|| D::Error::custom("amount is null"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub sbsys_id: String,
    pub cpr_number: String,
    #[serde(default)]
    pub name: String,
    /// User id of the responsible case worker.
    pub case_worker: Option<i64>,
    pub district: Option<i64>,
    pub target_group: Option<i64>,
    #[serde(default)]
    pub effort_step: Option<i64>,
    #[serde(default)]
    pub scaling_step: Option<i64>,
    #[serde(default)]
    pub paying_municipality: Option<i64>,
    #[serde(default)]
    pub acting_municipality: Option<i64>,
    #[serde(default)]
    pub residence_municipality: Option<i64>,
    #[serde(default)]
    pub team: Option<i64>,
    #[serde(default)]
    pub note: String,
}

/// Fields sent when creating a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    pub sbsys_id: String,
    pub cpr_number: String,
    pub name: String,
    pub case_worker: Option<i64>,
    pub district: Option<i64>,
    pub target_group: Option<i64>,
    pub effort_step: Option<i64>,
    pub scaling_step: Option<i64>,
    pub paying_municipality: Option<i64>,
    pub acting_municipality: Option<i64>,
    pub residence_municipality: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appropriation {
    pub id: i64,
    pub sbsys_id: String,
    pub case: i64,
    /// Legal section the appropriation is granted under.
    pub section: Option<i64>,
    #[serde(default)]
    pub status: AppropriationStatus,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub granted_from_date: Option<NaiveDate>,
    #[serde(default)]
    pub granted_to_date: Option<NaiveDate>,
    #[serde(default)]
    pub activities: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppropriation {
    pub sbsys_id: String,
    pub case: i64,
    pub section: Option<i64>,
    pub note: String,
}

/// Body of the grant action on an appropriation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub activities: Vec<i64>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
}

/// One entry of a payment plan's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    #[serde(deserialize_with = "amount::deserialize")]
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub payment_schedule: i64,
    /// Planned payment date.
    pub date: NaiveDate,
    #[serde(deserialize_with = "amount::deserialize")]
    pub amount: f64,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub paid_amount: Option<f64>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    pub recipient_type: Option<RecipientType>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_payable_manually: bool,
    #[serde(default)]
    pub note: String,
}

/// Fields for a manual payment row on an individual payment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub payment_schedule: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub note: String,
}

/// Partial update of a payment, or an actual payout recorded against it.
///
/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// How payments for an activity are computed and scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    #[serde(default)]
    pub id: Option<i64>,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub payment_cost_type: Option<PaymentCostType>,
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub payment_amount: Option<f64>,
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub payment_units: Option<f64>,
    /// Id of the global rate (takst) used for GLOBAL_RATE plans.
    #[serde(default)]
    pub payment_rate: Option<i64>,
    #[serde(default)]
    pub price_per_unit: Option<Price>,
    #[serde(default)]
    pub price_history: Vec<PriceHistoryEntry>,
    #[serde(default)]
    pub payment_frequency: Option<PaymentFrequency>,
    #[serde(default)]
    pub payment_day_of_month: Option<u32>,
    pub recipient_type: Option<RecipientType>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_method_details: Option<i64>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl PaymentPlan {
    /// Price in effect on `today`: the latest history entry already started.
    pub fn current_price(&self, today: NaiveDate) -> Option<f64> {
        self.price_history
            .iter()
            .filter(|p| p.start_date <= today && p.end_date.is_none_or(|end| end >= today))
            .max_by_key(|p| p.start_date)
            .map(|p| p.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    pub date_month: String,
    #[serde(deserialize_with = "amount::deserialize")]
    pub amount: f64,
}

/// An activity as served, and as held in memory while it is being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: Option<i64>,
    pub appropriation: i64,
    #[serde(default)]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub status: ActivityStatus,
    /// Catalogue entry (see [`ActivityDetails`]).
    pub details: Option<i64>,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: String,
    /// The granted activity an EXPECTED adjustment replaces.
    #[serde(default)]
    pub modifies: Option<i64>,
    pub payment_plan: Option<PaymentPlan>,
    #[serde(default)]
    pub monthly_payment_plan: Vec<MonthlyAmount>,
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub total_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub team: Option<i64>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    /// Users without an assigned profile only get read access.
    pub fn effective_profile(&self) -> Profile {
        self.profile.unwrap_or(Profile::Readonly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub leader: Option<i64>,
}

/// A legal paragraph appropriations are granted under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub paragraph: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub law_text_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolDistrict {
    pub id: i64,
    pub name: String,
}

/// Catalogue entry describing a kind of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub activity_id: String,
    #[serde(default)]
    pub main_activity_for: Vec<i64>,
    #[serde(default)]
    pub supplementary_activity_for: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalPaymentRecipient {
    pub id: i64,
    pub name: String,
}
