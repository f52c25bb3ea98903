//! Closed enumerations shared with the API server.
//!
//! Every enum serialises to the exact wire string the server uses and carries
//! the Danish label the case workers see.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user's authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Admin,
    WorkflowEngine,
    Grant,
    Edit,
    Readonly,
}

/// What a profile is allowed to do, independent of any entity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rights {
    /// Create and edit cases, appropriations, activities and payments.
    pub edit: bool,
    /// Approve (grant) appropriations and their activities.
    pub grant: bool,
    /// Bypass payment-type locks and pay any payment of a granted activity.
    pub privileged: bool,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::Admin,
        Profile::WorkflowEngine,
        Profile::Grant,
        Profile::Edit,
        Profile::Readonly,
    ];

    /// Capability matrix. Adding a profile fails to compile until its row exists.
    pub const fn rights(self) -> Rights {
        match self {
            Profile::Admin => Rights {
                edit: true,
                grant: true,
                privileged: true,
            },
            Profile::WorkflowEngine => Rights {
                edit: true,
                grant: true,
                privileged: true,
            },
            Profile::Grant => Rights {
                edit: true,
                grant: true,
                privileged: false,
            },
            Profile::Edit => Rights {
                edit: true,
                grant: false,
                privileged: false,
            },
            Profile::Readonly => Rights {
                edit: false,
                grant: false,
                privileged: false,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Profile::Admin => "Administrator",
            Profile::WorkflowEngine => "Arbejdsgangsansvarlig",
            Profile::Grant => "Bevilling",
            Profile::Edit => "Redigering",
            Profile::Readonly => "Læseadgang",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    #[default]
    Draft,
    Budgeted,
    Expected,
    Granted,
    Discontinued,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 5] = [
        ActivityStatus::Draft,
        ActivityStatus::Budgeted,
        ActivityStatus::Expected,
        ActivityStatus::Granted,
        ActivityStatus::Discontinued,
    ];

    /// Statuses an approver still has to act on.
    pub fn awaits_approval(self) -> bool {
        matches!(self, ActivityStatus::Draft | ActivityStatus::Expected)
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Draft => "Kladde",
            ActivityStatus::Budgeted => "Budgetteret",
            ActivityStatus::Expected => "Forventet",
            ActivityStatus::Granted => "Bevilget",
            ActivityStatus::Discontinued => "Udgået",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppropriationStatus {
    #[default]
    Draft,
    Granted,
    Discontinued,
}

impl AppropriationStatus {
    pub fn label(self) -> &'static str {
        match self {
            AppropriationStatus::Draft => "Kladde",
            AppropriationStatus::Granted => "Bevilget",
            AppropriationStatus::Discontinued => "Udgået",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivityType {
    #[default]
    #[serde(rename = "MAIN_ACTIVITY", alias = "MAIN")]
    Main,
    #[serde(rename = "SUPPL_ACTIVITY", alias = "SUPPL")]
    Suppl,
}

impl ActivityType {
    pub fn label(self) -> &'static str {
        match self {
            ActivityType::Main => "Hovedydelse",
            ActivityType::Suppl => "Følgeudgift",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    OneTimePayment,
    RunningPayment,
    IndividualPayment,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [
        PaymentType::OneTimePayment,
        PaymentType::RunningPayment,
        PaymentType::IndividualPayment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentType::OneTimePayment => "Engangsudgift",
            PaymentType::RunningPayment => "Fast beløb, løbende",
            PaymentType::IndividualPayment => "Individuel betalingsplan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentCostType {
    #[default]
    Fixed,
    PerUnit,
    GlobalRate,
}

impl PaymentCostType {
    pub fn label(self) -> &'static str {
        match self {
            PaymentCostType::Fixed => "Fast beløb",
            PaymentCostType::PerUnit => "Pris pr. enhed",
            PaymentCostType::GlobalRate => "Takst",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl PaymentFrequency {
    pub fn label(self) -> &'static str {
        match self {
            PaymentFrequency::Daily => "Dagligt",
            PaymentFrequency::Weekly => "Ugentligt",
            PaymentFrequency::Biweekly => "Hver 2. uge",
            PaymentFrequency::Monthly => "Månedligt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Invoice,
    Internal,
    Cash,
    #[serde(rename = "SD")]
    Sd,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Invoice,
        PaymentMethod::Internal,
        PaymentMethod::Cash,
        PaymentMethod::Sd,
    ];

    /// Paid out by an external batch (payroll or cash run) rather than by hand.
    pub fn is_batch_processed(self) -> bool {
        matches!(self, PaymentMethod::Sd | PaymentMethod::Cash)
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Invoice => "Faktura",
            PaymentMethod::Internal => "Intern afregning",
            PaymentMethod::Cash => "Kontant udbetaling",
            PaymentMethod::Sd => "SD-løn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    Internal,
    Company,
    Person,
}

impl RecipientType {
    pub fn label(self) -> &'static str {
        match self {
            RecipientType::Internal => "Intern",
            RecipientType::Company => "Firma",
            RecipientType::Person => "Person",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )+
    };
}

display_via_label!(
    Profile,
    ActivityStatus,
    AppropriationStatus,
    ActivityType,
    PaymentType,
    PaymentCostType,
    PaymentFrequency,
    PaymentMethod,
    RecipientType,
);
