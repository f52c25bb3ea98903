//! Fetch and mutation actions per entity.
//!
//! Each fetch overwrites the matching store slot with whatever the server
//! returned. Payment and activity mutations are checked against the
//! permission rules first so obviously forbidden requests never leave the
//! client; the server still has the final word.

use bevplatform_core::permissions::{
    can_adjust_activity, can_create_payment, can_delete_activity, can_delete_payment,
    can_edit_activity, can_edit_payment, is_payable, warn_edit_payment,
};
use bevplatform_core::sanitize::{ActivityPayload, sanitize_activity};
use bevplatform_core::{
    Activity, ActivityDetails, ActivityStatus, Appropriation, Case, GrantRequest, InternalPaymentRecipient,
    Municipality, NewAppropriation, NewCase, NewPayment, Payment, PaymentPlan, PaymentType,
    PaymentUpdate, RequestMode, SanitizeContext, SanitizeError, SchoolDistrict, Section, Team,
    User,
};
use bevplatform_store::{Level, Notification};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::error::ApiError;
use crate::http::{ApiClient, Query};

/// Everything shown on an appropriation page.
#[derive(Debug, Clone)]
pub struct AppropriationPage {
    pub appropriation: Appropriation,
    pub case: Case,
    pub activities: Vec<Activity>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn payment_type(activity: &Activity) -> Result<PaymentType, ApiError> {
    activity
        .payment_plan
        .as_ref()
        .map(|plan| plan.payment_type)
        .ok_or(ApiError::Sanitize(SanitizeError::MissingPaymentPlan))
}

impl ApiClient {
    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), ApiError> {
        if allowed {
            Ok(())
        } else {
            self.reported(Err(ApiError::NotPermitted(action)))
        }
    }

    /// The permission checks judge `activity`, so the payment must be one of its rows.
    fn ensure_same_plan(&self, activity: &Activity, payment_schedule: i64) -> Result<(), ApiError> {
        let plan_id = activity.payment_plan.as_ref().and_then(|plan| plan.id);
        if plan_id == Some(payment_schedule) {
            Ok(())
        } else {
            self.reported(Err(ApiError::Invalid(
                "payment does not belong to the activity's payment plan",
            )))
        }
    }

    // ── Cases ──

    pub async fn fetch_case(&self, id: i64) -> Result<Case, ApiError> {
        let case: Case = self.get(&format!("cases/{id}/"), &[]).await?;
        self.store.case().set(case.clone());
        Ok(case)
    }

    pub async fn fetch_cases(&self, query: Query<'_>) -> Result<Vec<Case>, ApiError> {
        let cases: Vec<Case> = self.get("cases/", query).await?;
        self.store.cases().set(cases.clone());
        Ok(cases)
    }

    pub async fn create_case(&self, case: &NewCase) -> Result<Case, ApiError> {
        self.ensure(self.store.current_profile().rights().edit, "oprette sager")?;
        let created: Case = self.post("cases/", case).await?;
        info!(id = created.id, sbsys_id = %created.sbsys_id, "case created");
        self.store.case().set(created.clone());
        Ok(created)
    }

    // ── Appropriations ──

    pub async fn fetch_appropriation(&self, id: i64) -> Result<Appropriation, ApiError> {
        let appropriation: Appropriation = self.get(&format!("appropriations/{id}/"), &[]).await?;
        self.store.appropriation().set(appropriation.clone());
        Ok(appropriation)
    }

    pub async fn fetch_appropriations(&self, case_id: i64) -> Result<Vec<Appropriation>, ApiError> {
        let list: Vec<Appropriation> = self
            .get("appropriations/", &[("case", case_id.to_string())])
            .await?;
        self.store.appropriations().set(list.clone());
        Ok(list)
    }

    pub async fn create_appropriation(
        &self,
        appropriation: &NewAppropriation,
    ) -> Result<Appropriation, ApiError> {
        self.ensure(
            self.store.current_profile().rights().edit,
            "oprette bevillinger",
        )?;
        let created: Appropriation = self.post("appropriations/", appropriation).await?;
        info!(id = created.id, case = created.case, "appropriation created");
        self.store.appropriation().set(created.clone());
        Ok(created)
    }

    /// Grant the listed activities, then reload the appropriation and its activities.
    pub async fn grant_appropriation(
        &self,
        id: i64,
        request: &GrantRequest,
    ) -> Result<Appropriation, ApiError> {
        self.ensure(
            self.store.current_profile().rights().grant,
            "godkende bevillinger",
        )?;
        let _: serde_json::Value = self
            .post(&format!("appropriations/{id}/grant/"), request)
            .await?;
        info!(id, activities = request.activities.len(), "appropriation granted");
        self.store
            .notify(Notification::new("Bevillingen er godkendt.", Level::Success));
        let (appropriation, _) = futures::try_join!(
            self.fetch_appropriation(id),
            self.fetch_activities(id)
        )?;
        Ok(appropriation)
    }

    /// Load an appropriation page.
    ///
    /// The appropriation must be known before its case and the activity
    /// catalogue for its section can be requested; those then load concurrently.
    pub async fn load_appropriation_page(&self, id: i64) -> Result<AppropriationPage, ApiError> {
        let appropriation = self.fetch_appropriation(id).await?;
        let (case, activities, _) = futures::try_join!(
            self.fetch_case(appropriation.case),
            self.fetch_activities(id),
            self.fetch_activity_details(appropriation.section),
        )?;
        Ok(AppropriationPage {
            appropriation,
            case,
            activities,
        })
    }

    // ── Activities ──

    pub async fn fetch_activity(&self, id: i64) -> Result<Activity, ApiError> {
        let activity: Activity = self.get(&format!("activities/{id}/"), &[]).await?;
        self.store.activity().set(activity.clone());
        Ok(activity)
    }

    pub async fn fetch_activities(&self, appropriation_id: i64) -> Result<Vec<Activity>, ApiError> {
        let list: Vec<Activity> = self
            .get(
                "activities/",
                &[("appropriation", appropriation_id.to_string())],
            )
            .await?;
        self.store.activities().set(list.clone());
        Ok(list)
    }

    fn activity_payload(
        &self,
        activity: &Activity,
        mode: RequestMode,
    ) -> Result<ActivityPayload, ApiError> {
        let recipients = self.store.recipient_directory();
        let ctx = SanitizeContext {
            today: today(),
            recipients: &recipients,
        };
        self.reported(sanitize_activity(activity, mode, &ctx).map_err(ApiError::from))
    }

    pub async fn create_activity(&self, activity: &Activity) -> Result<Activity, ApiError> {
        self.ensure(
            self.store.current_profile().rights().edit,
            "oprette aktiviteter",
        )?;
        let payload = self.activity_payload(activity, RequestMode::Create)?;
        let created: Activity = self.post("activities/", &payload).await?;
        info!(id = ?created.id, appropriation = created.appropriation, "activity created");
        self.store.activity().set(created.clone());
        Ok(created)
    }

    pub async fn update_activity(&self, activity: &Activity) -> Result<Activity, ApiError> {
        let id = self.reported(activity.id.ok_or(ApiError::Invalid("activity has no id")))?;
        self.ensure(
            can_edit_activity(self.store.current_profile(), activity.status),
            "redigere aktiviteten",
        )?;
        let payload = self.activity_payload(activity, RequestMode::Update)?;
        let updated: Activity = self.patch(&format!("activities/{id}/"), &payload).await?;
        self.store.activity().set(updated.clone());
        Ok(updated)
    }

    /// Propose a change to a granted activity.
    ///
    /// The granted activity is left untouched. `edited` is created as a new
    /// EXPECTED activity that modifies it and goes through approval again.
    pub async fn adjust_activity(
        &self,
        original: &Activity,
        edited: &Activity,
    ) -> Result<Activity, ApiError> {
        let original_id =
            self.reported(original.id.ok_or(ApiError::Invalid("activity has no id")))?;
        self.ensure(
            can_adjust_activity(self.store.current_profile(), original.status),
            "justere aktiviteten",
        )?;
        let mut adjustment = edited.clone();
        adjustment.id = None;
        adjustment.status = ActivityStatus::Expected;
        adjustment.modifies = Some(original_id);
        if let Some(plan) = adjustment.payment_plan.as_mut() {
            plan.id = None;
            plan.payments.clear();
        }
        let payload = self.activity_payload(&adjustment, RequestMode::Create)?;
        let created: Activity = self.post("activities/", &payload).await?;
        info!(id = ?created.id, modifies = original_id, "activity adjustment created");
        self.store.activity().set(created.clone());
        Ok(created)
    }

    pub async fn delete_activity(&self, activity: &Activity) -> Result<(), ApiError> {
        let id = self.reported(activity.id.ok_or(ApiError::Invalid("activity has no id")))?;
        self.ensure(
            can_delete_activity(self.store.current_profile(), activity.status),
            "slette aktiviteten",
        )?;
        self.delete(&format!("activities/{id}/")).await?;
        info!(id, "activity deleted");
        self.store.activity().clear();
        Ok(())
    }

    // ── Payment plans and payments ──

    pub async fn fetch_payment_plan(&self, id: i64) -> Result<PaymentPlan, ApiError> {
        let plan: PaymentPlan = self.get(&format!("payment_schedules/{id}/"), &[]).await?;
        self.store.payments().set(plan.payments.clone());
        self.store.payment_plan().set(plan.clone());
        Ok(plan)
    }

    pub async fn fetch_payments(&self, payment_plan_id: i64) -> Result<Vec<Payment>, ApiError> {
        let list: Vec<Payment> = self
            .get(
                "payments/",
                &[("payment_schedule", payment_plan_id.to_string())],
            )
            .await?;
        self.store.payments().set(list.clone());
        Ok(list)
    }

    pub async fn fetch_payment(&self, id: i64) -> Result<Payment, ApiError> {
        let payment: Payment = self.get(&format!("payments/{id}/"), &[]).await?;
        self.store.payment().set(payment.clone());
        Ok(payment)
    }

    /// Add a manual payment row to an individual payment plan.
    pub async fn create_payment(
        &self,
        activity: &Activity,
        payment: &NewPayment,
    ) -> Result<Payment, ApiError> {
        let payment_type = self.reported(payment_type(activity))?;
        self.ensure_same_plan(activity, payment.payment_schedule)?;
        self.ensure(
            can_create_payment(self.store.current_profile(), activity.status, payment_type),
            "oprette betalinger",
        )?;
        let created: Payment = self.post("payments/", payment).await?;
        self.store.payment().set(created.clone());
        Ok(created)
    }

    /// Edit a payment, or register it as paid when `update.paid` is set.
    ///
    /// Editing a payroll or cash payment close to its planned date goes
    /// through with a warning notification: the external batch may still
    /// overwrite the change.
    pub async fn update_payment(
        &self,
        activity: &Activity,
        payment: &Payment,
        update: &PaymentUpdate,
    ) -> Result<Payment, ApiError> {
        self.ensure_same_plan(activity, payment.payment_schedule)?;
        let profile = self.store.current_profile();
        if update.paid == Some(true) {
            self.ensure(
                is_payable(profile, activity.status, payment),
                "registrere betalingen",
            )?;
        } else {
            let payment_type = self.reported(payment_type(activity))?;
            self.ensure(
                can_edit_payment(profile, activity.status, payment_type),
                "redigere betalingen",
            )?;
        }
        if let Some(warning) = warn_edit_payment(payment, today()) {
            self.store.notify(Notification::new(warning, Level::Warning));
        }
        let updated: Payment = self
            .patch(&format!("payments/{}/", payment.id), update)
            .await?;
        self.store.payment().set(updated.clone());
        Ok(updated)
    }

    pub async fn delete_payment(&self, activity: &Activity, payment: &Payment) -> Result<(), ApiError> {
        let payment_type = self.reported(payment_type(activity))?;
        self.ensure_same_plan(activity, payment.payment_schedule)?;
        self.ensure(
            can_delete_payment(self.store.current_profile(), activity.status, payment_type),
            "slette betalingen",
        )?;
        self.delete(&format!("payments/{}/", payment.id)).await?;
        self.store.payment().clear();
        Ok(())
    }

    // ── Users and reference lists ──

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let users: Vec<User> = self.get("users/", &[]).await?;
        self.store.users().set(users.clone());
        Ok(users)
    }

    pub async fn fetch_teams(&self) -> Result<Vec<Team>, ApiError> {
        let teams: Vec<Team> = self.get("teams/", &[]).await?;
        self.store.teams().set(teams.clone());
        Ok(teams)
    }

    pub async fn fetch_sections(&self) -> Result<Vec<Section>, ApiError> {
        let sections: Vec<Section> = self.get("sections/", &[]).await?;
        self.store.sections().set(sections.clone());
        Ok(sections)
    }

    pub async fn fetch_municipalities(&self) -> Result<Vec<Municipality>, ApiError> {
        let list: Vec<Municipality> = self.get("municipalities/", &[]).await?;
        self.store.municipalities().set(list.clone());
        Ok(list)
    }

    pub async fn fetch_school_districts(&self) -> Result<Vec<SchoolDistrict>, ApiError> {
        let list: Vec<SchoolDistrict> = self.get("school_districts/", &[]).await?;
        self.store.school_districts().set(list.clone());
        Ok(list)
    }

    pub async fn fetch_internal_recipients(
        &self,
    ) -> Result<Vec<InternalPaymentRecipient>, ApiError> {
        let list: Vec<InternalPaymentRecipient> =
            self.get("internal_payment_recipients/", &[]).await?;
        self.store.internal_recipients().set(list.clone());
        Ok(list)
    }

    /// Activity catalogue, narrowed to main activities of `section` when given.
    pub async fn fetch_activity_details(
        &self,
        section: Option<i64>,
    ) -> Result<Vec<ActivityDetails>, ApiError> {
        let query: Vec<(&str, String)> = section
            .map(|s| vec![("main_activity_for", s.to_string())])
            .unwrap_or_default();
        let list: Vec<ActivityDetails> = self.get("activity_details/", &query).await?;
        self.store.activity_details().set(list.clone());
        Ok(list)
    }

    /// Fetch every reference list concurrently.
    pub async fn load_lists(&self) -> Result<(), ApiError> {
        futures::try_join!(
            self.fetch_users(),
            self.fetch_teams(),
            self.fetch_sections(),
            self.fetch_municipalities(),
            self.fetch_school_districts(),
            self.fetch_internal_recipients(),
        )?;
        info!("reference lists loaded");
        Ok(())
    }
}
