//! The client state container.
//!
//! One [`Store`] is created per client session and handed to whoever needs it
//! (usually behind an `Arc`). Fetch actions write slots; views read them
//! through the typed selectors below.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevplatform_core::{
    Activity, ActivityDetails, Appropriation, Case, InternalPaymentRecipient, Municipality,
    Payment, PaymentPlan, Profile, RecipientDirectory, SchoolDistrict, Section, Team, User,
};
use tracing::debug;

use crate::notify::{FieldErrors, Level, Notification};
use crate::slot::Slot;

#[derive(Debug, Default)]
pub struct Store {
    case: Slot<Case>,
    cases: Slot<Vec<Case>>,
    appropriation: Slot<Appropriation>,
    appropriations: Slot<Vec<Appropriation>>,
    activity: Slot<Activity>,
    activities: Slot<Vec<Activity>>,
    payment_plan: Slot<PaymentPlan>,
    payment: Slot<Payment>,
    payments: Slot<Vec<Payment>>,
    user: Slot<User>,
    users: Slot<Vec<User>>,
    teams: Slot<Vec<Team>>,
    sections: Slot<Vec<Section>>,
    municipalities: Slot<Vec<Municipality>>,
    school_districts: Slot<Vec<SchoolDistrict>>,
    activity_details: Slot<Vec<ActivityDetails>>,
    internal_recipients: Slot<Vec<InternalPaymentRecipient>>,

    notifications: Mutex<Vec<Notification>>,
    field_errors: Mutex<FieldErrors>,
    in_flight: AtomicUsize,
}

macro_rules! slot_accessors {
    ($($name:ident: $ty:ty),+ $(,)?) => {
        $(
            pub fn $name(&self) -> &Slot<$ty> {
                &self.$name
            }
        )+
    };
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    slot_accessors!(
        case: Case,
        cases: Vec<Case>,
        appropriation: Appropriation,
        appropriations: Vec<Appropriation>,
        activity: Activity,
        activities: Vec<Activity>,
        payment_plan: PaymentPlan,
        payment: Payment,
        payments: Vec<Payment>,
        user: User,
        users: Vec<User>,
        teams: Vec<Team>,
        sections: Vec<Section>,
        municipalities: Vec<Municipality>,
        school_districts: Vec<SchoolDistrict>,
        activity_details: Vec<ActivityDetails>,
        internal_recipients: Vec<InternalPaymentRecipient>,
    );

    // ── Selectors ──

    /// Profile of the logged-in user; readonly until a user is loaded.
    pub fn current_profile(&self) -> Profile {
        self.user
            .with(|u| u.map(User::effective_profile))
            .unwrap_or(Profile::Readonly)
    }

    pub fn user_by_id(&self, id: i64) -> Option<User> {
        self.users
            .with(|users| users.and_then(|us| us.iter().find(|u| u.id == id).cloned()))
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.users.with(|users| {
            users.and_then(|us| us.iter().find(|u| u.username == username).cloned())
        })
    }

    pub fn team_by_id(&self, id: i64) -> Option<Team> {
        self.teams
            .with(|teams| teams.and_then(|ts| ts.iter().find(|t| t.id == id).cloned()))
    }

    pub fn section_by_id(&self, id: i64) -> Option<Section> {
        self.sections
            .with(|sections| sections.and_then(|ss| ss.iter().find(|s| s.id == id).cloned()))
    }

    pub fn municipality_by_id(&self, id: i64) -> Option<Municipality> {
        self.municipalities
            .with(|ms| ms.and_then(|ms| ms.iter().find(|m| m.id == id).cloned()))
    }

    pub fn activity_details_by_id(&self, id: i64) -> Option<ActivityDetails> {
        self.activity_details
            .with(|ds| ds.and_then(|ds| ds.iter().find(|d| d.id == id).cloned()))
    }

    /// Name → id table for INTERNAL payment recipients, empty until loaded.
    pub fn recipient_directory(&self) -> RecipientDirectory {
        self.internal_recipients
            .with(|rs| rs.map(|rs| RecipientDirectory::new(rs)).unwrap_or_default())
    }

    pub fn recipient_id_for(&self, name: &str) -> Option<i64> {
        self.recipient_directory().id_for(name)
    }

    /// Wait until the users list has been loaded.
    pub async fn wait_for_users(&self) -> Vec<User> {
        self.users.wait().await
    }

    /// Wait for the users list, then look up `id` in it.
    pub async fn wait_for_user(&self, id: i64) -> Option<User> {
        self.wait_for_users()
            .await
            .into_iter()
            .find(|u| u.id == id)
    }

    // ── Notifications ──

    pub fn notify(&self, notification: Notification) {
        debug!(level = ?notification.level, message = %notification.message, "notification");
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.notify(Notification::new(message, Level::Error));
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn set_field_errors(&self, field: &str, messages: Vec<String>) {
        self.field_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(field, messages);
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.field_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_field_errors(&self) {
        self.field_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    // ── Loading indicator ──

    /// Mark a request in flight until the returned guard is dropped.
    pub fn begin_request(&self) -> RequestGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard { store: self }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Forget everything, as on logout.
    pub fn reset(&self) {
        self.case.clear();
        self.cases.clear();
        self.appropriation.clear();
        self.appropriations.clear();
        self.activity.clear();
        self.activities.clear();
        self.payment_plan.clear();
        self.payment.clear();
        self.payments.clear();
        self.user.clear();
        self.users.clear();
        self.teams.clear();
        self.sections.clear();
        self.municipalities.clear();
        self.school_districts.clear();
        self.activity_details.clear();
        self.internal_recipients.clear();
        self.clear_field_errors();
        self.take_notifications();
    }
}

#[must_use = "the request counts as finished as soon as the guard is dropped"]
pub struct RequestGuard<'a> {
    store: &'a Store,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
