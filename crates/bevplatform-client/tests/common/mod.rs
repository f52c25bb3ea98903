//! In-process fake of the case-management API for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use bevplatform_client::{ApiClient, ClientConfig};
use bevplatform_core::{
    Activity, ActivityStatus, ActivityType, PaymentCostType, PaymentFrequency, PaymentMethod,
    PaymentPlan, PaymentType, RecipientType,
};
use bevplatform_store::{MemorySession, SessionStore, Store};
use chrono::NaiveDate;
use serde_json::{Value, json};

pub const PASSWORD: &str = "hemmelig";

type Reply = (StatusCode, Json<Value>);
pub type Shared = Arc<Mutex<FakeState>>;

#[derive(Debug, Default)]
pub struct FakeState {
    pub access: String,
    pub refresh: String,
    pub refresh_count: u32,
    next_id: i64,
    pub cases: HashMap<i64, Value>,
    pub appropriations: HashMap<i64, Value>,
    pub activities: HashMap<i64, Value>,
    pub payments: HashMap<i64, Value>,
    /// Bodies of every create request, by collection.
    pub received: Vec<(&'static str, Value)>,
}

impl FakeState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn users() -> Value {
    json!([
        {"id": 1, "username": "admin", "first_name": "Anne", "last_name": "Admin", "profile": "admin"},
        {"id": 2, "username": "sagsbehandler", "first_name": "Søren", "last_name": "Sag", "team": 1, "profile": "edit"},
        {"id": 3, "username": "laeser", "profile": "readonly"},
        {"id": 4, "username": "leder", "first_name": "Lise", "last_name": "Leder", "team": 1, "profile": "grant"}
    ])
}

fn reference_lists() -> HashMap<&'static str, Value> {
    HashMap::from([
        ("teams", json!([{"id": 1, "name": "Familierådgivningen", "leader": 4}])),
        (
            "sections",
            json!([{"id": 1, "paragraph": "SEL-52-3.7", "text": "Aflastningsophold", "law_text_name": "Serviceloven"}]),
        ),
        ("municipalities", json!([{"id": 1, "name": "København"}])),
        ("school_districts", json!([{"id": 1, "name": "Nordvest"}])),
        (
            "internal_payment_recipients",
            json!([{"id": 17, "name": "Familieafdelingen"}]),
        ),
        (
            "activity_details",
            json!([{"id": 1, "name": "Aflastning", "activity_id": "010001", "main_activity_for": [1]}]),
        ),
    ])
}

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn not_found() -> Reply {
    reply(StatusCode::NOT_FOUND, json!({"detail": "Ikke fundet."}))
}

fn check(state: &FakeState, headers: &HeaderMap) -> Result<(), Reply> {
    let expected = format!("Bearer {}", state.access);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(reply(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Token er ugyldigt eller udløbet."}),
        )),
    }
}

async fn token(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let known = users()
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["username"] == username);
    if !known || password != PASSWORD {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "No active account found with the given credentials"}),
        );
    }
    let mut s = state.lock().unwrap();
    s.refresh_count = 0;
    s.access = "access-0".into();
    s.refresh = "refresh-0".into();
    reply(
        StatusCode::OK,
        json!({"access": s.access, "refresh": s.refresh}),
    )
}

async fn token_refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut s = state.lock().unwrap();
    if body["refresh"].as_str() != Some(s.refresh.as_str()) {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
        );
    }
    s.refresh_count += 1;
    s.access = format!("access-{}", s.refresh_count);
    reply(StatusCode::OK, json!({"access": s.access}))
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    reply(StatusCode::OK, users())
}

async fn reference(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    match reference_lists().remove(name.as_str()) {
        Some(list) => reply(StatusCode::OK, list),
        None => not_found(),
    }
}

async fn create_case(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("cases", body.clone()));
    let cpr = body["cpr_number"].as_str().unwrap_or_default();
    if cpr.len() != 10 || !cpr.chars().all(|c| c.is_ascii_digit()) {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"cpr_number": ["Ugyldigt CPR-nummer"]}),
        );
    }
    let id = s.next_id();
    body["id"] = json!(id);
    s.cases.insert(id, body.clone());
    reply(StatusCode::CREATED, body)
}

async fn get_case(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.cases
        .get(&id)
        .map(|c| reply(StatusCode::OK, c.clone()))
        .unwrap_or_else(not_found)
}

async fn create_appropriation(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("appropriations", body.clone()));
    let id = s.next_id();
    body["id"] = json!(id);
    body["status"] = json!("DRAFT");
    body["activities"] = json!([]);
    s.appropriations.insert(id, body.clone());
    reply(StatusCode::CREATED, body)
}

async fn list_appropriations(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    let case = params.get("case").and_then(|c| c.parse::<i64>().ok());
    let list: Vec<Value> = s
        .appropriations
        .values()
        .filter(|a| case.is_none() || a["case"].as_i64() == case)
        .cloned()
        .collect();
    reply(StatusCode::OK, Value::Array(list))
}

async fn get_appropriation(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.appropriations
        .get(&id)
        .map(|a| reply(StatusCode::OK, a.clone()))
        .unwrap_or_else(not_found)
}

async fn grant(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    if !s.appropriations.contains_key(&id) {
        return not_found();
    }
    let ids: Vec<i64> = body["activities"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    if ids.is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"activities": ["Vælg mindst én aktivitet"]}),
        );
    }
    for activity_id in &ids {
        if let Some(activity) = s.activities.get_mut(activity_id) {
            activity["status"] = json!("GRANTED");
        }
    }
    let appropriation = s.appropriations.get_mut(&id).unwrap();
    appropriation["status"] = json!("GRANTED");
    appropriation["granted_from_date"] = json!("2026-11-01");
    let granted = appropriation.clone();
    reply(StatusCode::OK, granted)
}

async fn create_activity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("activities", body.clone()));
    let appropriation_id = body["appropriation"].as_i64().unwrap_or_default();
    if !s.appropriations.contains_key(&appropriation_id) {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"appropriation": ["Ugyldig bevilling"]}),
        );
    }
    let id = s.next_id();
    let plan_id = s.next_id();
    body["id"] = json!(id);
    body["payment_plan"]["id"] = json!(plan_id);
    body["payment_plan"]["payments"] = json!([]);
    s.activities.insert(id, body.clone());
    if let Some(list) = s
        .appropriations
        .get_mut(&appropriation_id)
        .and_then(|a| a["activities"].as_array_mut())
    {
        list.push(json!(id));
    }
    reply(StatusCode::CREATED, body)
}

async fn list_activities(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    let appropriation = params.get("appropriation").and_then(|c| c.parse::<i64>().ok());
    let mut list: Vec<Value> = s
        .activities
        .values()
        .filter(|a| appropriation.is_none() || a["appropriation"].as_i64() == appropriation)
        .cloned()
        .collect();
    list.sort_by_key(|a| a["id"].as_i64());
    reply(StatusCode::OK, Value::Array(list))
}

async fn create_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("payments", body.clone()));
    let schedule = body["payment_schedule"].as_i64();
    let plan = s
        .activities
        .values()
        .map(|a| &a["payment_plan"])
        .find(|p| p["id"].as_i64() == schedule)
        .cloned()
        .unwrap_or(Value::Null);
    let method = plan["payment_method"].as_str().unwrap_or("INVOICE").to_string();
    let id = s.next_id();
    body["id"] = json!(id);
    body["paid"] = json!(false);
    body["is_payable_manually"] = json!(method != "SD" && method != "CASH");
    body["payment_method"] = json!(method);
    body["recipient_type"] = match plan["recipient_type"].as_str() {
        Some(kind) => json!(kind),
        None => json!("COMPANY"),
    };
    s.payments.insert(id, body.clone());
    reply(StatusCode::CREATED, body)
}

/// Copy every non-null field of `patch` onto `target`.
fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            if !value.is_null() {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

async fn update_payment(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("payment_updates", body.clone()));
    match s.payments.get_mut(&id) {
        Some(payment) => {
            merge(payment, &body);
            reply(StatusCode::OK, payment.clone())
        }
        None => not_found(),
    }
}

async fn delete_payment(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, Reply> {
    let mut s = state.lock().unwrap();
    check(&s, &headers)?;
    s.received.push(("payment_deletes", json!(id)));
    s.payments.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or_else(not_found)
}

async fn get_activity(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.activities
        .get(&id)
        .map(|a| reply(StatusCode::OK, a.clone()))
        .unwrap_or_else(not_found)
}

async fn update_activity(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    s.received.push(("activity_updates", body.clone()));
    match s.activities.get_mut(&id) {
        Some(activity) => {
            let plan = activity["payment_plan"].clone();
            merge(activity, &body);
            // Plan id and payments are server-owned.
            activity["payment_plan"]["id"] = plan["id"].clone();
            activity["payment_plan"]["payments"] = plan["payments"].clone();
            reply(StatusCode::OK, activity.clone())
        }
        None => not_found(),
    }
}

async fn delete_activity(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, Reply> {
    let mut s = state.lock().unwrap();
    check(&s, &headers)?;
    s.received.push(("activity_deletes", json!(id)));
    s.activities
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

async fn get_payment_schedule(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Reply {
    let s = state.lock().unwrap();
    if let Err(r) = check(&s, &headers) {
        return r;
    }
    let Some(mut plan) = s
        .activities
        .values()
        .map(|a| a["payment_plan"].clone())
        .find(|p| p["id"].as_i64() == Some(id))
    else {
        return not_found();
    };
    let mut payments: Vec<Value> = s
        .payments
        .values()
        .filter(|p| p["payment_schedule"].as_i64() == Some(id))
        .cloned()
        .collect();
    payments.sort_by_key(|p| p["id"].as_i64());
    plan["payments"] = Value::Array(payments);
    reply(StatusCode::OK, plan)
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/token/", post(token))
        .route("/api/token/refresh/", post(token_refresh))
        .route("/api/users/", get(list_users))
        .route("/api/cases/", post(create_case))
        .route("/api/cases/{id}/", get(get_case))
        .route(
            "/api/appropriations/",
            post(create_appropriation).get(list_appropriations),
        )
        .route("/api/appropriations/{id}/", get(get_appropriation))
        .route("/api/appropriations/{id}/grant/", post(grant))
        .route(
            "/api/activities/",
            post(create_activity).get(list_activities),
        )
        .route(
            "/api/activities/{id}/",
            get(get_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
        .route("/api/payment_schedules/{id}/", get(get_payment_schedule))
        .route("/api/payments/", post(create_payment))
        .route(
            "/api/payments/{id}/",
            patch(update_payment).delete(delete_payment),
        )
        .route("/api/{name}/", get(reference))
        .with_state(state)
}

/// A running fake API bound to a random local port.
pub struct FakeApi {
    pub base_url: String,
    pub state: Shared,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));
        let app = router(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url)
    }

    pub fn client(&self) -> Arc<ApiClient> {
        self.client_with(self.config(), Arc::new(MemorySession::new()))
    }

    pub fn client_with(
        &self,
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
    ) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(config, Arc::new(Store::new()), session).expect("client"))
    }

    /// Create requests the server has seen for `collection`.
    pub fn received(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .received
            .iter()
            .filter(|(c, _)| *c == collection)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn plan(payment_type: PaymentType, cost_type: Option<PaymentCostType>) -> PaymentPlan {
    PaymentPlan {
        id: None,
        payment_type,
        payment_cost_type: cost_type,
        payment_amount: Some(2500.0),
        payment_units: None,
        payment_rate: None,
        price_per_unit: None,
        price_history: vec![],
        payment_frequency: match payment_type {
            PaymentType::OneTimePayment => None,
            _ => Some(PaymentFrequency::Monthly),
        },
        payment_day_of_month: Some(1),
        recipient_type: Some(RecipientType::Company),
        recipient_id: Some("29189854".into()),
        recipient_name: Some("Aflastning ApS".into()),
        payment_method: Some(PaymentMethod::Invoice),
        payment_method_details: None,
        payments: vec![],
    }
}

pub fn activity(
    appropriation: i64,
    activity_type: ActivityType,
    payment_plan: PaymentPlan,
) -> Activity {
    Activity {
        id: None,
        appropriation,
        activity_type,
        status: ActivityStatus::Draft,
        details: Some(1),
        start_date: Some(date("2026-11-01")),
        end_date: Some(date("2027-10-31")),
        note: String::new(),
        modifies: None,
        payment_plan: Some(payment_plan),
        monthly_payment_plan: vec![],
        total_cost: None,
    }
}
