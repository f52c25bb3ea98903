//! API errors and how they are shown to the user.

use bevplatform_core::SanitizeError;
use bevplatform_store::{Store, StoreError};
use serde_json::Value;
use thiserror::Error;

/// Fallback shown when an error carries nothing worth displaying.
pub const GENERIC_ERROR: &str = "Der skete en fejl. Prøv igen.";

/// Keys whose messages are shown without a field prefix.
const NON_FIELD_KEYS: &[&str] = &["detail", "non_field_errors"];

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("user {0} not found")]
    UnknownUser(String),
    #[error("not permitted: {0}")]
    NotPermitted(&'static str),
    #[error("invalid request: {0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Turn an error into notifications and field errors on `store`.
///
/// Error bodies are walked recursively: strings are notified as they are,
/// arrays are stored under their field name and each entry notified, objects
/// are descended into. Anything that yields no message falls back to
/// [`GENERIC_ERROR`].
pub fn report(store: &Store, err: &ApiError) {
    let reported = match err {
        ApiError::Server { body, .. } => match serde_json::from_str::<Value>(body) {
            Ok(value) => walk(store, None, &value),
            Err(_) => 0,
        },
        ApiError::NotAuthenticated => {
            store.notify_error("Du er ikke logget ind.");
            1
        }
        ApiError::NotPermitted(action) => {
            store.notify_error(format!("Du har ikke rettighed til at {action}."));
            1
        }
        ApiError::Sanitize(_)
        | ApiError::Invalid(_)
        | ApiError::UnknownUser(_)
        | ApiError::Config(_) => {
            store.notify_error(err.to_string());
            1
        }
        ApiError::Http(_) | ApiError::Json(_) | ApiError::Store(_) => 0,
    };
    if reported == 0 {
        store.notify_error(GENERIC_ERROR);
    }
}

fn walk(store: &Store, key: Option<&str>, value: &Value) -> usize {
    match value {
        Value::String(message) => {
            store.notify_error(prefixed(key, message));
            1
        }
        Value::Array(items) => {
            let field = key.unwrap_or("non_field_errors");
            let messages: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            store.set_field_errors(field, messages);
            items
                .iter()
                .map(|item| match item {
                    Value::String(message) => {
                        store.notify_error(prefixed(Some(field), message));
                        1
                    }
                    nested => walk(store, Some(field), nested),
                })
                .sum()
        }
        Value::Object(map) => map.iter().map(|(k, v)| walk(store, Some(k), v)).sum(),
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

fn prefixed(key: Option<&str>, message: &str) -> String {
    match key {
        Some(k) if !NON_FIELD_KEYS.contains(&k) => format!("{k}: {message}"),
        _ => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(body: &str) -> ApiError {
        ApiError::Server {
            status: 400,
            body: body.into(),
        }
    }

    fn messages(store: &Store) -> Vec<String> {
        store
            .take_notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    #[test]
    fn detail_string_is_notified() {
        let store = Store::new();
        report(&store, &server(r#"{"detail": "Ikke fundet."}"#));
        assert_eq!(messages(&store), ["Ikke fundet."]);
    }

    #[test]
    fn field_arrays_are_stored_and_notified() {
        let store = Store::new();
        report(
            &store,
            &server(r#"{"cpr_number": ["Ugyldigt CPR-nummer"], "name": ["Påkrævet", "For kort"]}"#),
        );
        let errors = store.field_errors();
        assert_eq!(errors.get("cpr_number").unwrap(), ["Ugyldigt CPR-nummer"]);
        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert_eq!(
            messages(&store),
            [
                "cpr_number: Ugyldigt CPR-nummer",
                "name: Påkrævet",
                "name: For kort"
            ]
        );
    }

    #[test]
    fn nested_objects_recurse() {
        let store = Store::new();
        report(
            &store,
            &server(r#"{"payment_plan": {"payment_amount": ["Skal være positivt"]}}"#),
        );
        assert_eq!(
            store.field_errors().get("payment_amount").unwrap(),
            ["Skal være positivt"]
        );
        assert_eq!(messages(&store), ["payment_amount: Skal være positivt"]);
    }

    #[test]
    fn top_level_array_is_non_field() {
        let store = Store::new();
        report(&store, &server(r#"["Bevillingen er allerede bevilget"]"#));
        assert_eq!(messages(&store), ["Bevillingen er allerede bevilget"]);
        assert!(store.field_errors().get("non_field_errors").is_some());
    }

    #[test]
    fn unknown_shapes_fall_back_to_generic() {
        for body in ["<html>502 Bad Gateway</html>", "{}", "42", r#"{"count": 3}"#] {
            let store = Store::new();
            report(&store, &server(body));
            assert_eq!(messages(&store), [GENERIC_ERROR], "{body}");
        }
    }

    #[test]
    fn local_errors() {
        let store = Store::new();
        report(&store, &ApiError::NotPermitted("slette betalingen"));
        report(&store, &ApiError::Invalid("activity has no id"));
        report(&store, &ApiError::UnknownUser("ukendt".into()));
        report(&store, &ApiError::Config("BEV_API_URL is empty".into()));
        assert_eq!(
            messages(&store),
            [
                "Du har ikke rettighed til at slette betalingen.",
                "invalid request: activity has no id",
                "user ukendt not found",
                "invalid configuration: BEV_API_URL is empty",
            ]
        );
    }
}
