//! Transport adapter: bearer injection, 401 handling, envelope unwrapping and
//! fallback-on-failure.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use wms_auth::{LOGIN_PATH, Location, Navigator, SessionStore};

use crate::backend::{ApiRequest, Backend, RawResponse};
use crate::error::{ClientError, ClientResult};

/// Wraps a [`Backend`] with the session-aware request policy.
#[derive(Clone)]
pub struct Transport {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl core::fmt::Debug for Transport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transport")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            backend,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send one request.
    ///
    /// The bearer credential is read from the session at send time, so a
    /// cleared session never leaks a stale token.
    pub async fn send(&self, mut request: ApiRequest) -> ClientResult<RawResponse> {
        request.bearer = self.session.token();
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            authenticated = request.bearer.is_some(),
            "sending request"
        );

        let response = self.backend.send(request).await?;

        if response.status == 401 {
            self.handle_unauthorized();
            return Err(ClientError::Unauthorized);
        }
        if !response.is_success() {
            return Err(ClientError::Api {
                status: response.status,
                message: response.error_message(),
            });
        }
        Ok(response)
    }

    /// Send and return the unwrapped payload.
    pub async fn fetch(&self, request: ApiRequest) -> ClientResult<Value> {
        let response = self.send(request).await?;
        Ok(unwrap_envelope(response.to_value()?))
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("credential rejected by backend; clearing session");
        self.session.clear_session();

        let current = self.navigator.current_location();
        if current.path != LOGIN_PATH {
            self.navigator.replace(Location::login(current.full_path()));
        }
    }
}

/// Payload of a response body: a non-null `data` field, else the body itself.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(null) => {
                map.insert("data".to_string(), null);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Lazily produced substitute for a failed call.
pub type Fallback<'a, T> = Box<dyn FnOnce() -> T + Send + 'a>;

pub fn fallback<'a, T>(produce: impl FnOnce() -> T + Send + 'a) -> Option<Fallback<'a, T>> {
    Some(Box::new(produce))
}

/// Run `operation`; on failure, substitute the fallback if one is given.
///
/// Without a fallback the error propagates unchanged.
pub async fn call<T, F>(label: &str, operation: F, fallback: Option<Fallback<'_, T>>) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(err) => match fallback {
            Some(produce) => {
                tracing::warn!(operation = label, error = %err, "request failed; using fallback data");
                Ok(produce())
            }
            None => Err(err),
        },
    }
}

/// One leg of a join-all fetch: failure degrades to an empty collection.
pub async fn degrade<T, F>(label: &str, fetch: F) -> Vec<T>
where
    F: Future<Output = ClientResult<Vec<T>>>,
{
    match fetch.await {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(source = label, error = %err, "fetch failed; continuing with no records");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use wms_auth::{Credentials, MemorySessionStorage, RouteTable, Router};

    /// Replies with a fixed response and records every request.
    struct Scripted {
        response: RawResponse,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn new(response: RawResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn bearers(&self) -> Vec<Option<String>> {
            self.seen.lock().unwrap().iter().map(|r| r.bearer.clone()).collect()
        }
    }

    #[async_trait]
    impl Backend for Scripted {
        async fn send(&self, request: ApiRequest) -> ClientResult<RawResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn wire(backend: Arc<Scripted>) -> (Transport, Arc<SessionStore>, Arc<Router>) {
        let session = Arc::new(SessionStore::restore(MemorySessionStorage::new()));
        let router = Arc::new(Router::new(RouteTable::default(), session.clone()));
        let transport = Transport::new(backend, session.clone(), router.clone());
        (transport, session, router)
    }

    #[test]
    fn envelope_prefers_nested_data() {
        assert_eq!(unwrap_envelope(json!({"success": true, "data": [1, 2]})), json!([1, 2]));
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
        assert_eq!(
            unwrap_envelope(json!({"success": true, "data": null})),
            json!({"success": true, "data": null})
        );
        assert_eq!(unwrap_envelope(Value::Null), Value::Null);
    }

    #[tokio::test]
    async fn bearer_follows_current_session() {
        let backend = Scripted::new(RawResponse::json(200, &json!({"data": []})));
        let (transport, session, _) = wire(backend.clone());

        session.set_session(Credentials::new("tok-1", "u", ["ROLE_MANAGER"]));
        transport.fetch(ApiRequest::get("/products")).await.unwrap();
        session.clear_session();
        transport.fetch(ApiRequest::get("/products")).await.unwrap();

        assert_eq!(backend.bearers(), vec![Some("tok-1".to_string()), None]);
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_redirects_with_return_path() {
        let backend = Scripted::new(RawResponse::json(401, &json!({"message": "expired"})));
        let (transport, session, router) = wire(backend);

        session.set_session(Credentials::new("tok", "m", ["ROLE_MANAGER"]));
        router.navigate("/manager/analytics");

        let err = transport.fetch(ApiRequest::get("/reports/approval-stats")).await.unwrap_err();
        assert_eq!(err, ClientError::Unauthorized);
        assert!(!session.is_authenticated());
        assert_eq!(router.current_location(), Location::login("/manager/analytics"));
    }

    #[tokio::test]
    async fn unauthorized_on_login_page_does_not_redirect_again() {
        let backend = Scripted::new(RawResponse::json(401, &Value::Null));
        let (transport, _, router) = wire(backend);

        router.navigate(LOGIN_PATH);
        let _ = transport.send(ApiRequest::post("/auth/login")).await;
        assert_eq!(router.current_location(), Location::new(LOGIN_PATH));
    }

    #[tokio::test]
    async fn non_success_status_carries_backend_message() {
        let backend = Scripted::new(RawResponse::json(409, &json!({"success": false, "message": "code taken"})));
        let (transport, _, _) = wire(backend);

        let err = transport.fetch(ApiRequest::post("/warehouse/locations")).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Api {
                status: 409,
                message: "code taken".into()
            }
        );
    }

    #[tokio::test]
    async fn call_uses_fallback_only_on_failure() {
        let ok = call("ok", async { Ok::<_, ClientError>(1) }, fallback(|| 2)).await;
        assert_eq!(ok, Ok(1));

        let degraded = call("down", async { Err::<i32, _>(ClientError::Network("refused".into())) }, fallback(|| 2)).await;
        assert_eq!(degraded, Ok(2));

        let propagated = call("down", async { Err::<i32, _>(ClientError::Network("refused".into())) }, None).await;
        assert_eq!(propagated, Err(ClientError::Network("refused".into())));
    }

    #[tokio::test]
    async fn degrade_maps_failure_to_empty() {
        let items = degrade("inbound", async { Err::<Vec<u8>, _>(ClientError::Network("timeout".into())) }).await;
        assert!(items.is_empty());
    }
}
