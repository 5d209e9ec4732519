#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use authgate::app::build_router;
use authgate::middleware::auth::EnforcePolicy;
use authgate::services::auth::Verifier;
use authgate::state::AppState;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

pub fn router(verifier: Arc<dyn Verifier>, enforce: bool) -> Router {
    let state = AppState::new(verifier, EnforcePolicy::new(enforce));
    build_router(&state, Duration::from_secs(5))
}

pub struct Call<'a> {
    pub path: &'a str,
    pub header: Option<(&'a str, &'a str)>,
    pub remote: Option<&'a str>,
}

impl<'a> Call<'a> {
    pub fn get(path: &'a str) -> Self {
        Self {
            path,
            header: None,
            remote: None,
        }
    }

    pub fn header(mut self, name: &'a str, value: &'a str) -> Self {
        self.header = Some((name, value));
        self
    }

    pub fn from(mut self, remote: &'a str) -> Self {
        self.remote = Some(remote);
        self
    }

    pub async fn send(self, app: &Router) -> Response<Body> {
        let mut req = Request::builder().uri(self.path);
        if let Some((name, value)) = self.header {
            req = req.header(name, value);
        }
        if let Some(remote) = self.remote {
            let addr: SocketAddr = remote.parse().unwrap();
            req = req.extension(ConnectInfo(addr));
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(res: Response<Body>) -> Value {
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
