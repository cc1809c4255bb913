//! Stand-in API server for exercising the real client set over HTTP

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{ClientSet, Connect, CredentialBundle, KubeconfigConnector};

/// A mock API server plus a kubeconfig file pointing at it
pub struct MockApiServer {
    server: MockServer,
    kubeconfig: NamedTempFile,
}

impl MockApiServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let mut kubeconfig = NamedTempFile::new().unwrap();
        write!(
            kubeconfig,
            r#"
apiVersion: v1
kind: Config
clusters:
- name: mock
  cluster:
    server: {}
contexts:
- name: mock
  context:
    cluster: mock
    user: admin
current-context: mock
users:
- name: admin
  user:
    token: secret-token
"#,
            server.uri()
        )
        .unwrap();

        Self { server, kubeconfig }
    }

    /// Answer GET requests on `route` with `body`
    pub async fn serve(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer GET requests on `route` with an API `Status` failure
    pub async fn reject(&self, route: &str, code: u16, reason: &str) {
        let status = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("{} {}", route, reason),
            "reason": reason,
            "code": code,
        });
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(code).set_body_json(status))
            .mount(&self.server)
            .await;
    }

    /// Connect through the kubeconfig; the namespace listing must be served
    pub async fn connect(&self) -> ClientSet {
        let bundle = CredentialBundle::open(self.kubeconfig.path()).unwrap();
        KubeconfigConnector::new(Arc::new(bundle), Duration::from_secs(5))
            .connect()
            .await
            .unwrap()
    }

    /// Paths of every request received so far
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

/// A list response holding `items`
pub fn list(items: Vec<Value>) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "List",
        "metadata": { "resourceVersion": "1" },
        "items": items,
    })
}

/// Minimal object manifest
pub fn object(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Value {
    let mut metadata = json!({ "name": name, "uid": format!("uid-{}", name) });
    if let Some(namespace) = namespace {
        metadata["namespace"] = json!(namespace);
    }
    json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": metadata,
    })
}
