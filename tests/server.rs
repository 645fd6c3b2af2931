// ABOUTME: Integration tests for the /update HTTP endpoint.
// ABOUTME: Exercises parameter parsing, status mapping, and token auth via the router.

mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use async_trait::async_trait;
use deployd::deployer::{DeployError, Deployer};
use deployd::server::router;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use support::RecordingDeployer;
use tower::ServiceExt;

async fn send(
    deployer: &RecordingDeployer,
    token: Option<&str>,
    req: Request<Body>,
) -> (StatusCode, String) {
    support::init_tracing();
    let app = router(Arc::new(deployer.clone()) as Arc<dyn Deployer>, token);
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/update")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

mod parameters {
    use super::*;

    #[tokio::test]
    async fn query_parameters_trigger_update() {
        let deployer = RecordingDeployer::default();

        let (status, body) = send(&deployer, None, get("/update?service=web&image=myrepo/web:2.3")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());
        assert_eq!(
            deployer.calls(),
            vec![("web".to_string(), "myrepo/web:2.3".to_string())]
        );
    }

    #[tokio::test]
    async fn form_body_triggers_update() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, None, post_form("service=api&image=myrepo%2Fapi%3A9")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            deployer.calls(),
            vec![("api".to_string(), "myrepo/api:9".to_string())]
        );
    }

    #[tokio::test]
    async fn post_without_form_body_reads_query() {
        let deployer = RecordingDeployer::default();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/update?service=web&image=web:3")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&deployer, None, req).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(deployer.calls(), vec![("web".to_string(), "web:3".to_string())]);
    }

    #[tokio::test]
    async fn missing_image_is_bad_request() {
        let deployer = RecordingDeployer::default();

        let (status, body) = send(&deployer, None, get("/update?service=web")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Empty parameters");
        assert!(deployer.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_service_is_bad_request() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, None, get("/update?service=&image=web:2")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(deployer.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_form_field_is_invalid() {
        let deployer = RecordingDeployer::default();

        let (status, body) = send(
            &deployer,
            None,
            post_form("service=web&service=api&image=web:2"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid parameters");
        assert!(deployer.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_body_value_falls_back_to_query() {
        let deployer = RecordingDeployer::default();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/update?service=web")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("service=&image=web:4"))
            .unwrap();

        let (status, _) = send(&deployer, None, req).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(deployer.calls(), vec![("web".to_string(), "web:4".to_string())]);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, None, get("/deploy?service=web&image=web:2")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn deployer_error_is_internal_server_error_with_message() {
        let deployer = RecordingDeployer::failing(DeployError::ContainerNotFound("api".to_string()));

        let (status, body) = send(&deployer, None, get("/update?service=api&image=api:9")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            "Update failed: couldn't find container spec with name: api"
        );
    }

    #[tokio::test]
    async fn not_found_is_internal_server_error() {
        let deployer = RecordingDeployer::failing(DeployError::NotFound("service web".to_string()));

        let (status, body) = send(&deployer, None, get("/update?service=web&image=web:2")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Update failed: "));
    }
}

mod auth {
    use super::*;

    fn with_token(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/update?service=web&image=web:2")
            .header(header::AUTHORIZATION, token)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn matching_token_reaches_deployer() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, Some("s3cret"), with_token("s3cret")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(deployer.calls().len(), 1);
    }

    #[tokio::test]
    async fn wrong_token_is_swallowed() {
        let deployer = RecordingDeployer::default();

        let (status, body) = send(&deployer, Some("s3cret"), with_token("guess")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());
        assert!(deployer.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_swallowed() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, Some("s3cret"), get("/update?service=web&image=web:2")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(deployer.calls().is_empty());
    }

    #[tokio::test]
    async fn auth_runs_before_parameter_validation() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, Some("s3cret"), get("/update")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn no_token_configured_allows_any_request() {
        let deployer = RecordingDeployer::default();

        let (status, _) = send(&deployer, None, with_token("anything")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(deployer.calls().len(), 1);
    }
}

mod disconnect {
    use super::*;

    /// Deployer that takes a while and records whether it ran to completion.
    #[derive(Clone, Default)]
    struct SlowDeployer {
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Deployer for SlowDeployer {
        async fn update(&self, _target: &str, _image: &str) -> Result<(), DeployError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn dropped_request_does_not_cancel_update() {
        support::init_tracing();
        let deployer = SlowDeployer::default();
        let app = router(Arc::new(deployer.clone()) as Arc<dyn Deployer>, None);

        let request = app.oneshot(get("/update?service=web&image=web:2"));
        let timed_out = tokio::time::timeout(Duration::from_millis(10), request).await;
        assert!(timed_out.is_err());
        assert!(!deployer.finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(deployer.finished.load(Ordering::SeqCst));
    }
}
