//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = ctx.config.server.max_upload_bytes;

    let api = Router::new()
        .route("/health", get(routes::health::api_health))
        .route("/tools", get(routes::tools::tools))
        .route("/process", post(routes::process::process))
        .route(
            "/reports/{job_id}/{filename}",
            get(routes::reports::download),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use mt_av::ToolRegistry;
    use mt_core::config::Config;
    use mt_core::ReportFormat;
    use mt_pipeline::{
        AudioExtractor, JobWorkspace, ReportRenderer, Summarizer, SummarySettings,
        TranscribeSettings, Transcriber,
    };
    use tower::ServiceExt;

    use crate::context::SummarizerFactory;

    struct Stub;

    #[async_trait]
    impl AudioExtractor for Stub {
        async fn extract(&self, _: &Path, output: &Path, _: bool) -> mt_core::Result<()> {
            std::fs::write(output, b"RIFF")?;
            Ok(())
        }
    }

    #[async_trait]
    impl Transcriber for Stub {
        async fn transcribe(&self, _: &Path, _: &TranscribeSettings) -> mt_core::Result<String> {
            Ok("hello there".into())
        }
    }

    #[async_trait]
    impl Summarizer for Stub {
        async fn summarize(&self, _: &str, _: &SummarySettings) -> mt_core::Result<String> {
            Ok("a greeting".into())
        }
    }

    #[async_trait]
    impl ReportRenderer for Stub {
        async fn render(&self, _: &str, _: &str, format: ReportFormat) -> mt_core::Result<Vec<u8>> {
            Ok(format!("report {format}").into_bytes())
        }
    }

    impl SummarizerFactory for Stub {
        fn summarizer(
            &self,
            _: Option<&str>,
            _: Option<&str>,
        ) -> mt_core::Result<Arc<dyn Summarizer>> {
            Ok(Arc::new(Stub))
        }
    }

    fn app(root: &Path) -> Router {
        let mut config = Config::default();
        config.server.output_dir = root.join("outputs");
        let workspace = JobWorkspace::new(&config.server.output_dir).unwrap();
        let stub = Arc::new(Stub);
        build_router(AppContext {
            config: Arc::new(config),
            tools: Arc::new(ToolRegistry::default()),
            workspace: Arc::new(workspace),
            extractor: stub.clone(),
            transcriber: stub.clone(),
            renderer: stub.clone(),
            summarizers: stub,
        })
    }

    const BOUNDARY: &str = "mtboundary";

    fn multipart(file_name: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nRIFFdata\r\n--{BOUNDARY}--\r\n"
        ));
        Request::post("/api/process")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoints() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app(root.path())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn process_then_download() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("clip.mp4", &[("reportFormat", "pdf")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["transcript"], "hello there");
        assert_eq!(body["summary"], "a greeting");
        let job_id = body["jobId"].as_str().unwrap().to_string();
        assert_eq!(body["reportRef"], format!("{job_id}/report.pdf"));
        let url = body["reportUrl"].as_str().unwrap().to_string();
        assert_eq!(url, format!("/api/reports/{job_id}/report.pdf"));

        let response = app(root.path())
            .oneshot(Request::get(url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"report pdf");
    }

    #[tokio::test]
    async fn unsupported_extension_is_400_and_allocates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("song.ogg", &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["code"], "validation_error");
        assert!(body["request_id"].is_string());
        assert!(body.get("jobId").is_none());
        assert_eq!(std::fs::read_dir(root.path().join("outputs")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn bad_report_format_is_400() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("clip.mp4", &[("reportFormat", "odt")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_job_id_is_400() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(
                Request::get("/api/reports/not-a-job/report.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_report_is_404() {
        let root = tempfile::tempdir().unwrap();
        let uri = format!("/api/reports/{}/report.docx", mt_core::JobId::new());
        let response = app(root.path())
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
