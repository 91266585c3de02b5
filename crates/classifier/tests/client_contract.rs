//! Client contract tests against an in-process service

use bundlelens_classifier::{ClassifierClient, ClassifierError, ClientConfig, SessionContext};
use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

/// Start `routes` on an ephemeral port and return the base URL
macro_rules! serve {
    ($routes:expr) => {{
        let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{addr}")
    }};
}

fn client(base_url: String) -> ClassifierClient {
    ClassifierClient::new(&ClientConfig {
        api_url: base_url,
        timeout_seconds: 5,
        session_file: None,
    })
    .unwrap()
}

fn detail(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "detail": message })), status)
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let login = warp::post()
        .and(warp::path!("api" / "auth" / "login"))
        .and(warp::body::json())
        .map(|body: Value| {
            if body["password"] == "secret" {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "access_token": "tok-123",
                        "token_type": "bearer",
                        "user": {
                            "id": 7,
                            "email": body["email"],
                            "name": "Field Broker",
                            "role": "broker",
                            "is_active": true
                        }
                    })),
                    StatusCode::OK,
                )
            } else {
                detail(StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
        });
    let client = client(serve!(login));

    let session = client.login("broker@example.com", "secret").await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.bearer().as_deref(), Some("Bearer tok-123"));
    let user = session.user.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.email, "broker@example.com");

    let err = client.login("broker@example.com", "wrong").await.unwrap_err();
    match err {
        ClassifierError::Rejected { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn metadata_sends_bearer_token() {
    let metadata = warp::get()
        .and(warp::path!("api" / "classify" / "metadata"))
        .and(warp::header::optional::<String>("authorization"))
        .map(|auth: Option<String>| {
            if auth.as_deref() == Some("Bearer tok-123") {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "ready": true,
                        "classes": ["Basic_Health", "Home_Standard"],
                        "global_importances": { "Adult_Dependents": 0.2, "Estimated_Annual_Income": 0.9 }
                    })),
                    StatusCode::OK,
                )
            } else {
                detail(StatusCode::UNAUTHORIZED, "Not authenticated")
            }
        });
    let client = client(serve!(metadata));

    let meta = client
        .metadata(&SessionContext::with_token("tok-123"))
        .await
        .unwrap();
    assert!(meta.ready);
    assert_eq!(meta.classes, vec!["Basic_Health", "Home_Standard"]);
    assert_eq!(meta.global_importances[0].feature, "Estimated_Annual_Income");

    let err = client
        .metadata(&SessionContext::anonymous())
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::Unauthorized));
}

#[tokio::test]
async fn single_prediction_round_trip() {
    let single = warp::post()
        .and(warp::path!("api" / "classify" / "single"))
        .and(warp::body::json())
        .map(|body: Value| {
            assert_eq!(body["Region_Code"], 3);
            warp::reply::json(&json!({
                "predicted_bundle": "Home_Premium",
                "predicted_index": 5,
                "confidence": 87.5,
                "class_probabilities": { "Home_Premium": 87.5, "Home_Standard": 12.5 },
                "feature_explanations": [
                    { "feature": "Estimated_Annual_Income", "shap_value": 1.25 }
                ],
                "base_value": 0.1
            }))
        });
    let client = client(serve!(single));

    let prediction = client
        .classify_single(
            &SessionContext::with_token("tok"),
            &json!({ "Region_Code": 3, "Adult_Dependents": 1 }),
        )
        .await
        .unwrap();
    assert_eq!(prediction.row.predicted_class, "Home_Premium");
    assert_eq!(prediction.row.confidence, 87.5);
    assert_eq!(prediction.predicted_index, Some(5));
    assert_eq!(prediction.explanations.len(), 1);
}

#[tokio::test]
async fn malformed_single_response_is_an_ingestion_error() {
    let single = warp::post()
        .and(warp::path!("api" / "classify" / "single"))
        .map(|| warp::reply::json(&json!({ "predicted_bundle": "Home_Premium" })));
    let client = client(serve!(single));

    let err = client
        .classify_single(&SessionContext::with_token("tok"), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::Ingestion(_)));
}

#[tokio::test]
async fn batch_upload_is_multipart_csv() {
    let batch = warp::post()
        .and(warp::path!("api" / "classify" / "batch"))
        .and(warp::header::<String>("content-type"))
        .and(warp::body::bytes())
        .map(|content_type: String, body: warp::hyper::body::Bytes| {
            let body = String::from_utf8_lossy(&body);
            if !content_type.starts_with("multipart/form-data")
                || !body.contains("name=\"file\"")
                || !body.contains("filename=\"clients.csv\"")
                || !body.contains("user_id,Region_Code")
            {
                return detail(StatusCode::BAD_REQUEST, "expected a csv upload");
            }
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "predictions": [
                        { "user_id": "u1", "predicted_bundle": "Basic_Health", "confidence": 91.0 },
                        { "user_id": "u2", "predicted_bundle": "Home_Standard", "confidence": 64.0 }
                    ],
                    "total_rows": 2,
                    "global_importances": { "Region_Code": 0.3 }
                })),
                StatusCode::OK,
            )
        });
    let client = client(serve!(batch));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clients.csv");
    std::fs::write(&path, "user_id,Region_Code\nu1,3\nu2,4\n").unwrap();

    let result = client
        .classify_batch(&SessionContext::with_token("tok"), &path)
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[1].row_index, 1);
    assert_eq!(result.rows[1].subject_id, "u2");
    assert_eq!(result.summary.total_rows, 2);
}

#[tokio::test]
async fn non_csv_upload_never_reaches_the_service() {
    // No server: a request would fail with a network error instead.
    let client = client("http://127.0.0.1:9".to_string());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clients.xlsx");
    std::fs::write(&path, "irrelevant").unwrap();

    let err = client
        .classify_batch(&SessionContext::with_token("tok"), &path)
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::UnsupportedUpload(_)));
}

#[tokio::test]
async fn service_errors_carry_detail() {
    let unavailable = warp::path!("api" / "classify" / "metadata")
        .map(|| detail(StatusCode::SERVICE_UNAVAILABLE, "Model not loaded"));
    let rejected = warp::path!("api" / "classify" / "single").map(|| {
        detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Missing column: Estimated_Annual_Income",
        )
    });
    let bare = warp::path!("api" / "classify" / "batch")
        .map(|| warp::reply::with_status("oops", StatusCode::INTERNAL_SERVER_ERROR));
    let client = client(serve!(unavailable.or(rejected).or(bare)));
    let session = SessionContext::with_token("tok");

    match client.metadata(&session).await.unwrap_err() {
        ClassifierError::ServiceUnavailable(detail) => assert_eq!(detail, "Model not loaded"),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.classify_single(&session, &json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing column: Estimated_Annual_Income");

    let err = client
        .classify_batch_bytes(&session, "clients.csv", b"a,b\n1,2\n".to_vec())
        .await
        .unwrap_err();
    match err {
        ClassifierError::Rejected { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Request failed: 500");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
    let single = warp::path!("api" / "classify" / "single")
        .map(|| detail(StatusCode::UNAUTHORIZED, "Token expired"));
    let client = client(serve!(single));

    let err = client
        .classify_single(&SessionContext::with_token("stale"), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::Unauthorized));
}
