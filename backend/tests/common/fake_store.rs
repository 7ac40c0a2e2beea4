use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

/// In-process S3 stand-in speaking just enough of the path-style API
///
/// Object requests must use `object_method` and, when set, carry
/// `Content-Type: content_type`, otherwise the store answers 403 the way S3
/// does on a signature mismatch.
pub struct FakeStore {
    pub endpoint: String,
    state: Arc<FakeState>,
}

struct FakeState {
    hits: AtomicUsize,
    object_method: Method,
    content_type: Option<String>,
    put_delay: Duration,
    buckets: Vec<String>,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl FakeStore {
    pub async fn start(buckets: &[impl AsRef<str>], object_method: Method, content_type: Option<&str>) -> Self {
        Self::start_with_put_delay(buckets, object_method, content_type, Duration::ZERO).await
    }

    /// Same as `start`, but object `PUT`s are answered only after `put_delay`
    pub async fn start_with_put_delay(
        buckets: &[impl AsRef<str>],
        object_method: Method,
        content_type: Option<&str>,
        put_delay: Duration,
    ) -> Self {
        let state = Arc::new(FakeState {
            hits: AtomicUsize::new(0),
            object_method,
            content_type: content_type.map(ToString::to_string),
            put_delay,
            buckets: buckets.iter().map(|b| b.as_ref().to_string()).collect(),
            objects: Mutex::new(BTreeMap::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{addr}"),
            state,
        }
    }

    /// Number of requests received so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
        self.state
            .objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
    }
}

fn error_response(status: StatusCode, code: &str, with_body: bool) -> Response {
    if !with_body {
        return status.into_response();
    }

    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>{code}</Code><Message>{code}</Message><RequestId>fake</RequestId></Error>"#
    );
    (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let path = uri.path().trim_start_matches('/');
    let (bucket, key) = match path.split_once('/') {
        Some((bucket, key)) if !key.is_empty() => (bucket.to_string(), Some(key.to_string())),
        Some((bucket, _)) => (bucket.to_string(), None),
        None => (path.to_string(), None),
    };

    let is_head = method == Method::HEAD;

    if !state.buckets.contains(&bucket) {
        return error_response(StatusCode::NOT_FOUND, "NoSuchBucket", !is_head);
    }

    let Some(key) = key else {
        return if is_head {
            StatusCode::OK.into_response()
        } else if method == Method::GET {
            list_bucket(&state, &bucket, uri.query().unwrap_or_default())
        } else {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", true)
        };
    };

    if method != state.object_method {
        return error_response(StatusCode::FORBIDDEN, "SignatureDoesNotMatch", !is_head);
    }

    if let Some(expected) = &state.content_type {
        let declared = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        if declared != Some(expected.as_str()) {
            return error_response(StatusCode::FORBIDDEN, "SignatureDoesNotMatch", true);
        }
    }

    if method == Method::PUT && !state.put_delay.is_zero() {
        tokio::time::sleep(state.put_delay).await;
    }

    let mut objects = state.objects.lock().unwrap();
    if method == Method::PUT {
        objects.insert((bucket, key), body.to_vec());
        (StatusCode::OK, [(header::ETAG, "\"fake-etag\"")]).into_response()
    } else if method == Method::GET {
        match objects.get(&(bucket, key)) {
            Some(body) => (StatusCode::OK, body.clone()).into_response(),
            None => error_response(StatusCode::NOT_FOUND, "NoSuchKey", true),
        }
    } else {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", true)
    }
}

/// `ListObjectsV2`, continuation tokens are plain offsets
fn list_bucket(state: &FakeState, bucket: &str, query: &str) -> Response {
    let params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let max_keys: usize = params
        .get("max-keys")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1000);
    let offset: usize = params
        .get("continuation-token")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let objects = state.objects.lock().unwrap();
    let keys: Vec<(&String, usize)> = objects
        .iter()
        .filter(|((b, _), _)| b == bucket)
        .map(|((_, k), body)| (k, body.len()))
        .collect();

    let page: Vec<_> = keys.iter().skip(offset).take(max_keys).collect();
    let next = offset + page.len();
    let is_truncated = next < keys.len();

    let contents: String = page
        .iter()
        .map(|(key, size)| {
            format!(
                "<Contents><Key>{key}</Key><LastModified>2026-01-01T00:00:00.000Z</LastModified><ETag>&quot;fake-etag&quot;</ETag><Size>{size}</Size><StorageClass>STANDARD</StorageClass></Contents>"
            )
        })
        .collect();

    let next_token = if is_truncated {
        format!("<NextContinuationToken>{next}</NextContinuationToken>")
    } else {
        String::new()
    };

    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{bucket}</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>{max_keys}</MaxKeys><IsTruncated>{is_truncated}</IsTruncated>{contents}{next_token}</ListBucketResult>"#,
        page.len()
    );

    (StatusCode::OK, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}
