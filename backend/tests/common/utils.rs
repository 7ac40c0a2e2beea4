use axum::response::Response;
use http_body_util::BodyExt;
use uuid::Uuid;

/// Random object key so tests never collide
pub fn create_object_key() -> String {
    format!("uploads/{}.txt", Uuid::new_v4().simple())
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Value of a query parameter of `url`
pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
