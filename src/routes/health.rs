use axum::{response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Greeting {
    message: String,
}

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
}

pub async fn root() -> impl IntoResponse {
    Json(Greeting {
        message: "Hello world from Axum!".into(),
    })
}

pub async fn healthcheck() -> impl IntoResponse {
    Json(Status {
        status: "Available".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_always_returns_fixed_greeting() {
        for _ in 0..2 {
            let response = root().await.into_response();
            assert_eq!(response.status(), axum::http::StatusCode::OK);
        }
    }
}
