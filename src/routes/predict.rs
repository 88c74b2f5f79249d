use crate::{
    inference_service::InferenceError, model_service::ModelService, server::SharedState,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Serialize)]
pub struct PredictResponse {
    message: String,
    prediction: String,
    class_number: i64,
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("missing `file` field in multipart upload")]
    MissingFile,
    #[error("failed to read multipart upload: {0}")]
    Multipart(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingFile | PredictError::Multipart(_) => StatusCode::BAD_REQUEST,
            PredictError::Inference(InferenceError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
            PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("prediction failed: {}", self);
        }
        (
            status,
            Json(ErrorDetail {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictError> {
    state.metrics.record_request("/predict");
    let started = Instant::now();

    let mut image_data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::Multipart(e.to_string()))?
    {
        if field.name() == Some("file") {
            image_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| PredictError::Multipart(e.to_string()))?,
            );
            break;
        }
    }
    let image_data = image_data.ok_or(PredictError::MissingFile)?;

    let prediction = state.inference_service.predict(&image_data)?;

    state
        .metrics
        .record_prediction_duration(started.elapsed().as_millis() as u64, "/predict");
    tracing::info!(
        class_number = prediction.class_index,
        label = %prediction.label,
        "prediction served"
    );

    Ok(Json(PredictResponse {
        message: "successfully predict".into(),
        prediction: prediction.label,
        class_number: prediction.class_index,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_service::ModelError;
    use crate::scaler::ScalerError;

    fn decode_error() -> image::ImageError {
        image::load_from_memory(&[0u8, 1, 2, 3]).unwrap_err()
    }

    #[test]
    fn test_invalid_image_maps_to_bad_request() {
        let error = PredictError::Inference(InferenceError::InvalidImage(decode_error()));

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Invalid image file!");
    }

    #[test]
    fn test_missing_file_maps_to_bad_request() {
        assert_eq!(PredictError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pipeline_failures_map_to_server_error() {
        let unavailable = PredictError::Inference(InferenceError::ModelUnavailable);
        let mismatch = PredictError::Inference(InferenceError::Scaler(
            ScalerError::LengthMismatch {
                expected: 1794,
                actual: 10,
            },
        ));
        let model = PredictError::Inference(InferenceError::Model(ModelError::EmptyOutput));

        assert_eq!(unavailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mismatch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(model.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
