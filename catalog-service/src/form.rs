//! Service creation body: multipart form with an optional logo, or JSON.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use validator::Validate;

use common::errors::AppError;
use common::models::CreateServiceRequest;

/// Logo file attached to a creation form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Validated service creation input.
#[derive(Debug, Clone)]
pub struct ServiceForm {
    pub request: CreateServiceRequest,
    pub upload: Option<Upload>,
}

impl<S> FromRequest<S> for ServiceForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        let form = if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            read_multipart(multipart).await?
        } else {
            let Json(request) = Json::<CreateServiceRequest>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            ServiceForm {
                request,
                upload: None,
            }
        };

        form.request.validate()?;
        Ok(form)
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ServiceForm, AppError> {
    let mut request = CreateServiceRequest::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked.
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    if !bytes.is_empty() {
                        upload = Some(Upload { file_name, bytes });
                    }
                }
            }
            "name" => request.name = field.text().await.map_err(multipart_error)?,
            "uri" => request.uri = field.text().await.map_err(multipart_error)?,
            "description" => {
                request.description = non_empty(field.text().await.map_err(multipart_error)?);
            }
            "categoryId" | "category_id" => {
                let raw = field.text().await.map_err(multipart_error)?;
                request.category_id = match non_empty(raw) {
                    Some(value) => Some(value.trim().parse().map_err(|_| {
                        AppError::BadRequest(format!("{name} must be an integer, got '{value}'"))
                    })?),
                    None => None,
                };
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(ServiceForm { request, upload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    const BOUNDARY: &str = "X-CATALOG-BOUNDARY";

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request {
        let mut body = String::new();
        for (name, file_name, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\nContent-Type: image/png\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/services")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_multipart_with_logo() {
        let req = multipart_request(&[
            ("name", None, "weather"),
            ("uri", None, "https://api.weather.test"),
            ("categoryId", None, "2"),
            ("image", Some("logo.png"), "PNGDATA"),
        ]);
        let form = ServiceForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.request.name, "weather");
        assert_eq!(form.request.category_id, Some(2));
        let upload = form.upload.unwrap();
        assert_eq!(upload.file_name, "logo.png");
        assert_eq!(&upload.bytes[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn test_empty_file_part_is_ignored() {
        let req = multipart_request(&[
            ("name", None, "weather"),
            ("uri", None, "https://api.weather.test"),
            ("image", Some(""), ""),
        ]);
        let form = ServiceForm::from_request(req, &()).await.unwrap();
        assert!(form.upload.is_none());
    }

    #[tokio::test]
    async fn test_bad_category_is_rejected() {
        let req = multipart_request(&[
            ("name", None, "weather"),
            ("uri", None, "u"),
            ("category_id", None, "abc"),
        ]);
        let err = ServiceForm::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_json_body_is_accepted() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/services")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"name":"weather","uri":"https://api.weather.test","category_id":1}"#,
            ))
            .unwrap();
        let form = ServiceForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.request.category_id, Some(1));
        assert!(form.upload.is_none());
    }

    #[tokio::test]
    async fn test_missing_name_fails_validation() {
        let req = multipart_request(&[("uri", None, "u")]);
        let err = ServiceForm::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(_)));
    }
}
