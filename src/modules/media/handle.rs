use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;

use crate::api::{error, success};
use crate::middlewares::current_user;
use crate::modules::{
    media::{
        model::{MediaQuery, UploadResponse},
        service::MediaService,
    },
    user::schema::MediaSlot,
};

struct UploadedFile {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Multipart form with a `file` part and an optional `type` part
/// (`avatar` | `banner`).
#[post("/upload")]
pub async fn upload_media(
    mut payload: Multipart,
    req: HttpRequest,
    service: web::Data<MediaService>,
) -> Result<success::Success<UploadResponse>, error::Error> {
    let user_id = current_user(&req)?;

    let mut file: Option<UploadedFile> = None;
    let mut slot = MediaSlot::Avatar;

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(|f| f.to_string()),
            ),
            None => return Err(error::Error::bad_request("Missing content disposition")),
        };

        match name.as_str() {
            "file" => {
                let mime_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) =
                    field.try_next().await.map_err(|_| error::Error::InternalServer)?
                {
                    if bytes.len() + chunk.len() > service.max_file_size() {
                        return Err(error::Error::bad_request(format!(
                            "File size exceeds maximum allowed size of {} bytes",
                            service.max_file_size()
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                file = Some(UploadedFile {
                    filename: filename.unwrap_or_else(|| "upload".to_string()),
                    mime_type,
                    bytes,
                });
            }
            "type" => {
                let mut raw = Vec::new();
                while let Some(chunk) =
                    field.try_next().await.map_err(|_| error::Error::InternalServer)?
                {
                    raw.extend_from_slice(&chunk);
                }
                let value = String::from_utf8_lossy(&raw);
                slot = value
                    .trim()
                    .parse::<MediaSlot>()
                    .map_err(|_| error::Error::bad_request("Invalid type"))?;
            }
            _ => {
                // drain unknown parts
                while field.try_next().await.map_err(|_| error::Error::InternalServer)?.is_some() {}
            }
        }
    }

    let file = file.ok_or_else(|| error::Error::bad_request("Missing file"))?;

    let response = service
        .upload_user_media(user_id, slot, &file.filename, file.bytes, &file.mime_type)
        .await?;

    Ok(success::Success::ok(response))
}

#[get("/{path:.*}")]
pub async fn serve_media(
    path: web::Path<String>,
    query: web::Query<MediaQuery>,
    service: web::Data<MediaService>,
) -> Result<HttpResponse, error::Error> {
    let (bytes, mime) = service.fetch(&path, &query.token).await?;
    Ok(HttpResponse::Ok().content_type(mime).body(bytes))
}
