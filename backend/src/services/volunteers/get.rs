use crate::error::ApiError;
use crate::services::AppContext;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    sai_connect_id: web::Path<String>,
    ctx: web::Data<AppContext>,
) -> Result<HttpResponse, ApiError> {
    let id = sai_connect_id.into_inner();
    match ctx.store.find_volunteer(id.trim()).await? {
        Some(volunteer) => Ok(HttpResponse::Ok().json(volunteer)),
        None => Err(ApiError::NotFound(format!("volunteer {}", id))),
    }
}
