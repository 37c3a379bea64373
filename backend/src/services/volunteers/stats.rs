use crate::error::ApiError;
use crate::services::AppContext;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(ctx: web::Data<AppContext>) -> Result<HttpResponse, ApiError> {
    let stats = ctx.store.volunteer_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
