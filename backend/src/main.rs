mod config;
mod error;
mod job_controller;
mod pipeline;
mod services;
mod store;

use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::pipeline::batch::BatchWriter;
use crate::pipeline::headers::HeaderResolver;
use crate::pipeline::UploadPipeline;
use crate::services::AppContext;
use crate::store::SqliteRecordStore;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use common::model::schema::FieldSchema;
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::parse();

    let store = SqliteRecordStore::open(&config.database)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let pipeline = UploadPipeline::new(
        FieldSchema::volunteer(),
        HeaderResolver::default(),
        BatchWriter::new(config.batch_size.get())
            .with_concurrency(config.batch_concurrency.get()),
    );
    let ctx = AppContext {
        store,
        pipeline: Arc::new(pipeline),
        max_upload_bytes: config.max_upload_bytes(),
    };

    let (jobs_state, rx) = JobsState::new();
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    info!(
        "Server running at {} (batch size {}, {} in flight, upload limit {} MB)",
        config.url(),
        config.batch_size,
        config.batch_concurrency,
        config.max_upload_mb
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::volunteers::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
