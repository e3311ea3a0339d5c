mod adapters;
mod application;
mod config;
mod domain;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::adapters::{
    http::{router, state::HttpState},
    image::base64_decoder::Base64ImageDecoder,
    onnx::model_catalog::OnnxModelCatalog,
};
use crate::application::{model_cache::ModelCache, services::DetectionService};
use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!("🔧 Inicializando adaptadores: modelos en '{}'", args.models_dir.display());

    // 2. Adaptadores (infraestructura)
    let catalog = Arc::new(OnnxModelCatalog::new(args.models_dir.clone(), args.engine_options()));
    let decoder = Arc::new(Base64ImageDecoder::new());

    // 3. Caché de modelos y caso de uso, compartidos por todas las sesiones
    let models = Arc::new(ModelCache::new(catalog.clone()));
    let detection = Arc::new(DetectionService::new(models, decoder, catalog, args.default_model.clone()));

    // Sin el modelo por defecto no hay servicio: fallo fatal al arrancar.
    detection
        .ensure_model(&args.default_model)
        .await
        .with_context(|| format!("no se pudo precargar el modelo '{}'", args.default_model))?;

    // 4. Router de Axum
    let app = router(HttpState { detection });

    // 5. Lanzar el servidor
    let addr = args.addr();
    tracing::info!("🚀 Relé de detección escuchando en http://{} (WebSocket en /ws)", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
