use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yolo_web_detect::adapters::{
    http::{router, state::HttpState},
    onnx::{model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    render::{annotator::BoxPainter, font::load_label_font},
};
use yolo_web_detect::application::{ports::ModelCatalogPort, services::DetectionService};
use yolo_web_detect::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let infer = args.inference_config();

    // 2. Validar y cargar el modelo: sin modelo no se sirve nada.
    tracing::info!("🔧 Cargando modelo {}", infer.model.onnx_path);
    OnnxModelCatalog::new()
        .validate_model(&infer.model)
        .await
        .context("model validation failed")?;
    let engine = OnnxYoloEngine::load(&infer).context("model loading failed")?;
    tracing::info!("Formato de salida: {:?}", engine.layout());

    let font = load_label_font(args.font.as_deref()).context("label font")?;
    let painter = BoxPainter::new(font);
    tracing::info!("Texto en etiquetas: {}", if painter.has_font() { "sí" } else { "no" });

    // 3. Servicio de inferencia compartido en solo lectura
    let detection = DetectionService::new(Arc::new(engine), Arc::new(painter))
        .with_timeout(args.inference_timeout());

    let state = HttpState {
        detection: Arc::new(detection),
        max_upload_bytes: args.max_upload_bytes(),
    };

    // 4. Lanzar el Servidor
    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("🚀 Servidor YOLO iniciado en http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
