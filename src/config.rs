use clap::Parser;
use std::path::PathBuf;

use crate::adapters::onnx::yolo_engine::EngineOptions;
use crate::domain::model::DEFAULT_MODEL;

/// Relé de detección de objetos en tiempo real sobre WebSocket.
#[derive(Debug, Clone, Parser)]
#[command(name = "detect-relay", version, about)]
pub struct Args {
    /// Dirección de escucha
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RELAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Carpeta con los modelos `<id>.onnx`
    #[arg(long, env = "RELAY_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Modelo que se precarga al arrancar y usan las sesiones nuevas
    #[arg(long, env = "RELAY_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// Lado de la entrada cuadrada del modelo
    #[arg(long, env = "RELAY_INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, env = "RELAY_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl Args {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            input_size: self.input_size,
            intra_threads: self.intra_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["detect-relay"]).unwrap();
        assert_eq!(args.addr(), "127.0.0.1:8000");
        assert_eq!(args.models_dir, PathBuf::from("models"));
        assert_eq!(args.default_model, "yolov8n");
        assert_eq!(args.engine_options().input_size, 640);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "detect-relay", "--port", "9001", "--default-model", "yolov8s", "--intra-threads", "2",
        ])
        .unwrap();
        assert_eq!(args.port, 9001);
        assert_eq!(args.default_model, "yolov8s");
        assert_eq!(args.engine_options().intra_threads, 2);
    }
}
