//! Caché de modelos compartida por todas las sesiones del proceso.
//!
//! Cada identificador tiene un `OnceCell`: la primera sesión que lo pide
//! ejecuta la carga y las que lleguen mientras tanto esperan y reutilizan el
//! resultado. Las entradas no se expulsan nunca. Una carga fallida retira su
//! celda del mapa y se reintenta en la siguiente petición.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::application::ports::{DetectorFactoryPort, DetectorPort};
use crate::domain::errors::{DomainError, DomainResult};

type Slot = Arc<OnceCell<Arc<dyn DetectorPort>>>;

pub struct ModelCache {
    factory: Arc<dyn DetectorFactoryPort>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModelCache {
    pub fn new(factory: Arc<dyn DetectorFactoryPort>) -> Self {
        Self { factory, slots: Mutex::new(HashMap::new()) }
    }

    /// Devuelve el detector de `model_id`, cargándolo si es la primera vez.
    pub async fn get_or_load(&self, model_id: &str) -> DomainResult<Arc<dyn DetectorPort>> {
        if model_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("identificador de modelo vacío".into()));
        }

        let slot = self.slot(model_id)?;
        let loaded = slot
            .get_or_try_init(|| async {
                info!("Cargando modelo '{}'...", model_id);
                let started = Instant::now();
                let detector = self.factory.load(model_id).await?;
                info!("Modelo '{}' listo en {:.2?}", model_id, started.elapsed());
                Ok::<_, DomainError>(detector)
            })
            .await;

        match loaded {
            Ok(detector) => Ok(detector.clone()),
            Err(e) => {
                warn!("Carga del modelo '{}' fallida: {}", model_id, e);
                self.discard_failed(model_id, &slot);
                Err(e)
            }
        }
    }

    /// Identificadores con un detector residente, ordenados.
    pub fn loaded_models(&self) -> Vec<String> {
        let Ok(slots) = self.slots.lock() else { return Vec::new() };
        let mut ids: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn slot(&self, model_id: &str) -> DomainResult<Slot> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| DomainError::OperationFailed("Lock de la caché de modelos fallido".into()))?;
        Ok(slots.entry(model_id.to_string()).or_default().clone())
    }

    // Se retira la celda si sigue vacía y es la misma que se intentó cargar.
    // Quien siga esperando en ella reintenta por su cuenta.
    fn discard_failed(&self, model_id: &str, slot: &Slot) {
        let Ok(mut slots) = self.slots.lock() else { return };
        let remove = slots.get(model_id).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized()
        });
        if remove {
            slots.remove(model_id);
        }
    }
}
