use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use tracing::{error, info, warn};

use crate::adapters::http::state::HttpState;
use crate::application::session::Session;
use crate::domain::protocol;

pub async fn ws_handler(ws: WebSocketUpgrade, State(st): State<HttpState>) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, st))
}

/// Bucle de una conexión: lee, procesa y responde de uno en uno, así que
/// las respuestas salen en el mismo orden que llegaron los frames.
async fn handle_socket(mut socket: WebSocket, st: HttpState) {
    let mut session = Session::new(st.detection.clone());
    info!("Cliente WebSocket conectado");

    while let Some(msg) = socket.recv().await {
        let handled = match msg {
            Ok(Message::Text(text)) => session.handle_text(&text).await,
            Ok(Message::Binary(bytes)) => session.handle_message(protocol::parse_binary(bytes.into())).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("Error de transporte: {}", e);
                break;
            }
        };

        match handled {
            Ok(Some(reply)) => {
                let json = match protocol::encode(&reply) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("No se pudo serializar la respuesta: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            // El frame se descarta y la sesión sigue leyendo.
            Err(e) => warn!("Frame #{} descartado: {}", session.frame_count(), e),
        }
    }

    session.close();
    info!(
        "Cliente WebSocket desconectado tras {} frames ({:?})",
        session.frame_count(),
        session.state()
    );
}
