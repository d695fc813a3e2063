//! HTTP API
//!
//! - POST /api/agent - Append a conversation turn
//! - POST /api/chat, /api/tts, /api/solution, /api/summary - Vendor-backed helpers
//! - POST /api/realtime/session, /api/realtime/say - Realtime voice bootstrap
//! - GET/DELETE /api/transcripts[/:id] - Transcript admin (x-admin-pass)
//! - GET/POST/PUT/DELETE /api/articles[/:id] - Blog (writes need x-admin-pass)
//! - GET /api/stt, /api/evi - WebSocket relays
//! - GET /health - Health check

mod assistant;
mod auth;
mod error;
mod handlers;
mod routes;
mod state;

pub use auth::{AdminAccess, ADMIN_HEADER};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
