// ==========================================
// Système Qualité Laboratoire - Couche API
// ==========================================
// Interfaces métier appelées par les écrans
// ==========================================

pub mod error;
pub mod quality_api;

// Réexport des types centraux
pub use error::{ApiError, ApiResult};
pub use quality_api::QualityApi;
