// libs/consultation-cell/src/services/mod.rs

pub mod consultation;
pub mod store;
pub mod supabase_store;
pub mod validation;

pub use consultation::ConsultationService;
pub use store::{ConsultationStore, InMemoryConsultationStore};
pub use supabase_store::SupabaseConsultationStore;
pub use validation::{normalize_email, normalize_room_name};
