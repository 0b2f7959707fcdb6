// libs/consultation-cell/src/lib.rs
//! # Consultation Cell
//!
//! Scheduling and roster management for time-boxed video consultations.
//!
//! A host schedules a room with a start/end instant and a list of invited
//! client emails. Clients verify their email against the roster, pick a
//! display name once, and may extend the session's end time.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                Consultation Cell                    |
//! +-----------------------------------------------------+
//! |  handlers.rs    |  HTTP endpoint handlers           |
//! |  router.rs      |  Route definitions                |
//! |  models.rs      |  Records, DTOs & errors           |
//! |  services/      |  Business logic layer             |
//! |    consultation.rs | Scheduling rules              |
//! |    validation.rs   | Normalization & input checks  |
//! |    store.rs        | Store trait + in-memory store |
//! |    supabase_store.rs | Hosted document store       |
//! +-----------------------------------------------------+
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /consultations` - Schedule a consultation
//! - `GET /consultations/{room}` - Fetch details
//! - `POST /consultations/{room}/verify` - Verify a client email
//! - `PUT /consultations/{room}/clients/name` - Set a client's display name
//! - `POST /consultations/{room}/extend` - Extend the end time
//! - `GET /consultations/extension-offers` - Extension menu
//!
//! Room names are case-insensitive: every lookup goes through
//! [`normalize_room_name`], and join links always use the normalized form.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Client, Consultation, ConsultationError, ExtensionOffer, ExtensionOutcome, NewConsultation,
    ScheduleConsultationRequest, ScheduleConsultationResponse, StoreError, VerifiedClient,
    EXTENSION_OFFERS,
};

pub use services::{
    normalize_email, normalize_room_name, ConsultationService, ConsultationStore,
    InMemoryConsultationStore, SupabaseConsultationStore,
};

pub use router::consultation_routes;
