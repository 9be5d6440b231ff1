//! Job-board domain: entities, the remote API gateway, and the optimistic
//! store that keeps local state and derived views in sync with the backend.

pub mod api_types;
pub mod client;
pub mod store;
pub mod types;
