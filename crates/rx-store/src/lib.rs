//! Database probe against a Supabase (PostgREST) backend.
//!
//! Inserts one dummy prescription into a table and reports what the server
//! echoes back.

mod client;
pub mod probe;

pub use client::{RecordStore, SupabaseClient};
pub use probe::{test_connection, PLACEHOLDER_MARKER};
