//! Adapter for a hosted Supabase project.
//!
//! [`SupabaseClient`] implements the auth gateway and every table port, so
//! the whole board can be wired from one `Arc<SupabaseClient>`.

mod auth;
mod client;
mod dto;
mod query;
mod repositories;

pub use client::{SupabaseClient, SupabaseConfig};
