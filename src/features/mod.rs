//! Domain-level features of the console core. Only the auth feature lives here;
//! catalog screens consume it through the guard components and the
//! `AuthService` surface.

pub mod auth;
