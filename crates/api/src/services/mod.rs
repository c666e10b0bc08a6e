//! Business logic services.
//!
//! - [`auth`] - Registration and credential verification (argon2)
//! - [`token`] - Signed bearer tokens (HS256)
//! - [`email`] - Transactional mail (lettre + askama)
//! - [`media`] - Upload validation and re-encoding

pub mod auth;
pub mod email;
pub mod media;
pub mod token;

pub use auth::AuthService;
pub use email::EmailService;
pub use media::MediaStore;
pub use token::TokenService;
