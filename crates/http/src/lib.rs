//! Job tracker API client
//!
//! Typed access to the job tracker REST backend (job postings, applications,
//! answers, authentication) with transparent access token renewal: requests
//! rejected with 401 are replayed once after a single shared refresh.

pub mod client;
pub mod salary;
pub mod types;

pub use client::error::ClientError;
pub use client::session::{Access, Session};
pub use client::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use client::{ApiBody, ApiRequest, FilePart, JobTrackClient};
