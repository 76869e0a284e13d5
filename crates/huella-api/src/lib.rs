//! JSON endpoint layer of the Huella fingerprint service.
//!
//! Everything HTTP-shaped lives here, but nothing transport-bound: the
//! [`Api`] struct exposes one async method per endpoint, taking the
//! deserialized request body and returning either a serializable response
//! or an [`ApiError`] with the HTTP status and device diagnostics to
//! answer with. A binary mounts these on whatever router it likes; the
//! tests drive them directly.
//!
//! Binary payloads (frames, templates) cross the wire as standard base64;
//! response messages keep the Spanish vocabulary deployed clients expect.

pub mod api;
pub mod codec;
pub mod error;
pub mod types;

pub use api::Api;
pub use error::{ApiError, Diagnostics};
pub use types::{
    AckResponse, CaptureRequest, CaptureResponse, CompareRequest, CompareResponse,
    ForceResetResponse, LedRequest, StatusResponse, TemplatesResponse,
};
