//! # Backend RPC Layer
//!
//! Everything that talks to the financial backend: the JSON envelope
//! format, the signing strategies, the dispatching client, and the
//! normalization of backend error codes.

pub mod codes;
pub mod dispatcher;
pub mod envelope;
pub mod signing;

pub use codes::{normalize, ErrorDescriptor};
pub use dispatcher::SignedDispatcher;
pub use envelope::{RawRpcError, RpcOutcome, RpcRequest, RpcResponse};
pub use signing::{sign_bytes, RequestSigner, StaticEnvelopeSigner};
