//! Client side of the remote inference service.

mod http;
mod types;

pub use http::HttpInferenceClient;
pub use types::{
    InferenceClient, InferenceError, ProcessReply, ProcessRequest, ResultReply, ResultRequest,
};
