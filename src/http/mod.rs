//! HTTP protocol layer module
//!
//! Response builders, handler replies, and the helpers static serving needs.
//! Nothing here knows about routes.

pub mod cache;
pub mod mime;
pub mod reply;
pub mod response;

pub use reply::Reply;
pub use response::{
    build_301_response, build_304_response, build_400_response, build_404_response,
    build_413_response, build_500_response, build_501_response,
};
