//! http_packet: route registration, query casting and request dispatch on top of hyper.
//!
//! Routes are registered in a [`routing::RouteTable`], composed with an
//! optional static-file mount by [`handler::HandlerComposer`], and served by
//! [`server::run`].

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;

pub use config::Config;
pub use handler::{compose, BuildError, DispatchError, HandlerComposer, ServerConfiguration};
pub use http::Reply;
pub use routing::{ParamDescriptor, ParamValue, Params, RegistrationError, RouteTable};
