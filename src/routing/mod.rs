//! Routing module
//!
//! Route registration and query handling:
//! - Parameter descriptors and typed parameter values
//! - Query string parsing and casting
//! - The exact-match route table

mod param;
mod query;
mod table;

pub use param::{check_name, NameError, ParamDescriptor, ParamValue, Params};
pub use query::{cast_params, parse_query, CastError, MalformedQuery, RawQuery};
pub use table::{HandlerFn, RegistrationError, RouteEntry, RouteTable};
