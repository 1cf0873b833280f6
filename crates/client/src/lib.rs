//! oEmbed client.
//!
//! This crate resolves resource URLs to oEmbed documents: an ordered
//! [`Registry`] picks the endpoint, `<link>` discovery covers sites without one,
//! and [`Endpoint`] performs the call through an [`HttpGateway`].

pub mod discovery;
pub mod endpoint;
pub mod gateway;
pub mod registry;

pub use discovery::{find_oembed_link, find_oembed_url};
pub use endpoint::{Endpoint, analyse_response, fetch};
pub use gateway::{HttpGateway, Method, RawResponse, ReqwestGateway, RequestParams, TransportInfo};
pub use registry::{Registry, RegistryEntry};

pub use oembed_core::{Error, OEmbed, OEmbedType, Params};
