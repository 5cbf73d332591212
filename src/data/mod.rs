//! Provider adapters and the normalization routines they share.

pub mod banxico;
pub mod fred;
pub mod markets;
pub mod normalize;
pub mod period;
pub mod yoy;

pub use banxico::{BanxicoApi, BanxicoClient};
pub use fred::{FredApi, FredClient};
pub use markets::{MarketApi, MarketGroup, YahooClient};

use reqwest::blocking::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::SourceError;

/// Send a request and decode a JSON body, mapping failures onto the taxonomy.
pub(crate) fn get_json<T: DeserializeOwned>(req: RequestBuilder, provider: &'static str) -> Result<T, SourceError> {
    let resp = req.send().map_err(|e| SourceError::transport(provider, e))?;

    if !resp.status().is_success() {
        return Err(SourceError::Status {
            provider,
            status: resp.status().as_u16(),
        });
    }

    resp.json::<T>().map_err(|e| SourceError::decode(provider, e))
}
