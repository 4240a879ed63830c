//! Network-first fetching with a cached fallback.

use std::fmt::Display;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::NetworkClass;

/// A fetched value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub from_cache: bool,
}

#[derive(Error, Debug, PartialEq)]
pub enum FetchError<E> {
    /// The fetch failed for connectivity reasons and nothing was cached.
    #[error("No internet connection and no cached data available")]
    OfflineNoCache(#[source] E),

    /// The fetch failed for a reason a cached copy must not hide.
    #[error(transparent)]
    Remote(E),
}

impl<E> FetchError<E> {
    /// The error returned by the fetch function.
    pub fn source_error(&self) -> &E {
        match self {
            FetchError::OfflineNoCache(e) | FetchError::Remote(e) => e,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, FetchError::OfflineNoCache(_))
    }
}

/// Run `fetch`; on success refresh the cache through `write_cache`, on a
/// network-class failure fall back to `read_cache`.
///
/// Errors that are not network-class are returned as `FetchError::Remote`
/// without consulting the cache. `write_cache` is best effort and cannot
/// fail the call. There is no de-duplication of concurrent fetches.
pub async fn fetch_with_cache<T, E, F, Fut, W, WFut, R, RFut>(
    fetch: F,
    write_cache: W,
    read_cache: R,
) -> Result<Fetched<T>, FetchError<E>>
where
    E: NetworkClass + Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    W: FnOnce(&T) -> WFut,
    WFut: Future<Output = ()>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Option<T>>,
{
    match fetch().await {
        Ok(data) => {
            write_cache(&data).await;
            Ok(Fetched {
                data,
                from_cache: false,
            })
        }
        Err(e) if e.is_network() => match read_cache().await {
            Some(data) => {
                warn!(error = %e, "Network error, serving cached data");
                Ok(Fetched {
                    data,
                    from_cache: true,
                })
            }
            None => {
                warn!(error = %e, "Network error and nothing cached");
                Err(FetchError::OfflineNoCache(e))
            }
        },
        Err(e) => {
            debug!(error = %e, "Fetch failed, not eligible for cache fallback");
            Err(FetchError::Remote(e))
        }
    }
}
