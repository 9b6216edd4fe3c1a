//! Lookup services that resolve a name query into district or school records.

pub mod nces;

use crate::error::LookupError;
use crate::model::{DistrictRecord, SchoolRecord};
use futures::future::BoxFuture;

pub type LookupResult<T> = Result<Vec<T>, LookupError>;

/// Remote source of district and school records.
///
/// Futures are boxed so the service can be shared behind `Arc<dyn LookupService>`
/// and driven from spawned tasks.
pub trait LookupService: Send + Sync {
    fn search_districts<'a>(&'a self, query: &'a str) -> BoxFuture<'a, LookupResult<DistrictRecord>>;

    fn search_schools<'a>(
        &'a self,
        query: &'a str,
        district_id: Option<&'a str>,
    ) -> BoxFuture<'a, LookupResult<SchoolRecord>>;
}
