// ── Remote service seam ──
//
// The engine talks to NetBox through exactly three verbs. `NetBoxClient`
// is the production implementation; unit tests use an in-memory fake.

use std::future::Future;

use nbsetup_api::{Collection, Error as ApiError, Filter, NetBoxClient, Record};
use serde_json::Value;

pub trait Remote {
    /// The single record matching `filter`, `None` when nothing matches,
    /// [`ApiError::Ambiguous`] when several do.
    fn lookup(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<Record>, ApiError>> + Send;

    /// Create all bodies in one call. A rejected batch creates nothing and
    /// yields [`ApiError::Validation`] with one entry per body.
    fn bulk_create(
        &self,
        collection: &Collection,
        bodies: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, ApiError>> + Send;

    fn delete(
        &self,
        collection: &Collection,
        id: u64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl Remote for NetBoxClient {
    fn lookup(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<Record>, ApiError>> + Send {
        NetBoxClient::lookup(self, collection, filter)
    }

    fn bulk_create(
        &self,
        collection: &Collection,
        bodies: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, ApiError>> + Send {
        NetBoxClient::bulk_create(self, collection, bodies)
    }

    fn delete(
        &self,
        collection: &Collection,
        id: u64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        NetBoxClient::delete(self, collection, id)
    }
}
