use nbsetup_api::{Collection, Error as ApiError, Filter, Record};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Candidate, CheckKey};
use crate::remote::Remote;

/// Candidates split by whether NetBox already holds them.
#[derive(Debug, Default)]
pub struct Partition {
    pub not_existing: Vec<Candidate>,
    /// Identities of the records already present.
    pub existing: Vec<String>,
}

/// One lookup per candidate, keyed by `key`. A candidate without a usable
/// key is passed on for create, where NetBox reports what is missing.
pub async fn check<R: Remote>(
    remote: &R,
    collection: &Collection,
    key: &CheckKey,
    candidates: Vec<Candidate>,
) -> Result<Partition, CoreError> {
    let mut partition = Partition::default();
    for candidate in candidates {
        let present = match key.filter_for(&candidate) {
            Some(filter) => exists(remote, collection, &filter).await?,
            None => false,
        };
        if present {
            partition.existing.push(candidate.identity(key));
        } else {
            partition.not_existing.push(candidate);
        }
    }
    Ok(partition)
}

/// Whether any record matches. Several matches count as present.
pub(crate) async fn exists<R: Remote>(
    remote: &R,
    collection: &Collection,
    filter: &Filter,
) -> Result<bool, CoreError> {
    match remote.lookup(collection, filter).await {
        Ok(found) => Ok(found.is_some()),
        Err(ApiError::Ambiguous { .. }) => Ok(true),
        Err(e) if e.is_recoverable() => {
            debug!(%collection, %filter, error = %e, "lookup rejected, treating as absent");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Outcome of a lookup that has to pin down one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup<T> {
    Found(T),
    Absent,
    /// This many records match.
    Ambiguous(u64),
}

impl<T> Lookup<T> {
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::Absent => Lookup::Absent,
            Self::Ambiguous(count) => Lookup::Ambiguous(count),
        }
    }

    pub(crate) fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Look up the single record matching `filter`. A rejected filter reads as
/// absent.
pub(crate) async fn lookup_one<R: Remote>(
    remote: &R,
    collection: &Collection,
    filter: &Filter,
) -> Result<Lookup<Record>, CoreError> {
    match remote.lookup(collection, filter).await {
        Ok(Some(record)) => Ok(Lookup::Found(record)),
        Ok(None) => Ok(Lookup::Absent),
        Err(ApiError::Ambiguous { count, .. }) => Ok(Lookup::Ambiguous(count)),
        Err(e) if e.is_recoverable() => {
            debug!(%collection, %filter, error = %e, "lookup rejected, treating as absent");
            Ok(Lookup::Absent)
        }
        Err(e) => Err(e.into()),
    }
}

/// The single record matching `filter`, for callers where several matches
/// mean the same as none.
pub(crate) async fn find_record<R: Remote>(
    remote: &R,
    collection: &Collection,
    filter: &Filter,
) -> Result<Option<Record>, CoreError> {
    Ok(lookup_one(remote, collection, filter).await?.found())
}

pub(crate) async fn find_id<R: Remote>(
    remote: &R,
    collection: &Collection,
    filter: &Filter,
) -> Result<Option<u64>, CoreError> {
    Ok(find_record(remote, collection, filter)
        .await?
        .map(|record| record.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::object;
    use crate::testing::FakeRemote;

    fn tenant(name: &str) -> Candidate {
        Candidate::new(object(json!({"name": name, "slug": name.to_lowercase()})))
    }

    #[tokio::test]
    async fn partitions_by_presence() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::TENANTS, json!({"name": "Acme", "slug": "acme"}));

        let partition = check(
            &remote,
            &Collection::TENANTS,
            &CheckKey::Field("name"),
            vec![tenant("Acme"), tenant("Globex")],
        )
        .await
        .unwrap();

        assert_eq!(partition.existing, vec!["Acme".to_owned()]);
        assert_eq!(partition.not_existing, vec![tenant("Globex")]);
    }

    #[tokio::test]
    async fn idempotent_against_unchanged_remote() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::TENANTS, json!({"name": "Acme", "slug": "acme"}));
        let candidates = vec![tenant("Acme"), tenant("Globex")];

        let first = check(&remote, &Collection::TENANTS, &CheckKey::Field("name"), candidates.clone())
            .await
            .unwrap();
        let second = check(&remote, &Collection::TENANTS, &CheckKey::Field("name"), candidates)
            .await
            .unwrap();

        assert_eq!(first.existing, second.existing);
        assert_eq!(first.not_existing, second.not_existing);
        assert_eq!(remote.created_count(&Collection::TENANTS), 0);
    }

    #[tokio::test]
    async fn slug_key_reports_name_and_slug() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::LOCATIONS, json!({"name": "Hall 1", "slug": "hall_1"}));
        let hall = Candidate::new(object(json!({"name": "Hall 1", "slug": "hall_1"})));

        let partition = check(&remote, &Collection::LOCATIONS, &CheckKey::Slug, vec![hall])
            .await
            .unwrap();
        assert_eq!(partition.existing, vec!["Hall 1 (hall_1)".to_owned()]);
    }

    #[tokio::test]
    async fn ambiguous_match_counts_as_present() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::VLANS, json!({"name": "data", "vid": 10}));
        remote.seed(&Collection::VLANS, json!({"name": "data", "vid": 20}));

        let vlan = Candidate::new(object(json!({"name": "data"})));
        let partition = check(&remote, &Collection::VLANS, &CheckKey::Field("name"), vec![vlan])
            .await
            .unwrap();
        assert_eq!(partition.existing, vec!["data".to_owned()]);
    }

    #[tokio::test]
    async fn single_lookup_tells_absent_from_ambiguous() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::VLAN_GROUPS, json!({"name": "Core", "slug": "dc1_core"}));
        remote.seed(&Collection::VLAN_GROUPS, json!({"name": "Core", "slug": "dc2_core"}));

        let core = lookup_one(&remote, &Collection::VLAN_GROUPS, &Filter::by("name", "Core"))
            .await
            .unwrap();
        let edge = lookup_one(&remote, &Collection::VLAN_GROUPS, &Filter::by("name", "Edge"))
            .await
            .unwrap();

        assert_eq!(core.map(|record| record.id), Lookup::Ambiguous(2));
        assert_eq!(edge.map(|record| record.id), Lookup::Absent);
    }

    #[tokio::test]
    async fn server_failure_is_fatal() {
        let remote = FakeRemote::new();
        remote.fail_lookups(&Collection::TENANTS, 500);

        let err = check(&remote, &Collection::TENANTS, &CheckKey::Field("name"), vec![tenant("Acme")])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }), "{err:?}");
    }
}
