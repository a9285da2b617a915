//! Integration tests against a live Neo4j instance.
//!
//! Run with a database available:
//!
//! ```text
//! NEO4J_URI=bolt://localhost:7687 NEO4J_USER=neo4j NEO4J_PASS=password \
//!     cargo test -p memberd-graph -- --ignored --test-threads=1
//! ```
//!
//! Single-threaded because the count assertions observe global state.

use uuid::Uuid;

use memberd_core::{AlternativeIdentifiers, Membership, MembershipRole, RwService, ServiceError};
use memberd_graph::{CypherRunner, GraphConfig, MembershipRepository, Statement};

async fn repository() -> MembershipRepository {
    let config = GraphConfig {
        uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".into()),
        user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
        password: std::env::var("NEO4J_PASS").unwrap_or_else(|_| "password".into()),
        ..GraphConfig::default()
    };
    let runner = CypherRunner::connect(&config)
        .await
        .expect("neo4j connection failed");
    let repo = MembershipRepository::new(runner);
    repo.initialise().await.expect("constraint setup failed");
    repo
}

async fn runner() -> CypherRunner {
    let config = GraphConfig {
        uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".into()),
        user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
        password: std::env::var("NEO4J_PASS").unwrap_or_else(|_| "password".into()),
        ..GraphConfig::default()
    };
    CypherRunner::connect(&config)
        .await
        .expect("neo4j connection failed")
}

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

fn fixture(uuid: &str) -> Membership {
    Membership {
        uuid: uuid.to_owned(),
        pref_label: Some("Chief Economist".into()),
        inception_date: Some("2008-06-23T00:00:00Z".into()),
        termination_date: Some("2011-02-17T00:00:00Z".into()),
        person_uuid: new_uuid(),
        organisation_uuid: new_uuid(),
        membership_roles: vec![MembershipRole {
            role_uuid: new_uuid(),
            inception_date: Some("2008-06-23T00:00:00Z".into()),
            termination_date: Some("2011-02-17T00:00:00Z".into()),
        }],
        alternative_identifiers: AlternativeIdentifiers {
            factset_identifier: Some(format!("fs-{uuid}")),
            uuids: vec![new_uuid(), new_uuid()],
        },
    }
}

/// True when a Thing node with this uuid is still physically present.
async fn thing_exists(runner: &CypherRunner, uuid: &str) -> bool {
    let rows = runner
        .fetch(Statement::new("MATCH (t:Thing {uuid: $uuid}) RETURN t.uuid AS uuid").param("uuid", uuid))
        .await
        .expect("probe query failed");
    !rows.is_empty()
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn round_trip_preserves_every_field() {
    let repo = repository().await;
    let uuid = new_uuid();
    let written = fixture(&uuid);

    repo.write(written.clone()).await.expect("write failed");

    let read = repo
        .read(&uuid)
        .await
        .expect("read failed")
        .expect("membership should be found");

    assert_eq!(read.uuid, written.uuid);
    assert_eq!(read.pref_label, written.pref_label);
    assert_eq!(read.inception_date, written.inception_date);
    assert_eq!(read.termination_date, written.termination_date);
    assert_eq!(read.person_uuid, written.person_uuid);
    assert_eq!(read.organisation_uuid, written.organisation_uuid);
    assert_eq!(read.membership_roles, written.membership_roles);
    assert_eq!(
        read.alternative_identifiers.factset_identifier,
        written.alternative_identifiers.factset_identifier
    );
    let mut read_uuids = read.alternative_identifiers.uuids.clone();
    let mut written_uuids = written.alternative_identifiers.uuids.clone();
    read_uuids.sort();
    written_uuids.sort();
    assert_eq!(read_uuids, written_uuids);

    repo.delete(&uuid).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn zero_roles_read_back_as_empty_list() {
    let repo = repository().await;
    let uuid = new_uuid();
    let mut membership = fixture(&uuid);
    membership.membership_roles = Vec::new();

    repo.write(membership).await.expect("write failed");

    let read = repo
        .read(&uuid)
        .await
        .expect("read failed")
        .expect("membership should be found");
    assert!(read.membership_roles.is_empty());

    repo.delete(&uuid).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn rewriting_replaces_roles_without_accumulation() {
    let repo = repository().await;
    let uuid = new_uuid();
    let mut membership = fixture(&uuid);
    repo.write(membership.clone()).await.expect("first write failed");

    let replacement_role = MembershipRole {
        role_uuid: new_uuid(),
        inception_date: None,
        termination_date: None,
    };
    membership.membership_roles = vec![replacement_role.clone()];
    repo.write(membership).await.expect("second write failed");

    let read = repo
        .read(&uuid)
        .await
        .expect("read failed")
        .expect("membership should be found");
    assert_eq!(read.membership_roles, vec![replacement_role]);

    repo.delete(&uuid).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn rewriting_replaces_identifiers_without_survivors() {
    let repo = repository().await;
    let uuid = new_uuid();
    let mut membership = fixture(&uuid);
    repo.write(membership.clone()).await.expect("first write failed");

    let set_b = AlternativeIdentifiers {
        factset_identifier: Some(format!("fs-b-{uuid}")),
        uuids: vec![new_uuid()],
    };
    membership.alternative_identifiers = set_b.clone();
    repo.write(membership).await.expect("second write failed");

    let read = repo
        .read(&uuid)
        .await
        .expect("read failed")
        .expect("membership should be found");
    assert_eq!(read.alternative_identifiers, set_b);

    repo.delete(&uuid).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn reading_an_absent_uuid_is_not_found() {
    let repo = repository().await;
    let read = repo.read(&new_uuid()).await.expect("read failed");
    assert!(read.is_none());
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn deleting_an_unwritten_uuid_reports_false() {
    let repo = repository().await;
    let deleted = repo.delete(&new_uuid()).await.expect("delete failed");
    assert!(!deleted);
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn deleting_a_membership_strips_it_and_removes_the_orphan() {
    let repo = repository().await;
    let runner = runner().await;
    let uuid = new_uuid();
    repo.write(fixture(&uuid)).await.expect("write failed");

    let deleted = repo.delete(&uuid).await.expect("delete failed");
    assert!(deleted);

    // No longer queryable as a membership.
    assert!(repo.read(&uuid).await.expect("read failed").is_none());
    // All edges this component created are gone, so the node is purged.
    assert!(!thing_exists(&runner, &uuid).await);
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn deleting_keeps_a_node_that_still_has_relationships() {
    let repo = repository().await;
    let runner = runner().await;
    let uuid = new_uuid();
    let anchor = new_uuid();
    repo.write(fixture(&uuid)).await.expect("write failed");

    // Attach a relationship this component does not own.
    runner
        .batch(vec![Statement::new(
            "MATCH (m:Thing {uuid: $uuid}) \
             MERGE (x:Thing {uuid: $anchor}) \
             MERGE (x)-[:MENTIONS]->(m)",
        )
        .param("uuid", uuid.as_str())
        .param("anchor", anchor.as_str())])
        .await
        .expect("anchor edge failed");

    let deleted = repo.delete(&uuid).await.expect("delete failed");
    assert!(deleted);

    // Stripped of its labels but still physically present.
    assert!(repo.read(&uuid).await.expect("read failed").is_none());
    assert!(thing_exists(&runner, &uuid).await);
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn a_bad_date_leaves_prior_state_untouched() {
    let repo = repository().await;
    let uuid = new_uuid();
    let good = fixture(&uuid);
    repo.write(good.clone()).await.expect("write failed");

    let mut bad = good.clone();
    bad.pref_label = Some("Should not land".into());
    bad.inception_date = Some("23 June 2008".into());
    let err = repo.write(bad).await.expect_err("bad date must be rejected");
    assert!(matches!(err, ServiceError::InvalidDate { .. }));

    let read = repo
        .read(&uuid)
        .await
        .expect("read failed")
        .expect("membership should be found");
    assert_eq!(read.pref_label, good.pref_label);
    assert_eq!(read.inception_date, good.inception_date);

    repo.delete(&uuid).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires neo4j"]
async fn count_tracks_first_writes_and_both_delete_branches() {
    let repo = repository().await;
    let runner = runner().await;

    let baseline = repo.count().await.expect("count failed");

    // First-time write of a new uuid adds one.
    let purged_uuid = new_uuid();
    repo.write(fixture(&purged_uuid)).await.expect("write failed");
    assert_eq!(repo.count().await.expect("count failed"), baseline + 1);

    // Branch one: delete removes the orphan physically.
    repo.delete(&purged_uuid).await.expect("delete failed");
    assert_eq!(repo.count().await.expect("count failed"), baseline);
    assert!(!thing_exists(&runner, &purged_uuid).await);

    // Branch two: a node with an external relationship survives physically
    // but stops counting once its membership label is stripped.
    let kept_uuid = new_uuid();
    repo.write(fixture(&kept_uuid)).await.expect("write failed");
    runner
        .batch(vec![Statement::new(
            "MATCH (m:Thing {uuid: $uuid}) \
             MERGE (x:Thing {uuid: $anchor}) \
             MERGE (x)-[:MENTIONS]->(m)",
        )
        .param("uuid", kept_uuid.as_str())
        .param("anchor", new_uuid())])
        .await
        .expect("anchor edge failed");

    repo.delete(&kept_uuid).await.expect("delete failed");
    assert_eq!(repo.count().await.expect("count failed"), baseline);
    assert!(thing_exists(&runner, &kept_uuid).await);
}
