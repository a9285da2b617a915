//! Membership repository
//!
//! Maps memberships onto the graph shape: a Concept/Membership-tagged
//! Thing node keyed by uuid, HAS_MEMBER / HAS_ORGANISATION / HAS_ROLE
//! edges to other Thing nodes, and identifier satellites attached via
//! IDENTIFIES edges.
//!
//! Writes fully replace owned edges and identifiers rather than diffing
//! old against new state; every write is a single read-free batch.

use async_trait::async_trait;
use neo4rs::Row;
use serde::Deserialize;
use tracing::debug;

use memberd_core::{
    AlternativeIdentifiers, DateProps, Membership, MembershipRole, Result, RwService, ServiceError,
};

use crate::labels::{Label, Rel};
use crate::runner::{CypherRunner, Statement};

/// Membership repository over the batch runner.
pub struct MembershipRepository {
    runner: CypherRunner,
}

impl MembershipRepository {
    pub fn new(runner: CypherRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl RwService for MembershipRepository {
    type Record = Membership;

    async fn initialise(&self) -> Result<()> {
        self.runner
            .ensure_constraints(&[
                (Label::Thing, "uuid"),
                (Label::Concept, "uuid"),
                (Label::Membership, "uuid"),
                (Label::FactsetIdentifier, "value"),
                (Label::UppIdentifier, "value"),
            ])
            .await
    }

    async fn read(&self, uuid: &str) -> Result<Option<Membership>> {
        let rows = self.runner.fetch(read_statement(uuid)).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        membership_from_row(row).map(Some)
    }

    async fn write(&self, membership: Membership) -> Result<()> {
        let statements = build_write_statements(&membership)?;
        debug!(
            uuid = %membership.uuid,
            statement_count = statements.len(),
            "writing membership"
        );
        self.runner.batch(statements).await?;
        Ok(())
    }

    async fn delete(&self, uuid: &str) -> Result<bool> {
        let outcomes = self
            .runner
            .batch(vec![
                clear_node_statement(uuid).returning(),
                remove_orphan_statement(uuid),
            ])
            .await?;

        // The flag reflects the clear statement only: the node existed and
        // carried at least one concept label. The orphan cleanup's outcome
        // is not part of the flag.
        let deleted = outcomes
            .first()
            .and_then(|rows| rows.first())
            .map(|row| row.get::<i64>("labelsRemoved").unwrap_or(0) > 0)
            .unwrap_or(false);
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64> {
        let rows = self.runner.fetch(count_statement()).await?;
        let count = rows
            .first()
            .map(|row| row.get::<i64>("c"))
            .transpose()
            .map_err(ServiceError::backend)?
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    async fn check(&self) -> Result<()> {
        self.runner.check().await
    }

    fn decode(&self, body: &[u8]) -> Result<(Membership, String)> {
        let membership: Membership = serde_json::from_slice(body)?;
        let uuid = membership.uuid.clone();
        Ok((membership, uuid))
    }
}

/// Assemble the full-replace write batch, in submission order:
/// identifier teardown, entity-edge teardown, identifier re-creation,
/// membership upsert, role-edge teardown, role re-creation.
///
/// Any unparseable date fails here, before anything reaches the runner.
fn build_write_statements(m: &Membership) -> Result<Vec<Statement>> {
    if m.uuid.is_empty() {
        return Err(ServiceError::MissingUuid);
    }

    let dates = DateProps::build(m.inception_date.as_deref(), m.termination_date.as_deref())?;

    let mut statements = vec![
        delete_identifiers_statement(&m.uuid),
        delete_entity_edges_statement(&m.uuid),
    ];

    if let Some(value) = &m.alternative_identifiers.factset_identifier {
        statements.push(create_identifier_statement(
            &m.uuid,
            Label::FactsetIdentifier,
            value,
        ));
    }
    for value in &m.alternative_identifiers.uuids {
        statements.push(create_identifier_statement(
            &m.uuid,
            Label::UppIdentifier,
            value,
        ));
    }

    statements.push(upsert_membership_statement(m, &dates));
    statements.push(delete_role_edges_statement(&m.uuid));

    for role in &m.membership_roles {
        let role_dates =
            DateProps::build(role.inception_date.as_deref(), role.termination_date.as_deref())?;
        statements.push(create_role_statement(&m.uuid, role, &role_dates));
    }

    Ok(statements)
}

/// Tear down every identifier satellite pointing at this uuid.
fn delete_identifiers_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (t:{thing} {{uuid: $uuid}}) \
         OPTIONAL MATCH (t)<-[iden:{identifies}]-(i) \
         DELETE iden, i",
        thing = Label::Thing,
        identifies = Rel::Identifies,
    ))
    .param("uuid", uuid)
}

/// Drop the member and organisation edges ahead of the upsert.
fn delete_entity_edges_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (m:{thing} {{uuid: $uuid}}) \
         OPTIONAL MATCH (:{thing})<-[rm:{has_member}]-(m) \
         OPTIONAL MATCH (:{thing})<-[ro:{has_organisation}]-(m) \
         DELETE rm, ro",
        thing = Label::Thing,
        has_member = Rel::HasMember,
        has_organisation = Rel::HasOrganisation,
    ))
    .param("uuid", uuid)
}

/// Create a fresh identifier satellite of the given type.
fn create_identifier_statement(uuid: &str, label: Label, value: &str) -> Statement {
    Statement::new(format!(
        "MERGE (t:{thing} {{uuid: $uuid}}) \
         CREATE (i:{identifier}:{label} {{value: $value}}) \
         MERGE (t)<-[:{identifies}]-(i)",
        thing = Label::Thing,
        identifier = Label::Identifier,
        identifies = Rel::Identifies,
        label = label,
    ))
    .param("uuid", uuid)
    .param("value", value)
}

/// Merge the membership and its person/organisation endpoints, recreate
/// both edges, and overwrite every scalar property on the node.
fn upsert_membership_statement(m: &Membership, dates: &DateProps) -> Statement {
    Statement::new(format!(
        "MERGE (m:{thing} {{uuid: $uuid}}) \
         MERGE (p:{thing} {{uuid: $personUuid}}) \
         MERGE (o:{thing} {{uuid: $organisationUuid}}) \
         CREATE (m)-[:{has_member}]->(p) \
         CREATE (m)-[:{has_organisation}]->(o) \
         SET m = {{uuid: $uuid, prefLabel: $prefLabel, \
           inceptionDate: $inceptionDate, inceptionDateEpoch: $inceptionDateEpoch, \
           terminationDate: $terminationDate, terminationDateEpoch: $terminationDateEpoch}} \
         SET m:{concept}:{membership}",
        thing = Label::Thing,
        concept = Label::Concept,
        membership = Label::Membership,
        has_member = Rel::HasMember,
        has_organisation = Rel::HasOrganisation,
    ))
    .param("uuid", m.uuid.as_str())
    .param("personUuid", m.person_uuid.as_str())
    .param("organisationUuid", m.organisation_uuid.as_str())
    .param("prefLabel", m.pref_label.clone())
    .param("inceptionDate", dates.inception_date.clone())
    .param("inceptionDateEpoch", dates.inception_epoch)
    .param("terminationDate", dates.termination_date.clone())
    .param("terminationDateEpoch", dates.termination_epoch)
}

/// Drop every role edge ahead of re-creation.
fn delete_role_edges_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (m:{thing} {{uuid: $uuid}}) \
         OPTIONAL MATCH (:{thing})<-[rr:{has_role}]-(m) \
         DELETE rr",
        thing = Label::Thing,
        has_role = Rel::HasRole,
    ))
    .param("uuid", uuid)
}

/// Merge the role endpoint and attach a fresh dated role edge.
fn create_role_statement(uuid: &str, role: &MembershipRole, dates: &DateProps) -> Statement {
    Statement::new(format!(
        "MERGE (m:{thing} {{uuid: $uuid}}) \
         MERGE (r:{thing} {{uuid: $roleUuid}}) \
         CREATE (m)-[rel:{has_role}]->(r) \
         SET rel = {{inceptionDate: $inceptionDate, inceptionDateEpoch: $inceptionDateEpoch, \
           terminationDate: $terminationDate, terminationDateEpoch: $terminationDateEpoch}}",
        thing = Label::Thing,
        has_role = Rel::HasRole,
    ))
    .param("uuid", uuid)
    .param("roleUuid", role.role_uuid.as_str())
    .param("inceptionDate", dates.inception_date.clone())
    .param("inceptionDateEpoch", dates.inception_epoch)
    .param("terminationDate", dates.termination_date.clone())
    .param("terminationDateEpoch", dates.termination_epoch)
}

/// Match a membership with its required organisation edge, plus optional
/// person, role and identifier context, collapsed to a single row.
fn read_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (m:{membership} {{uuid: $uuid}})-[:{has_organisation}]->(o:{thing}) \
         OPTIONAL MATCH (p:{thing})<-[:{has_member}]-(m) \
         OPTIONAL MATCH (r:{thing})<-[rr:{has_role}]-(m) \
         OPTIONAL MATCH (upp:{upp})-[:{identifies}]->(m) \
         OPTIONAL MATCH (fs:{factset})-[:{identifies}]->(m) \
         WITH p, m, o, upp, fs, \
           collect({{roleuuid: r.uuid, inceptionDate: rr.inceptionDate, terminationDate: rr.terminationDate}}) AS membershipRoles \
         RETURN m.uuid AS uuid, \
           m.prefLabel AS prefLabel, \
           m.inceptionDate AS inceptionDate, \
           m.terminationDate AS terminationDate, \
           o.uuid AS organisationUuid, \
           p.uuid AS personUuid, \
           membershipRoles, \
           {{uuids: collect(DISTINCT upp.value), factsetIdentifier: fs.value}} AS alternativeIdentifiers",
        membership = Label::Membership,
        thing = Label::Thing,
        upp = Label::UppIdentifier,
        factset = Label::FactsetIdentifier,
        has_organisation = Rel::HasOrganisation,
        has_member = Rel::HasMember,
        has_role = Rel::HasRole,
        identifies = Rel::Identifies,
    ))
    .param("uuid", uuid)
}

fn count_statement() -> Statement {
    Statement::new(format!(
        "MATCH (n:{membership}) RETURN count(n) AS c",
        membership = Label::Membership,
    ))
}

/// Strip the concept labels, reset properties to the bare uuid, and drop
/// the owned edges. Captures how many concept labels the node carried
/// before the strip, so the caller can compute the deleted flag.
fn clear_node_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (m:{thing} {{uuid: $uuid}}) \
         OPTIONAL MATCH (m)-[prel:{has_member}]->(:{thing}) \
         OPTIONAL MATCH (m)-[orel:{has_organisation}]->(:{thing}) \
         OPTIONAL MATCH (:{thing})<-[rrel:{has_role}]-(m) \
         WITH m, \
           collect(DISTINCT prel) + collect(DISTINCT orel) + collect(DISTINCT rrel) AS rels, \
           size([l IN labels(m) WHERE l IN ['{concept}', '{membership}']]) AS tagged \
         FOREACH (rel IN rels | DELETE rel) \
         REMOVE m:{concept}:{membership} \
         SET m = {{uuid: $uuid}} \
         RETURN tagged AS labelsRemoved",
        thing = Label::Thing,
        concept = Label::Concept,
        membership = Label::Membership,
        has_member = Rel::HasMember,
        has_organisation = Rel::HasOrganisation,
        has_role = Rel::HasRole,
    ))
    .param("uuid", uuid)
}

/// Physically remove the node, but only once nothing points at it.
fn remove_orphan_statement(uuid: &str) -> Statement {
    Statement::new(format!(
        "MATCH (m:{thing} {{uuid: $uuid}}) \
         OPTIONAL MATCH (m)-[a]-(x) \
         WITH m, count(a) AS relCount \
         WHERE relCount = 0 \
         DELETE m",
        thing = Label::Thing,
    ))
    .param("uuid", uuid)
}

/// One collected role entry as the read query returns it.
#[derive(Debug, Deserialize)]
struct RoleRow {
    roleuuid: Option<String>,
    #[serde(rename = "inceptionDate")]
    inception_date: Option<String>,
    #[serde(rename = "terminationDate")]
    termination_date: Option<String>,
}

/// Aggregated identifier bindings as the read query returns them.
#[derive(Debug, Default, Deserialize)]
struct IdentifiersRow {
    #[serde(default)]
    uuids: Vec<String>,
    #[serde(rename = "factsetIdentifier")]
    factset_identifier: Option<String>,
}

fn membership_from_row(row: &Row) -> Result<Membership> {
    let roles: Vec<RoleRow> = row.get("membershipRoles").map_err(ServiceError::backend)?;
    let identifiers: IdentifiersRow = row
        .get("alternativeIdentifiers")
        .map_err(ServiceError::backend)?;

    Ok(Membership {
        uuid: row.get("uuid").map_err(ServiceError::backend)?,
        pref_label: row.get("prefLabel").map_err(ServiceError::backend)?,
        inception_date: row.get("inceptionDate").map_err(ServiceError::backend)?,
        termination_date: row.get("terminationDate").map_err(ServiceError::backend)?,
        organisation_uuid: row
            .get("organisationUuid")
            .map_err(ServiceError::backend)?,
        person_uuid: row
            .get::<Option<String>>("personUuid")
            .map_err(ServiceError::backend)?
            .unwrap_or_default(),
        membership_roles: normalize_roles(roles),
        alternative_identifiers: AlternativeIdentifiers {
            factset_identifier: identifiers.factset_identifier,
            uuids: identifiers.uuids,
        },
    })
}

/// The read query's outer join materializes "no roles" as one placeholder
/// entry with a null roleuuid; collapse that to an empty list.
fn normalize_roles(rows: Vec<RoleRow>) -> Vec<MembershipRole> {
    if rows.len() == 1 && rows[0].roleuuid.as_deref().unwrap_or("").is_empty() {
        return Vec::new();
    }
    rows.into_iter()
        .map(|row| MembershipRole {
            role_uuid: row.roleuuid.unwrap_or_default(),
            inception_date: row.inception_date,
            termination_date: row.termination_date,
        })
        .collect()
}
