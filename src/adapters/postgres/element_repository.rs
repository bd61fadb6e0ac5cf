//! PostgreSQL implementation of ElementRepository.
//!
//! Elements are JSONB documents. The columns next to `data` exist for
//! lookups: ownership, type, domain membership, and the reverse indexes
//! `referenced_ids` (everything the element points at) and `child_ids`
//! (parts and members).

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::element::Element;
use crate::domain::foundation::{ClientId, DomainError, DomainId, ElementId, ElementType, UnitId};
use crate::ports::{
    ElementQuery, ElementRepository, PageRequest, PagedResult, SortColumn, SortDirection,
};

use super::{missed_update, PgSession, db_error, not_found};

#[derive(Clone)]
pub struct PostgresElementRepository {
    session: PgSession,
}

impl PostgresElementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_session(PgSession::pooled(pool))
    }

    pub fn with_session(session: PgSession) -> Self {
        Self { session }
    }

    async fn fetch(&self, sql: &str, id: Uuid) -> Result<Vec<Element>, DomainError> {
        let rows: Vec<(Json<Element>,)> = sqlx::query_as(sql)
            .bind(id)
            .fetch_all(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch elements"))?;
        Ok(rows.into_iter().map(|(Json(e),)| e).collect())
    }
}

/// Lookup columns derived from the aggregate.
struct Indexed {
    domain_ids: Vec<Uuid>,
    referenced_ids: Vec<Uuid>,
    child_ids: Vec<Uuid>,
}

impl Indexed {
    fn of(element: &Element) -> Self {
        Self {
            domain_ids: element.domains().keys().map(|d| *d.as_uuid()).collect(),
            referenced_ids: element.referenced_elements().iter().map(|e| *e.as_uuid()).collect(),
            child_ids: element
                .parts()
                .iter()
                .chain(element.members().iter())
                .map(|e| *e.as_uuid())
                .collect(),
        }
    }
}

/// `%needle%` for ILIKE, with the pattern characters of `needle` escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_contains(b: &mut QueryBuilder<'static, Postgres>, column: &str, needle: &Option<String>) {
    if let Some(needle) = needle {
        b.push(format!(" AND {} ILIKE ", column));
        b.push_bind(like_pattern(needle));
    }
}

/// WHERE clause mirroring `ElementQuery::matches` plus the parent and
/// scope filters.
fn push_filters(b: &mut QueryBuilder<'static, Postgres>, client_id: ClientId, query: &ElementQuery) {
    b.push(" WHERE e.client_id = ");
    b.push_bind(*client_id.as_uuid());

    if let Some(units) = &query.units {
        b.push(" AND e.owner_id = ANY(");
        b.push_bind(units.iter().map(|u| *u.as_uuid()).collect::<Vec<Uuid>>());
        b.push(")");
    }
    if let Some(types) = &query.element_types {
        b.push(" AND e.element_type = ANY(");
        b.push_bind(types.iter().map(|t| t.singular_term().to_string()).collect::<Vec<String>>());
        b.push(")");
    }
    if let Some(ids) = &query.ids {
        b.push(" AND e.id = ANY(");
        b.push_bind(ids.iter().map(|id| *id.as_uuid()).collect::<Vec<Uuid>>());
        b.push(")");
    }
    if query.domain.is_some() || query.sub_type.is_some() || query.status.is_some() {
        b.push(" AND EXISTS (SELECT 1 FROM jsonb_each(e.data->'domains') AS d(key, value) WHERE TRUE");
        if let Some(domain) = &query.domain {
            b.push(" AND d.key = ");
            b.push_bind(domain.to_string());
        }
        if let Some(sub_type) = &query.sub_type {
            b.push(" AND d.value->>'subType' = ");
            b.push_bind(sub_type.clone());
        }
        if let Some(status) = &query.status {
            b.push(" AND d.value->>'status' = ");
            b.push_bind(status.clone());
        }
        b.push(")");
    }
    if let Some(has_children) = query.has_child_elements {
        b.push(if has_children {
            " AND cardinality(e.child_ids) > 0"
        } else {
            " AND cardinality(e.child_ids) = 0"
        });
    }
    if let Some(has_parents) = query.has_parent_elements {
        b.push(if has_parents { " AND EXISTS" } else { " AND NOT EXISTS" });
        b.push(" (SELECT 1 FROM elements p WHERE p.client_id = e.client_id AND e.id = ANY(p.child_ids))");
    }
    if let Some(scope) = &query.scope {
        b.push(" AND EXISTS (SELECT 1 FROM elements s WHERE s.client_id = e.client_id AND s.id = ");
        b.push_bind(*scope.as_uuid());
        b.push(" AND e.id = ANY(s.child_ids))");
    }

    push_contains(
        b,
        "concat_ws(' ', e.designator, e.data->>'abbreviation', e.name)",
        &query.display_name,
    );
    push_contains(b, "e.name", &query.name);
    push_contains(b, "COALESCE(e.data->>'abbreviation', '')", &query.abbreviation);
    push_contains(b, "COALESCE(e.data->>'description', '')", &query.description);
    push_contains(b, "e.designator", &query.designator);
    push_contains(b, "e.data->>'updatedBy'", &query.updated_by);
}

fn count_matching(client_id: ClientId, query: &ElementQuery) -> QueryBuilder<'static, Postgres> {
    let mut b = QueryBuilder::new("SELECT COUNT(*) FROM elements e");
    push_filters(&mut b, client_id, query);
    b
}

/// Same order as `PageRequest::order`: the sort column, then the id.
fn select_page(
    client_id: ClientId,
    query: &ElementQuery,
    page: &PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut b = QueryBuilder::new("SELECT e.data FROM elements e");
    push_filters(&mut b, client_id, query);
    let direction = match page.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    let keys: &[&str] = match page.sort {
        SortColumn::Name => &["lower(e.name)"],
        SortColumn::Designator => &[
            "regexp_replace(e.designator, '-[^-]*$', '')",
            "COALESCE(substring(e.designator from '-([0-9]+)$')::bigint, 0)",
        ],
        SortColumn::UpdatedAt => &["e.updated_at"],
    };
    b.push(" ORDER BY ");
    for key in keys {
        b.push(format!("{} {}, ", key, direction));
    }
    b.push(format!("e.id {}", direction));
    b.push(" LIMIT ");
    b.push_bind(i64::from(page.size));
    b.push(" OFFSET ");
    b.push_bind(page.offset() as i64);
    b
}

#[async_trait]
impl ElementRepository for PostgresElementRepository {
    async fn save(&self, element: &Element) -> Result<(), DomainError> {
        let indexed = Indexed::of(element);
        sqlx::query(
            r#"
            INSERT INTO elements (
                id, client_id, owner_id, element_type, designator, name,
                domain_ids, referenced_ids, child_ids, data, version, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(element.id().as_uuid())
        .bind(element.client_id().as_uuid())
        .bind(element.owner().as_uuid())
        .bind(element.element_type().singular_term())
        .bind(element.designator())
        .bind(element.name())
        .bind(indexed.domain_ids)
        .bind(indexed.referenced_ids)
        .bind(indexed.child_ids)
        .bind(Json(element))
        .bind(element.version())
        .bind(element.updated_at().as_datetime())
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("insert element"))?;
        Ok(())
    }

    async fn update(&self, element: &Element) -> Result<(), DomainError> {
        let indexed = Indexed::of(element);
        let mut conn = self.session.conn().await?;
        let result = sqlx::query(
            r#"
            UPDATE elements SET
                owner_id = $2, designator = $3, name = $4, domain_ids = $5,
                referenced_ids = $6, child_ids = $7, data = $8, version = $9,
                updated_at = $10
            WHERE id = $1 AND version = $9 - 1
            "#,
        )
        .bind(element.id().as_uuid())
        .bind(element.owner().as_uuid())
        .bind(element.designator())
        .bind(element.name())
        .bind(indexed.domain_ids)
        .bind(indexed.referenced_ids)
        .bind(indexed.child_ids)
        .bind(Json(element))
        .bind(element.version())
        .bind(element.updated_at().as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(db_error("update element"))?;

        if result.rows_affected() == 0 {
            let id = *element.id().as_uuid();
            return Err(missed_update(&mut conn, "elements", "Element", id, element.version()).await);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ElementId) -> Result<Option<Element>, DomainError> {
        let row: Option<(Json<Element>,)> = sqlx::query_as("SELECT data FROM elements WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch element"))?;
        Ok(row.map(|(Json(e),)| e))
    }

    async fn find_by_ids(&self, ids: &BTreeSet<ElementId>) -> Result<Vec<Element>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<(Json<Element>,)> = sqlx::query_as("SELECT data FROM elements WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch elements by ids"))?;
        Ok(rows.into_iter().map(|(Json(e),)| e).collect())
    }

    async fn find_by_unit(&self, unit_id: &UnitId) -> Result<Vec<Element>, DomainError> {
        self.fetch("SELECT data FROM elements WHERE owner_id = $1", *unit_id.as_uuid())
            .await
    }

    async fn find_by_domain(
        &self,
        client_id: &ClientId,
        domain: &DomainId,
    ) -> Result<Vec<Element>, DomainError> {
        let rows: Vec<(Json<Element>,)> = sqlx::query_as(
            "SELECT data FROM elements WHERE client_id = $1 AND $2 = ANY(domain_ids)",
        )
        .bind(client_id.as_uuid())
        .bind(domain.as_uuid())
        .fetch_all(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("fetch elements by domain"))?;
        Ok(rows.into_iter().map(|(Json(e),)| e).collect())
    }

    async fn query(
        &self,
        query: &ElementQuery,
        page: PageRequest,
    ) -> Result<PagedResult<Element>, DomainError> {
        let Some(client_id) = query.client_id else {
            return Ok(page.apply(Vec::new()));
        };
        let mut conn = self.session.conn().await?;
        let (total,): (i64,) = count_matching(client_id, query)
            .build_query_as()
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("count elements"))?;
        let rows: Vec<(Json<Element>,)> = select_page(client_id, query, &page)
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("query elements"))?;
        Ok(PagedResult {
            items: rows.into_iter().map(|(Json(e),)| e).collect(),
            total: total.max(0) as u64,
            page: page.page,
            size: page.size,
        })
    }

    async fn find_referencing(&self, target: &ElementId) -> Result<Vec<Element>, DomainError> {
        self.fetch(
            "SELECT data FROM elements WHERE $1 = ANY(referenced_ids) AND id <> $1",
            *target.as_uuid(),
        )
        .await
    }

    async fn find_composites_of(&self, part: &ElementId) -> Result<Vec<Element>, DomainError> {
        self.fetch("SELECT data FROM elements WHERE $1 = ANY(child_ids)", *part.as_uuid())
            .await
    }

    async fn next_designator(
        &self,
        client_id: &ClientId,
        element_type: ElementType,
    ) -> Result<u64, DomainError> {
        let (value,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO designator_sequences (client_id, element_type, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (client_id, element_type)
            DO UPDATE SET last_value = designator_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(client_id.as_uuid())
        .bind(element_type.singular_term())
        .fetch_one(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("allocate designator"))?;
        Ok(value.max(1) as u64)
    }

    async fn delete(&self, id: &ElementId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM elements WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("delete element"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Element", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_and_pages_in_sql() {
        let client = ClientId::new();
        let query = ElementQuery {
            units: Some([UnitId::new()].into_iter().collect()),
            element_types: Some([ElementType::Asset].into_iter().collect()),
            domain: Some(DomainId::new()),
            sub_type: Some("AST_IT".into()),
            ids: Some([ElementId::new()].into_iter().collect()),
            name: Some("server".into()),
            ..ElementQuery::for_client(client)
        };
        let page = PageRequest::new(2, 25).sorted_by(SortColumn::UpdatedAt, SortDirection::Desc);

        let select = select_page(client, &query, &page);
        let sql = select.sql();

        assert!(sql.starts_with("SELECT e.data FROM elements e WHERE e.client_id = $1"));
        assert!(sql.contains("e.owner_id = ANY($2)"));
        assert!(sql.contains("e.element_type = ANY($3)"));
        assert!(sql.contains("e.id = ANY($4)"));
        assert!(sql.contains("d.key = $5 AND d.value->>'subType' = $6"));
        assert!(sql.contains("e.name ILIKE $7"));
        assert!(sql.ends_with("ORDER BY e.updated_at DESC, e.id DESC LIMIT $8 OFFSET $9"));
    }

    #[test]
    fn count_uses_same_filters_without_paging() {
        let client = ClientId::new();
        let query = ElementQuery {
            has_parent_elements: Some(false),
            scope: Some(ElementId::new()),
            ..ElementQuery::for_client(client)
        };

        let count = count_matching(client, &query);
        let sql = count.sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM elements e WHERE e.client_id = $1"));
        assert!(sql.contains("AND NOT EXISTS (SELECT 1 FROM elements p"));
        assert!(sql.contains("s.id = $2 AND e.id = ANY(s.child_ids)"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }
}
