//! HTTP DTOs for element endpoints.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::element::{
    ControlImplementation, ControlImplementationPurpose, DomainAssociation, Element, ElementRisk,
    ImplementationStatus, Origination, RequirementImplementation,
};
use crate::domain::foundation::{DomainId, ElementId, ElementType, Timestamp, UnitId};
use crate::ports::{PageRequest, SortColumn, SortDirection};

/// Element as rendered by the API. Only the properties its type supports
/// are present, so a response can be sent back unchanged on update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResponse {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub designator: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: UnitId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<BTreeSet<ElementId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<BTreeSet<ElementId>>,
    pub domains: BTreeMap<DomainId, DomainAssociation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risks: Option<Vec<ElementRisk>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_implementations: Option<Vec<ControlImplementation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_implementations: Option<Vec<RequirementImplementation>>,
    pub created_at: Timestamp,
    pub created_by: String,
    pub updated_at: Timestamp,
    pub updated_by: String,
    pub version: i64,
}

impl From<&Element> for ElementResponse {
    fn from(element: &Element) -> Self {
        let element_type = element.element_type();
        let composite = element_type.is_composite();
        let risk_affected = element_type.is_risk_affected();
        Self {
            id: element.id(),
            element_type,
            designator: element.designator().to_string(),
            name: element.name().to_string(),
            abbreviation: element.abbreviation().map(str::to_owned),
            description: element.description().map(str::to_owned),
            owner: element.owner(),
            parts: composite.then(|| element.parts().clone()),
            members: (!composite).then(|| element.members().clone()),
            domains: element.domains().clone(),
            risks: risk_affected.then(|| element.risks().to_vec()),
            control_implementations: risk_affected
                .then(|| element.control_implementations().to_vec()),
            requirement_implementations: risk_affected
                .then(|| element.requirement_implementations().to_vec()),
            created_at: *element.created_at(),
            created_by: element.created_by().to_string(),
            updated_at: *element.updated_at(),
            updated_by: element.updated_by().to_string(),
            version: element.version(),
        }
    }
}

/// Paging and sorting parameters shared by the list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub sort_by: Option<SortColumn>,
    #[serde(default)]
    pub sort_order: Option<SortDirection>,
}

impl PageParams {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
        .sorted_by(
            self.sort_by.unwrap_or_default(),
            self.sort_order.unwrap_or_default(),
        )
    }
}

/// Filters of `GET /elements`. List filters take comma separated values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementListParams {
    #[serde(default, rename = "type")]
    pub element_type: Option<String>,
    /// Comma separated element ids.
    #[serde(default, rename = "id")]
    pub ids: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub designator: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub has_child_elements: Option<bool>,
    #[serde(default)]
    pub has_parent_elements: Option<bool>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub sort_by: Option<SortColumn>,
    #[serde(default)]
    pub sort_order: Option<SortDirection>,
}

impl ElementListParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// Filters of the control implementation lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlImplementationParams {
    #[serde(default)]
    pub control: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl ControlImplementationParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            ..PageParams::default()
        }
    }
}

/// Parses a `purpose` parameter, case insensitive.
pub fn parse_purpose(raw: &str) -> Option<ControlImplementationPurpose> {
    [
        ControlImplementationPurpose::Mitigation,
        ControlImplementationPurpose::Compliance,
    ]
    .into_iter()
    .find(|p| p.as_str().eq_ignore_ascii_case(raw))
}

/// Body of `PUT /elements/:id/requirement-implementations/:control_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementImplementationRequest {
    #[serde(default)]
    pub status: ImplementationStatus,
    #[serde(default)]
    pub implementation_statement: Option<String>,
    #[serde(default)]
    pub origination: Origination,
    #[serde(default)]
    pub responsible: Option<ElementId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ClientId, UserId};

    fn element(element_type: ElementType) -> Element {
        Element::new(
            ElementId::new(),
            element_type,
            UnitId::new(),
            ClientId::new(),
            "Server",
            &UserId::new("alice").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn composite_elements_render_parts_only() {
        let json = serde_json::to_value(ElementResponse::from(&element(ElementType::Asset))).unwrap();

        assert_eq!(json["type"], "asset");
        assert!(json.get("parts").is_some());
        assert!(json.get("members").is_none());
        assert!(json.get("risks").is_some());
        assert!(json.get("elementType").is_none());
    }

    #[test]
    fn scopes_render_members_and_documents_no_risks() {
        let scope = serde_json::to_value(ElementResponse::from(&element(ElementType::Scope))).unwrap();
        assert!(scope.get("members").is_some());
        assert!(scope.get("parts").is_none());

        let document =
            serde_json::to_value(ElementResponse::from(&element(ElementType::Document))).unwrap();
        assert!(document.get("risks").is_none());
        assert!(document.get("controlImplementations").is_none());
    }

    #[test]
    fn page_params_default_to_first_page_by_name() {
        let page = PageParams::default().to_page_request();
        assert_eq!(page.page, 0);
        assert_eq!(page.size, PageRequest::DEFAULT_SIZE);
        assert_eq!(page.sort, SortColumn::Name);
    }

    #[test]
    fn list_params_read_camel_case_query_strings() {
        let uri: axum::http::Uri =
            "/elements?type=asset,process&subType=AST_IT&hasChildElements=true&sortBy=updatedAt&sortOrder=desc&size=5"
                .parse()
                .unwrap();
        let axum::extract::Query(params) =
            axum::extract::Query::<ElementListParams>::try_from_uri(&uri).unwrap();

        assert_eq!(params.element_type.as_deref(), Some("asset,process"));
        assert_eq!(params.sub_type.as_deref(), Some("AST_IT"));
        assert_eq!(params.has_child_elements, Some(true));
        let page = params.page_params().to_page_request();
        assert_eq!(page.sort, SortColumn::UpdatedAt);
        assert_eq!(page.direction, SortDirection::Desc);
        assert_eq!(page.size, 5);
    }

    #[test]
    fn purposes_parse_case_insensitively() {
        assert_eq!(parse_purpose("COMPLIANCE"), Some(ControlImplementationPurpose::Compliance));
        assert_eq!(parse_purpose("mitigation"), Some(ControlImplementationPurpose::Mitigation));
        assert_eq!(parse_purpose("other"), None);
    }
}
