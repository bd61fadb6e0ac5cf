//! HTTP DTOs for domain endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::domain::ContentSaved;
use crate::application::MigrationOutcome;
use crate::domain::foundation::DomainId;

/// Body of `POST /content-creation/domains`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainRequest {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub authority: String,
}

/// Outcome message of the content endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub message: String,
}

impl ContentResponse {
    pub fn created_domain(id: DomainId) -> Self {
        Self {
            success: true,
            resource_id: Some(id.to_string()),
            message: "Domain created successfully.".to_string(),
        }
    }

    pub fn saved(what: &str, saved: ContentSaved) -> Self {
        let verb = match saved {
            ContentSaved::Created => "created",
            ContentSaved::Replaced => "updated",
            ContentSaved::Removed => "deleted",
        };
        Self {
            success: true,
            resource_id: None,
            message: format!("{} {}", what, verb),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCountParams {
    pub unit: String,
}

/// Selects what `POST /domains/:id/evaluation` evaluates.
///
/// With `element` the stored element is evaluated and the body is ignored.
/// Otherwise the body is an unsaved element of `type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationParams {
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default, rename = "type")]
    pub element_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum MigrationResponse {
    #[serde(rename = "MIGRATED")]
    Migrated {
        #[serde(rename = "oldDomain")]
        old_domain: DomainId,
        #[serde(rename = "migratedElements")]
        migrated_elements: usize,
    },
    #[serde(rename = "SKIPPED")]
    Skipped,
}

impl From<MigrationOutcome> for MigrationResponse {
    fn from(outcome: MigrationOutcome) -> Self {
        match outcome {
            MigrationOutcome::Migrated {
                old_domain_id,
                migrated_elements,
            } => MigrationResponse::Migrated {
                old_domain: old_domain_id,
                migrated_elements,
            },
            MigrationOutcome::Skipped => MigrationResponse::Skipped,
        }
    }
}
