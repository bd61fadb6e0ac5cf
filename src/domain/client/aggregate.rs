//! Client aggregate - the tenant owning units and domains.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ClientId, ClientOwned, DomainError, DomainId, ErrorCode, StateMachine, Timestamp,
};

/// Lifecycle of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientState {
    Created,
    Activated,
    Deactivated,
    Deleted,
}

impl ClientState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientState::Created => "CREATED",
            ClientState::Activated => "ACTIVATED",
            ClientState::Deactivated => "DEACTIVATED",
            ClientState::Deleted => "DELETED",
        }
    }
}

impl std::str::FromStr for ClientState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(ClientState::Created),
            "ACTIVATED" => Ok(ClientState::Activated),
            "DEACTIVATED" => Ok(ClientState::Deactivated),
            "DELETED" => Ok(ClientState::Deleted),
            other => Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Unknown client state '{}'", other),
            )),
        }
    }
}

impl StateMachine for ClientState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ClientState::*;
        matches!(
            (self, target),
            (Created, Activated)
                | (Deactivated, Activated)
                | (Activated, Deactivated)
                | (Deactivated, Deleted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ClientState::*;
        match self {
            Created => vec![Activated],
            Activated => vec![Deactivated],
            Deactivated => vec![Activated, Deleted],
            Deleted => vec![],
        }
    }
}

/// Kind of change announced by the subscription service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientChangeType {
    Creation,
    Activation,
    Deactivation,
    Deletion,
    Modification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    name: String,
    state: ClientState,
    max_units: Option<u32>,
    domains: Vec<DomainId>,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Client {
    /// Create a client in state `Created`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if name is empty
    pub fn new(id: ClientId, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "Client name cannot be empty"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id,
            name,
            state: ClientState::Created,
            max_units: None,
            domains: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ClientId,
        name: String,
        state: ClientState,
        max_units: Option<u32>,
        domains: Vec<DomainId>,
        version: i64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            state,
            max_units,
            domains,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn with_max_units(mut self, max_units: Option<u32>) -> Self {
        self.max_units = max_units;
        self
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn max_units(&self) -> Option<u32> {
        self.max_units
    }

    pub fn domains(&self) -> &[DomainId] {
        &self.domains
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        self.transition(ClientState::Activated)
    }

    pub fn deactivate(&mut self) -> Result<(), DomainError> {
        self.transition(ClientState::Deactivated)
    }

    pub fn mark_deleted(&mut self) -> Result<(), DomainError> {
        self.transition(ClientState::Deleted)
    }

    /// Applies a lifecycle change. `Creation` is never valid on an existing
    /// client.
    ///
    /// # Errors
    ///
    /// - `IllegalStateTransition` if the change is not allowed in the
    ///   current state
    pub fn apply_change(&mut self, change: ClientChangeType) -> Result<(), DomainError> {
        match change {
            ClientChangeType::Creation => Err(DomainError::new(
                ErrorCode::IllegalStateTransition,
                format!("Client {} already exists", self.id),
            )),
            ClientChangeType::Activation => self.activate(),
            ClientChangeType::Deactivation => self.deactivate(),
            ClientChangeType::Deletion => self.mark_deleted(),
            ClientChangeType::Modification => {
                if self.state == ClientState::Deleted {
                    Err(DomainError::new(
                        ErrorCode::IllegalStateTransition,
                        format!("Client {} is deleted", self.id),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn set_max_units(&mut self, max_units: Option<u32>) {
        self.max_units = max_units;
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "Client name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }

    /// True if another unit may be created given the current count.
    pub fn can_create_unit(&self, current_units: usize) -> bool {
        self.max_units
            .map_or(true, |max| current_units < max as usize)
    }

    pub fn add_domain(&mut self, domain: DomainId) {
        if !self.domains.contains(&domain) {
            self.domains.push(domain);
        }
    }

    pub fn remove_domain(&mut self, domain: &DomainId) {
        self.domains.retain(|d| d != domain);
    }

    fn transition(&mut self, target: ClientState) -> Result<(), DomainError> {
        self.state = self.state.transition_to(target)?;
        Ok(())
    }

    /// Records a modification, bumping the version. Called once per
    /// persisted change.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Timestamp::now();
    }
}

impl ClientOwned for Client {
    fn owning_client(&self) -> Option<ClientId> {
        Some(self.id)
    }

    fn resource_id(&self) -> String {
        self.id.to_string()
    }
}
