//! Shared state of the REST API.

use std::future::Future;
use std::sync::Arc;

use crate::application::handlers::client::DeleteClientHandler;
use crate::application::handlers::compliance::{
    GetControlImplementationsHandler, GetRequirementImplementationHandler,
    ListRequirementImplementationsHandler, UpdateRequirementImplementationHandler,
};
use crate::application::handlers::domain::{
    CreateDomainHandler, ElementStatusCountHandler, GetDomainHandler, GetElementSchemaHandler,
    ListDomainsHandler, MigrateDomainHandler, UpdateDomainContentHandler,
};
use crate::application::handlers::element::{
    CreateElementHandler, DeleteElementHandler, EvaluateElementHandler, GetElementHandler,
    QueryElementsHandler, UpdateElementHandler,
};
use crate::application::handlers::unit::{
    CreateUnitHandler, DeleteUnitHandler, GetUnitHandler, ListUnitsHandler, UpdateUnitHandler,
};
use crate::application::ETagSalt;
use crate::domain::foundation::VeoError;
use crate::ports::{
    ClientRepository, DomainRepository, ElementRepository, ElementSchemaValidator,
    EventPublisher, Repositories, TransactionManager, UnitRepository,
};

/// Ports every route module builds its use case handlers from.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub domains: Arc<dyn DomainRepository>,
    pub elements: Arc<dyn ElementRepository>,
    pub validator: Arc<dyn ElementSchemaValidator>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub transactions: Arc<dyn TransactionManager>,
    pub salt: ETagSalt,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        validator: Arc<dyn ElementSchemaValidator>,
        transactions: Arc<dyn TransactionManager>,
        salt: ETagSalt,
    ) -> Self {
        Self {
            clients: repositories.clients,
            units: repositories.units,
            domains: repositories.domains,
            elements: repositories.elements,
            validator,
            event_publisher: repositories.event_publisher,
            transactions,
            salt,
        }
    }

    /// Copy of this state whose repositories belong to a unit of work.
    fn scoped(&self, repositories: &Repositories) -> AppState {
        AppState {
            clients: repositories.clients.clone(),
            units: repositories.units.clone(),
            domains: repositories.domains.clone(),
            elements: repositories.elements.clone(),
            event_publisher: repositories.event_publisher.clone(),
            ..self.clone()
        }
    }

    /// Runs `f` in a unit of work and commits if it succeeds.
    ///
    /// On error nothing is committed, including the events `f` published.
    pub async fn transaction<T, F, Fut>(&self, f: F) -> Result<T, VeoError>
    where
        F: FnOnce(AppState) -> Fut + Send,
        Fut: Future<Output = Result<T, VeoError>> + Send,
        T: Send,
    {
        let uow = self.transactions.begin().await?;
        let value = f(self.scoped(uow.repositories())).await?;
        uow.commit().await?;
        Ok(value)
    }

    // Units

    pub fn create_unit_handler(&self) -> CreateUnitHandler {
        CreateUnitHandler::new(
            self.clients.clone(),
            self.units.clone(),
            self.domains.clone(),
            self.event_publisher.clone(),
            self.salt.clone(),
        )
    }

    pub fn get_unit_handler(&self) -> GetUnitHandler {
        GetUnitHandler::new(self.units.clone(), self.salt.clone())
    }

    pub fn list_units_handler(&self) -> ListUnitsHandler {
        ListUnitsHandler::new(self.units.clone())
    }

    pub fn update_unit_handler(&self) -> UpdateUnitHandler {
        UpdateUnitHandler::new(
            self.units.clone(),
            self.domains.clone(),
            self.event_publisher.clone(),
            self.salt.clone(),
        )
    }

    pub fn delete_unit_handler(&self) -> DeleteUnitHandler {
        DeleteUnitHandler::new(
            self.units.clone(),
            self.elements.clone(),
            self.event_publisher.clone(),
        )
    }

    // Domains

    pub fn list_domains_handler(&self) -> ListDomainsHandler {
        ListDomainsHandler::new(self.domains.clone())
    }

    pub fn get_domain_handler(&self) -> GetDomainHandler {
        GetDomainHandler::new(self.domains.clone())
    }

    pub fn element_schema_handler(&self) -> GetElementSchemaHandler {
        GetElementSchemaHandler::new(self.domains.clone())
    }

    pub fn element_status_count_handler(&self) -> ElementStatusCountHandler {
        ElementStatusCountHandler::new(
            self.domains.clone(),
            self.units.clone(),
            self.elements.clone(),
        )
    }

    pub fn migrate_domain_handler(&self) -> MigrateDomainHandler {
        MigrateDomainHandler::new(
            self.domains.clone(),
            self.units.clone(),
            self.elements.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn create_domain_handler(&self) -> CreateDomainHandler {
        CreateDomainHandler::new(
            self.clients.clone(),
            self.domains.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn update_domain_content_handler(&self) -> UpdateDomainContentHandler {
        UpdateDomainContentHandler::new(self.domains.clone(), self.event_publisher.clone())
    }

    pub fn evaluate_element_handler(&self) -> EvaluateElementHandler {
        EvaluateElementHandler::new(
            self.units.clone(),
            self.domains.clone(),
            self.elements.clone(),
            self.validator.clone(),
        )
    }

    // Elements

    pub fn create_element_handler(&self) -> CreateElementHandler {
        CreateElementHandler::new(
            self.units.clone(),
            self.domains.clone(),
            self.elements.clone(),
            self.validator.clone(),
            self.event_publisher.clone(),
            self.salt.clone(),
        )
    }

    pub fn get_element_handler(&self) -> GetElementHandler {
        GetElementHandler::new(self.units.clone(), self.elements.clone(), self.salt.clone())
    }

    pub fn query_elements_handler(&self) -> QueryElementsHandler {
        QueryElementsHandler::new(self.elements.clone())
    }

    pub fn update_element_handler(&self) -> UpdateElementHandler {
        UpdateElementHandler::new(
            self.units.clone(),
            self.domains.clone(),
            self.elements.clone(),
            self.validator.clone(),
            self.event_publisher.clone(),
            self.salt.clone(),
        )
    }

    pub fn delete_element_handler(&self) -> DeleteElementHandler {
        DeleteElementHandler::new(
            self.units.clone(),
            self.elements.clone(),
            self.event_publisher.clone(),
        )
    }

    // Compliance

    pub fn control_implementations_handler(&self) -> GetControlImplementationsHandler {
        GetControlImplementationsHandler::new(
            self.units.clone(),
            self.domains.clone(),
            self.elements.clone(),
        )
    }

    pub fn list_requirement_implementations_handler(&self) -> ListRequirementImplementationsHandler {
        ListRequirementImplementationsHandler::new(self.units.clone(), self.elements.clone())
    }

    pub fn get_requirement_implementation_handler(&self) -> GetRequirementImplementationHandler {
        GetRequirementImplementationHandler::new(
            self.units.clone(),
            self.elements.clone(),
            self.salt.clone(),
        )
    }

    pub fn update_requirement_implementation_handler(
        &self,
    ) -> UpdateRequirementImplementationHandler {
        UpdateRequirementImplementationHandler::new(
            self.units.clone(),
            self.elements.clone(),
            self.event_publisher.clone(),
            self.salt.clone(),
        )
    }

    // Administration

    pub fn delete_client_handler(&self) -> DeleteClientHandler {
        DeleteClientHandler::new(
            self.clients.clone(),
            self.units.clone(),
            self.domains.clone(),
            self.elements.clone(),
            self.event_publisher.clone(),
        )
    }
}
