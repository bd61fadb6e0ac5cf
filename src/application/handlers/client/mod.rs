//! Client lifecycle use cases.

mod delete_client;
mod handle_client_change;

pub use delete_client::{DeleteClientCommand, DeleteClientHandler};
pub use handle_client_change::{ClientChangeCommand, HandleClientChangeHandler};
