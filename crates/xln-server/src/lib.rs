pub mod error;
pub mod ingress;
pub mod observer;
pub mod orchestrator;
pub mod server;

pub use error::ServerError;
pub use ingress::Ingress;
pub use observer::ObserverEvent;
pub use orchestrator::PaymentOrchestrator;
pub use server::Server;
