pub mod coordinator;
pub mod errors;
pub mod factory;
pub mod message;
pub mod messenger;
pub mod remote;

pub use coordinator::Coordinator;
pub use errors::AppError;
pub use factory::AppFactory;
pub use messenger::Messenger;
