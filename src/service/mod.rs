mod router;
mod services;
mod tests;

pub use router::get_router;
pub use services::{shutdown_signal, WebsiteService, ENV_PREFIX};
pub use tests::StubService;
