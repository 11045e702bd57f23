mod orquestrator;
mod tracing;

pub use orquestrator::ServicesOrquestrator;
