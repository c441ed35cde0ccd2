pub mod traits;

// Collaborator implementations
pub mod assets;
pub mod http_backend;
