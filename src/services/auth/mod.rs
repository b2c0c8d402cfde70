pub mod credentials;
pub mod gate;
pub mod password;

pub use gate::AuthGate;
pub use password::DigestPasswordBackend;
