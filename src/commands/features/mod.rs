pub(super) mod errors;
pub(super) mod health;
pub(super) mod session;
