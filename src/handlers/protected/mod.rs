// handlers/protected/mod.rs - Protected handlers (session required)
//
// Each handler validates its input first, then calls the auth guard, then
// touches the store. A request with missing fields never reaches the store.

pub mod contacts;
pub mod discussions;
pub mod problems;
pub mod profile;
pub mod session;
pub mod solutions;
