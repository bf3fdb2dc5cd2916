//! Serializable payloads carried on the board broadcast hub and returned by
//! the admin snapshot operation.

pub mod board;
