//! Service layer: admin operations, the merged buzz/timeout event loop, the
//! timer contract, and the typed broadcast helpers.

pub mod admin_service;
pub mod board_events;
pub mod event_loop;
pub mod timer_service;
