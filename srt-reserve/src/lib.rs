//! SRT seat reservation.
//!
//! Drives Chrome over the DevTools protocol to log in to the SRT booking
//! site, search for trains, and poll the results until a seat (or a
//! wait-list place) is reserved. An email is sent when that happens.

pub mod browser;
pub mod config;
pub mod domain;
pub mod notify;
pub mod reservation;
pub mod run;
pub mod session;
