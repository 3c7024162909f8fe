//! Collaborator implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in brewkeeper-core:
//!
//! - Gravity tracking (rolling hourly history with stability detection)

#![no_std]
#![deny(unsafe_code)]

pub mod gravity;
