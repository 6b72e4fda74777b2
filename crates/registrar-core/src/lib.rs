//! Registrar Core Types and Definitions
//!
//! This crate provides the foundational types shared by every stage of the
//! Registrar pipeline. It includes:
//!
//! - **Provenance**: Location chains recorded for every value ([`provenance`] module)
//! - **Type references**: The `Name`, `Name?`, `Name[]`, `Name[]?` grammar ([`type_ref`] module)
//! - **Builtin types**: Primitive type table with literal and default rendering ([`builtin_types`] module)
//! - **Identifiers**: Identifier, namespace and interface-name rules ([`identifier`] module)
//! - **Raw model**: Permissive DTOs mirroring the YAML literally ([`raw`] module)
//! - **Canonical model**: Strict, invariant-checked DTOs ([`canonical`] module)

pub mod builtin_types;
pub mod canonical;
pub mod identifier;
pub mod provenance;
pub mod raw;
pub mod type_ref;
