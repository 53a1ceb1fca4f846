//! Zero-sized marker types.
//!
//! Embedding one of these as a field marks the enclosing struct with a role:
//!
//! ```rust,ignore
//! #[derive(Default, Bean)]
//! pub struct UserController {
//!     _controller: Controller,
//!     service: Autowired<UserService>,
//! }
//! ```

/// Holds factory methods; built beans of this role install their factories.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Configuration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Controller;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Middleware;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Router;

/// Collects entity types for the ORM collaborator instead of building them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Entities;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Testing;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Component;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Repository;

/// Parameter objects consumed by factory methods, populated from config.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Parameter;
