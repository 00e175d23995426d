//! Homepage widgets rendered against an abstract page.
//!
//! # Submodules
//!
//! - [`dom`]: The [`Dom`](dom::Dom) trait and the in-memory [`MemoryDom`](dom::MemoryDom)
//! - [`fetch`]: Cache-busted, no-store fetching of the site's data files
//! - [`embed`]: Lazy-singleton loader for Instagram's embed script
//! - [`feed`]: The Instagram feed renderer
//! - [`rotator`]: Gallery slide loader and rotation controller
//!
//! Widgets never return errors. Network and data problems end up as a
//! static message or a hidden section, and are logged.

pub mod dom;
pub mod embed;
pub mod feed;
pub mod fetch;
pub mod rotator;
