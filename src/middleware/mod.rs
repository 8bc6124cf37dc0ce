//! Built-in middleware.
//!
//! Each unit here is an ordinary [`Middleware`](crate::Middleware) and
//! composes like any route handler:
//!
//! - [`Static`] — serves files from a directory under a url prefix

mod static_files;

pub use static_files::Static;
