//! Crate includes reusable utils shared by the t8n tooling.  Such as
//! initializing the tracing framework.

pub mod logging;
