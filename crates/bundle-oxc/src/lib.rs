//! Default `bundle-core` collaborators built on the `oxc_*` crates: a
//! transform-only [`FrontEnd`](bundle_core::frontend::FrontEnd) and an
//! [`oxc_minifier`]-backed [`Minifier`](bundle_core::minifier::Minifier).
//!
//! Neither is mandatory — anything implementing those traits can replace
//! them — but together they make the workspace runnable end-to-end
//! without a proprietary compiler binding.

pub mod front_end;
pub mod minifier;

pub use front_end::OxcFrontEnd;
pub use minifier::OxcMinifier;
