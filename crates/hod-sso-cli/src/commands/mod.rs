//! Command handlers grouped by concern.

pub(crate) mod authenticate;
pub(crate) mod logout;
