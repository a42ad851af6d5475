//! [ConfigTree] to self-contained bundles
//!
//! A bundle is one root object (a virtual server or a wide IP) plus everything it references, both as deep
//! copies of the referenced objects and as the reconstructed source text needed to recreate it elsewhere.
//!
//! References that cannot be resolved are skipped. Partial exports routinely reference built-in objects
//! (`/Common/http`, `/Common/tcp`, ...) that are not part of any file.
mod gslb;
mod virtual_server;

pub use gslb::{resolve_wideip, resolve_wideips, GslbBundle};
pub use virtual_server::{resolve_virtual_server, resolve_virtual_servers, AppBundle};

use serde::Serialize;

/// Reconstructed source fragments in discovery order, without repeats
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fragments(Vec<String>);

impl Fragments {
    pub fn push(&mut self, fragment: String) {
        if !self.0.contains(&fragment) {
            self.0.push(fragment);
        }
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}
