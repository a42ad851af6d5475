//! # bigconf - load balancer configuration explorer
//!
//! Reads tmsh style configuration files (`bigip.conf`, `bigip_base.conf`, `bigip_gtm.conf`, ...) and turns them into
//! a searchable tree and into self-contained per-application bundles.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `bigconf` works internally.
//!
//! ### Configuration terms
//!
//! A configuration file is a list of root objects:
//! ```text
//! #TMSH-VERSION: 15.1.0
//!
//! ltm pool /Common/web_pool {
//!     load-balancing-mode round-robin
//!     members {
//!         /Common/10.0.0.1:80 {
//!             address 10.0.0.1
//!         }
//!     }
//!     monitor /Common/http
//! }
//! ltm node /Common/10.0.0.1 { address 10.0.0.1 }
//! ```
//!
//! - the **title** of an object is `category [subtype...] qualified-name` (`ltm pool /Common/web_pool`)
//! - the **qualified name** is `/partition[/folder...]/name`
//! - the **body** is everything between `{` and the matching `}`, indented by 4 spaces per level
//! - **script** objects (`ltm rule`, `gtm rule`, `pem irule`) carry a body in another language, it is never parsed
//!
//! ### Loading files
//!
//! [sources::ConfSources] stores the text of every loaded file together with its name and size. At this point
//! nothing is parsed.
//!
//! ### Parsing
//!
//! see [parser::parse_source]
//!
//! Every source is parsed on its own into a [tree::ConfigTree]. Values are [node::Node]s. Every object keeps its
//! verbatim body under the reserved [node::LINE] entry so declarations can be written back out
//! ([tree::declaration]).
//!
//! A source that does not parse (unbalanced braces) contributes nothing.
//!
//! ### Merging
//!
//! see [document::ConfDocument::load]
//!
//! Trees of all sources are unioned. Later sources win conflicting values.
//!
//! ### Resolving
//!
//! see [resolve]
//!
//! A virtual server or a wide IP record is followed to everything it references. The result is a bundle holding
//! copies of the referenced objects and the list of declarations needed to recreate it on another device.
//!
//! Where to look for each kind of reference is configurable, see [dialect::Dialect].
pub mod dialect;
pub mod document;
pub mod node;
pub mod parser;
mod patterns;
pub mod resolve;
pub mod sources;
pub mod tree;
mod util;
mod visit;
