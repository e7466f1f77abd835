//! Custom inheritance rules
//!
//! Rules run after all layers are merged. Each one is gated by an optional
//! condition, targets a set of sections, and applies one action to the items
//! sharing its condition tags:
//!
//! | action      | effect on matching items                                  |
//! |-------------|-----------------------------------------------------------|
//! | `merge`     | items with the same target collapse into one              |
//! | `replace`   | named fields are overwritten                              |
//! | `transform` | a registered transform rewrites each item                 |
//! | `validate`  | items missing properties or failing a validator are dropped |

mod engine;

pub use engine::RuleEngine;
