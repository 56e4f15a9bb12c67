//! Sanitization pipeline.
//!
//! Wires the stages together: control-character strip → entity
//! normalization → comment/CDATA shielding → tokenizing and attribute
//! validation → tag balancing → unshielding.

pub mod attrs;
pub mod balancer;
pub mod tokenizer;
pub mod urls;

use crate::config::Config;
use crate::registry::IdRegistry;
use crate::spec::Specification;
use crate::{entities, shield};

/// Run the full pipeline over one input.
pub(crate) fn run(
    input: &str,
    config: &Config,
    spec: &Specification,
    registry: &mut dyn IdRegistry,
) -> String {
    let text = shield::strip_controls(input);
    let text = entities::normalize(&text, config.entity_mode);
    let text = shield::shield(&text, config);
    let tokens = tokenizer::tokenize(&text, config, spec, registry);
    let out = if config.balance {
        balancer::balance(&tokens, config)
    } else {
        balancer::serialize_stream(&tokens, config)
    };
    shield::unshield(&out)
}
