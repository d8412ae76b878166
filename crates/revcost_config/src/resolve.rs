//! Operation resolution: building nodes and merging costing settings.

use crate::error::ConfigError;
use crate::types::{CostingConfig, CostingOverride, OpSpec, Param, ProjectConfig};
use revcost_common::{Bindings, SymInt};
use revcost_ir::{Add, AddK, Bloq, ConfigurationError, GF2Multiplication, OutOfPlaceAdder};

/// A named operation with its node built and its costing settings merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOp {
    /// The operation name.
    pub name: String,
    /// The node, with bound symbols substituted.
    pub bloq: Bloq,
    /// Global costing settings overlaid with the operation's overrides.
    pub costing: CostingConfig,
}

/// Resolves one named operation.
///
/// Symbols listed in `[bindings]` are substituted before the node is built;
/// unbound symbols stay symbolic.
pub fn resolve_op(config: &ProjectConfig, name: &str) -> Result<ResolvedOp, ConfigError> {
    let op = config
        .ops
        .get(name)
        .ok_or_else(|| ConfigError::UnknownOp(name.to_string()))?;
    let bindings: Bindings = config.bindings.iter().map(|(k, v)| (k.clone(), *v)).collect();
    let bloq = build_bloq(&op.spec, &bindings).map_err(|source| ConfigError::InvalidOp {
        op: name.to_string(),
        source,
    })?;
    Ok(ResolvedOp {
        name: name.to_string(),
        bloq,
        costing: merge_costing(&config.costing, &op.costing),
    })
}

/// Resolves every operation, in name order.
pub fn resolve_all(config: &ProjectConfig) -> Result<Vec<ResolvedOp>, ConfigError> {
    config.ops.keys().map(|name| resolve_op(config, name)).collect()
}

/// Overlays an operation's overrides on the global settings.
pub fn merge_costing(global: &CostingConfig, over: &CostingOverride) -> CostingConfig {
    CostingConfig {
        max_depth: over.max_depth.or(global.max_depth),
        parallel: over.parallel.unwrap_or(global.parallel),
        generalizers: over.generalizers.clone().unwrap_or_else(|| global.generalizers.clone()),
    }
}

/// Builds the node an [`OpSpec`] describes.
pub fn build_bloq(spec: &OpSpec, bindings: &Bindings) -> Result<Bloq, ConfigurationError> {
    let bind = |p: &Param| -> SymInt { p.0.subs(bindings) };
    Ok(match spec {
        OpSpec::Add {
            a_bitwidth,
            b_bitwidth,
            signed,
        } => {
            let a = bind(a_bitwidth);
            let b = b_bitwidth.as_ref().map_or_else(|| a.clone(), bind);
            Bloq::Add(Add::new(a, b)?.with_signed(*signed)?)
        }
        OpSpec::OutOfPlaceAdder {
            bitwidth,
            include_carry_bit,
            adjoint,
        } => {
            let oop = OutOfPlaceAdder::new(bind(bitwidth))?.with_carry_bit(*include_carry_bit);
            Bloq::OutOfPlaceAdder(if *adjoint { oop.adjoint() } else { oop })
        }
        OpSpec::AddK {
            bitwidth,
            k,
            signed,
            cvs,
        } => Bloq::AddK(AddK::controlled(bind(bitwidth), bind(k), *signed, cvs.clone())?),
        OpSpec::Gf2Multiplication {
            bitsize,
            plus_equal_prod,
            polynomial,
        } => Bloq::GF2Multiplication(match polynomial {
            Some(exponents) => {
                let poly = exponents.iter().fold(0u128, |acc, &e| acc | 1u128 << e);
                GF2Multiplication::with_polynomial(bind(bitsize), *plus_equal_prod, poly)?
            }
            None => GF2Multiplication::new(bind(bitsize), *plus_equal_prod)?,
        }),
    })
}
