//! Configuration types deserialized from `revcost.toml`.

use revcost_common::SymInt;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// The top-level project configuration parsed from `revcost.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Expansion settings shared by every operation.
    #[serde(default)]
    pub costing: CostingConfig,
    /// Values for symbols used in operation parameters.
    #[serde(default)]
    pub bindings: BTreeMap<String, i64>,
    /// Named operation nodes to cost.
    #[serde(default)]
    pub ops: BTreeMap<String, OpConfig>,
}

/// Project metadata required in every `revcost.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// How far and how a call graph is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CostingConfig {
    /// Maximum expansion depth; absent means expand to elementary gates.
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Fetch callees of each level in parallel.
    #[serde(default)]
    pub parallel: bool,
    /// Generalizers applied to callees, in order.
    #[serde(default)]
    pub generalizers: Vec<GeneralizerName>,
}

/// Per-operation overrides of [`CostingConfig`]; absent fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CostingOverride {
    /// Overrides `max_depth`.
    pub max_depth: Option<usize>,
    /// Overrides `parallel`.
    pub parallel: Option<bool>,
    /// Replaces the generalizer list.
    pub generalizers: Option<Vec<GeneralizerName>>,
}

/// The built-in generalizers, by their kebab-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneralizerName {
    /// Drop register splits and joins.
    IgnoreSplitJoin,
    /// Drop ancilla allocation and release.
    IgnoreAllocFree,
    /// Drop every bookkeeping node.
    IgnoreBookkeeping,
    /// Replace every constant-adder constant with the symbol `k`.
    GeneralizeAddKConstant,
    /// Reset control values to all ones.
    GeneralizeCvs,
}

impl GeneralizerName {
    /// The name as written in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            GeneralizerName::IgnoreSplitJoin => "ignore-split-join",
            GeneralizerName::IgnoreAllocFree => "ignore-alloc-free",
            GeneralizerName::IgnoreBookkeeping => "ignore-bookkeeping",
            GeneralizerName::GeneralizeAddKConstant => "generalize-add-k-constant",
            GeneralizerName::GeneralizeCvs => "generalize-cvs",
        }
    }
}

impl fmt::Display for GeneralizerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[ops.<name>]` table: the node's parameters plus optional costing overrides.
#[derive(Debug, Deserialize)]
pub struct OpConfig {
    /// The node kind and its parameters.
    #[serde(flatten)]
    pub spec: OpSpec,
    /// Overrides of the global `[costing]` table.
    #[serde(default)]
    pub costing: CostingOverride,
}

/// Parameters of one operation node, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OpSpec {
    /// In-place adder.
    Add {
        /// Width of the preserved operand.
        a_bitwidth: Param,
        /// Width of the accumulator; defaults to `a_bitwidth`.
        #[serde(default)]
        b_bitwidth: Option<Param>,
        /// Two's-complement operands.
        #[serde(default)]
        signed: bool,
    },
    /// Out-of-place adder.
    OutOfPlaceAdder {
        /// Operand width.
        bitwidth: Param,
        /// Keep the carry-out bit.
        #[serde(default = "default_true")]
        include_carry_bit: bool,
        /// Use the uncomputing form.
        #[serde(default)]
        adjoint: bool,
    },
    /// Constant adder.
    AddK {
        /// Register width.
        bitwidth: Param,
        /// The constant.
        k: Param,
        /// Two's-complement register.
        #[serde(default)]
        signed: bool,
        /// Control values for the constant load.
        #[serde(default)]
        cvs: Vec<u8>,
    },
    /// GF(2^m) multiplier.
    #[serde(rename = "gf2-multiplication")]
    Gf2Multiplication {
        /// Field degree.
        bitsize: Param,
        /// Accumulate into `result` instead of producing it.
        #[serde(default)]
        plus_equal_prod: bool,
        /// Exponents of the modulus, e.g. `[4, 1, 0]`; must match the
        /// canonical polynomial when given.
        #[serde(default)]
        polynomial: Option<Vec<u32>>,
    },
}

fn default_true() -> bool {
    true
}

/// A parameter written either as an integer or as a symbol name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param(pub SymInt);

impl<'de> Deserialize<'de> for Param {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamVisitor;

        impl<'de> Visitor<'de> for ParamVisitor {
            type Value = Param;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an integer or a symbol name")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Param, E> {
                Ok(Param(SymInt::lit(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Param, E> {
                i64::try_from(v)
                    .map(|v| Param(SymInt::lit(v)))
                    .map_err(|_| E::custom(format!("{v} does not fit in 64 bits")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Param, E> {
                v.parse().map(Param).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ParamVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const HEADER: &str = "[project]\nname = \"t\"\n";

    #[test]
    fn params_accept_ints_and_symbols() {
        let toml = format!("{HEADER}\n[ops.a]\nkind = \"add\"\na_bitwidth = \"n\"\nb_bitwidth = 8\n");
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(
            config.ops["a"].spec,
            OpSpec::Add {
                a_bitwidth: Param(SymInt::symbol("n")),
                b_bitwidth: Some(Param(SymInt::lit(8))),
                signed: false,
            }
        );
    }

    #[test]
    fn bad_symbol_is_a_parse_error() {
        let toml = format!("{HEADER}\n[ops.a]\nkind = \"add\"\na_bitwidth = \"2n\"\n");
        assert!(load_config_from_str(&toml).is_err());
    }

    #[test]
    fn all_kinds() {
        let toml = format!(
            r#"{HEADER}
[ops.oop]
kind = "out-of-place-adder"
bitwidth = 4

[ops.k]
kind = "add-k"
bitwidth = 8
k = 5
cvs = [1, 0]

[ops.mul]
kind = "gf2-multiplication"
bitsize = "m"
plus_equal_prod = true
"#
        );
        let config = load_config_from_str(&toml).unwrap();
        assert!(matches!(
            config.ops["oop"].spec,
            OpSpec::OutOfPlaceAdder {
                include_carry_bit: true,
                adjoint: false,
                ..
            }
        ));
        assert!(matches!(&config.ops["k"].spec, OpSpec::AddK { cvs, .. } if cvs == &[1, 0]));
        assert!(matches!(
            config.ops["mul"].spec,
            OpSpec::Gf2Multiplication {
                plus_equal_prod: true,
                polynomial: None,
                ..
            }
        ));
    }

    #[test]
    fn generalizer_names() {
        let toml = format!(
            "{HEADER}\n[costing]\ngeneralizers = [\"ignore-split-join\", \"ignore-alloc-free\", \"ignore-bookkeeping\", \"generalize-add-k-constant\", \"generalize-cvs\"]\n"
        );
        let config = load_config_from_str(&toml).unwrap();
        let names: Vec<_> = config.costing.generalizers.iter().map(|g| g.as_str()).collect();
        assert_eq!(
            names,
            [
                "ignore-split-join",
                "ignore-alloc-free",
                "ignore-bookkeeping",
                "generalize-add-k-constant",
                "generalize-cvs"
            ]
        );
        let bad = format!("{HEADER}\n[costing]\ngeneralizers = [\"ignore-everything\"]\n");
        assert!(load_config_from_str(&bad).is_err());
    }

    #[test]
    fn unknown_kind_rejected() {
        let toml = format!("{HEADER}\n[ops.x]\nkind = \"multiply\"\nbitwidth = 4\n");
        assert!(load_config_from_str(&toml).is_err());
    }
}
