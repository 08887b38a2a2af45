// Keytran Rule File Parser - TOML with Serde
// Builds Transforms tables from source-form rule files

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::rules::element::{Element, ElementList};
use crate::rules::engine::Transforms;
use crate::rules::reorder::{ReorderEntry, ReorderGroup};
use crate::rules::transform::{TransformEntry, TransformGroup};
use crate::uset::UnicodeSet;

/// Rule file errors
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("unknown set reference: [{0}]")]
    UnknownSet(String),

    #[error("set [{0}] has no members")]
    EmptySet(String),

    #[error("bad set member or range: {0:?}")]
    BadRange(String),

    #[error("bad element spec {0:?}: expected a single char or a [set] reference")]
    BadElement(String),

    #[error("transform rule {0} has an empty `from` pattern")]
    EmptyPattern(usize),

    #[error("reorder rule {0} has an empty `from` pattern")]
    EmptyElements(usize),

    #[error("reorder rule {rule}: `{list}` has {got} values, expected 0, 1, or {expected}")]
    WeightCountMismatch {
        rule: usize,
        list: &'static str,
        got: usize,
        expected: usize,
    },
}

/// A parsed rule file: named character sets plus rule groups in source
/// order. This is the source-form equivalent of a compiled rule table;
/// `build` turns it into a ready [`Transforms`] engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    /// Named character classes, referenced from reorder elements as
    /// `"[name]"`. Members are single chars or `"a-b"` inclusive ranges.
    #[serde(default)]
    pub sets: IndexMap<String, Vec<String>>,

    /// Rule groups in declaration order.
    #[serde(default)]
    pub groups: Vec<GroupToml>,
}

/// One rule group in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GroupToml {
    Transform { rules: Vec<TransformRuleToml> },
    Reorder { rules: Vec<ReorderRuleToml> },
}

/// A `from`/`to` substitution rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformRuleToml {
    pub from: String,
    pub to: String,
    /// Marks an `error="fail"` rule; carried through as entry metadata.
    #[serde(default)]
    pub error: bool,
}

/// A reorder rule: element specs plus parallel weight lists.
///
/// Weight lists may be empty (defaults), hold a single value (broadcast to
/// every element, as in the source format), or hold one value per element.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderRuleToml {
    pub from: Vec<String>,
    #[serde(default)]
    pub order: Vec<i8>,
    #[serde(default)]
    pub tertiary: Vec<i8>,
    #[serde(default)]
    pub tertiary_base: Vec<bool>,
    #[serde(default)]
    pub prebase: Vec<bool>,
    #[serde(default)]
    pub before: Vec<String>,
}

impl RuleFile {
    /// Parse a rule file from TOML text.
    pub fn from_str(text: &str) -> Result<Self, RuleError> {
        toml::from_str(text).map_err(|e| RuleError::TomlParse(e.to_string()))
    }

    /// Read and parse a rule file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Resolve sets and build the rule table, feeding groups to the
    /// [`Transforms`] builder in declaration order.
    pub fn build(&self) -> Result<Transforms, RuleError> {
        let sets = self.resolve_sets()?;
        let mut transforms = Transforms::new();

        for group in &self.groups {
            match group {
                GroupToml::Transform { rules } => {
                    let mut group = TransformGroup::default();
                    for (i, rule) in rules.iter().enumerate() {
                        if rule.from.is_empty() {
                            return Err(RuleError::EmptyPattern(i));
                        }
                        group.push(
                            TransformEntry::new(&rule.from, &rule.to).with_error(rule.error),
                        );
                    }
                    transforms.add_transform_group(group);
                }
                GroupToml::Reorder { rules } => {
                    let mut group = ReorderGroup::default();
                    for (i, rule) in rules.iter().enumerate() {
                        group.push(build_reorder_entry(rule, i, &sets)?);
                    }
                    transforms.add_reorder_group(group);
                }
            }
        }

        log::debug!(
            "built rule table: {} groups, {} named sets",
            transforms.len(),
            sets.len()
        );
        Ok(transforms)
    }

    fn resolve_sets(&self) -> Result<IndexMap<String, UnicodeSet>, RuleError> {
        let mut resolved = IndexMap::with_capacity(self.sets.len());
        for (name, members) in &self.sets {
            if members.is_empty() {
                return Err(RuleError::EmptySet(name.clone()));
            }
            let mut ranges = Vec::with_capacity(members.len());
            for member in members {
                let (lo, hi) = parse_member(member)?;
                ranges.push((lo as u32, hi as u32));
            }
            resolved.insert(name.clone(), UnicodeSet::new(ranges));
        }
        Ok(resolved)
    }
}

/// Parse one set member: a single char, or an inclusive `"a-b"` range.
fn parse_member(spec: &str) -> Result<(char, char), RuleError> {
    let cs: Vec<char> = spec.chars().collect();
    match cs.len() {
        1 => Ok((cs[0], cs[0])),
        3 if cs[1] == '-' && cs[0] <= cs[2] => Ok((cs[0], cs[2])),
        _ => Err(RuleError::BadRange(spec.to_string())),
    }
}

/// Parse one element spec: a literal char, or a `"[name]"` set reference.
fn parse_element_spec(
    spec: &str,
    sets: &IndexMap<String, UnicodeSet>,
) -> Result<Element, RuleError> {
    if let Some(name) = spec.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let set = sets
            .get(name)
            .ok_or_else(|| RuleError::UnknownSet(name.to_string()))?;
        return Ok(Element::from_set(set.clone()));
    }
    let mut it = spec.chars();
    match (it.next(), it.next()) {
        (Some(ch), None) => Ok(Element::from_char(ch)),
        _ => Err(RuleError::BadElement(spec.to_string())),
    }
}

fn check_weights<T>(
    rule: usize,
    list: &[T],
    name: &'static str,
    expected: usize,
) -> Result<(), RuleError> {
    match list.len() {
        0 | 1 => Ok(()),
        n if n == expected => Ok(()),
        n => Err(RuleError::WeightCountMismatch {
            rule,
            list: name,
            got: n,
            expected,
        }),
    }
}

/// One weight for element `i`: default, broadcast single value, or the
/// per-element value.
fn weight_at<T: Copy + Default>(list: &[T], i: usize) -> T {
    match list.len() {
        0 => T::default(),
        1 => list[0],
        _ => list[i],
    }
}

fn build_reorder_entry(
    rule: &ReorderRuleToml,
    index: usize,
    sets: &IndexMap<String, UnicodeSet>,
) -> Result<ReorderEntry, RuleError> {
    let n = rule.from.len();
    if n == 0 {
        return Err(RuleError::EmptyElements(index));
    }
    check_weights(index, &rule.order, "order", n)?;
    check_weights(index, &rule.tertiary, "tertiary", n)?;
    check_weights(index, &rule.tertiary_base, "tertiary_base", n)?;
    check_weights(index, &rule.prebase, "prebase", n)?;

    let mut elements = Vec::with_capacity(n);
    for (i, spec) in rule.from.iter().enumerate() {
        elements.push(
            parse_element_spec(spec, sets)?
                .with_order(weight_at(&rule.order, i))
                .with_tertiary(weight_at(&rule.tertiary, i))
                .with_tertiary_base(weight_at(&rule.tertiary_base, i))
                .with_prebase(weight_at(&rule.prebase, i)),
        );
    }
    let elements = ElementList::new(elements);

    if rule.before.is_empty() {
        Ok(ReorderEntry::new(elements))
    } else {
        let mut context = Vec::with_capacity(rule.before.len());
        for spec in &rule.before {
            context.push(parse_element_spec(spec, sets)?);
        }
        Ok(ReorderEntry::with_before(
            elements,
            ElementList::new(context),
        ))
    }
}
