//! Version ordering and version range specifications.
//!
//! A version specification is either a soft version (`1.0`, any version is
//! acceptable but `1.0` is preferred) or one or more restrictions written in
//! interval notation: `[1.0]`, `[1.0,2.0)`, `(,1.0]`, `[1.5,)` and
//! comma-joined sets such as `(,1.0],[1.2,)`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::UtilError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// A version with a qualifier-aware total order.
///
/// `1.0-alpha < 1.0-beta < 1.0-rc < 1.0-SNAPSHOT < 1.0 = 1.0.0 < 1.0-sp < 1.0.1`.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

impl Version {
    /// Parse a version string. Every string is a valid version.
    pub fn parse(raw: &str) -> Self {
        let mut items = tokenize(raw.trim());
        while items
            .last()
            .is_some_and(|item| matches!(item, Item::Number(0)) || is_release(item))
        {
            items.pop();
        }
        Self {
            raw: raw.trim().to_owned(),
            items,
        }
    }

    /// The version as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn tokenize(raw: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in raw.chars() {
        if c == '.' || c == '-' || c == '_' {
            if !current.is_empty() {
                items.push(to_item(&current));
                current.clear();
            }
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            items.push(to_item(&current));
            current.clear();
        }
        current_is_digit = is_digit;
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        items.push(to_item(&current));
    }
    items
}

fn to_item(token: &str) -> Item {
    token
        .parse::<u64>()
        .map(Item::Number)
        .unwrap_or_else(|_| Item::Qualifier(token.to_owned()))
}

fn is_release(item: &Item) -> bool {
    matches!(item, Item::Qualifier(q) if qualifier_rank(q) == RELEASE_RANK)
}

const RELEASE_RANK: u8 = 5;

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_items(left: Option<&Item>, right: Option<&Item>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(Item::Number(a)), Some(Item::Number(b))) => a.cmp(b),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Qualifier(a)), Some(Item::Qualifier(b))) => qualifier_rank(a)
            .cmp(&qualifier_rank(b))
            .then_with(|| a.cmp(b)),
        (Some(Item::Number(n)), None) => n.cmp(&0),
        (Some(Item::Qualifier(q)), None) => qualifier_rank(q).cmp(&RELEASE_RANK),
        (None, Some(_)) => compare_items(right, left).reverse(),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        (0..len)
            .map(|i| compare_items(self.items.get(i), other.items.get(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One end of a restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A single interval; `None` on either side means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl Restriction {
    /// Whether `version` falls inside this interval.
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = self.lower.as_ref().is_none_or(|b| match version.cmp(&b.version) {
            Ordering::Greater => true,
            Ordering::Equal => b.inclusive,
            Ordering::Less => false,
        });
        let below_upper = self.upper.as_ref().is_none_or(|b| match version.cmp(&b.version) {
            Ordering::Less => true,
            Ordering::Equal => b.inclusive,
            Ordering::Greater => false,
        });
        above_lower && below_upper
    }
}

/// A parsed version specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    raw: String,
    recommended: Option<Version>,
    restrictions: Vec<Restriction>,
}

impl VersionSpec {
    /// Parse a version specification.
    ///
    /// # Errors
    /// Returns `UtilError::InvalidVersionSpec` for an empty spec, an
    /// unterminated range, a bare version in parentheses, identical or
    /// inverted bounds, overlapping ranges, or trailing text after a range set.
    pub fn parse(spec: &str) -> Result<Self, UtilError> {
        let invalid = |reason: &str| UtilError::InvalidVersionSpec {
            spec: spec.to_owned(),
            reason: reason.to_owned(),
        };

        let mut rest = spec.trim();
        if rest.is_empty() {
            return Err(invalid("version is empty"));
        }

        let mut restrictions: Vec<Restriction> = Vec::new();
        while rest.starts_with('[') || rest.starts_with('(') {
            let close = rest
                .find([')', ']'])
                .ok_or_else(|| invalid("unbounded range"))?;
            let (head, tail) = rest.split_at(close.saturating_add(1));
            let restriction = parse_restriction(head).map_err(|reason| invalid(&reason))?;

            if let Some(previous) = restrictions.last() {
                let overlaps = match (&previous.upper, &restriction.lower) {
                    (Some(upper), Some(lower)) => lower.version < upper.version,
                    _ => true,
                };
                if overlaps {
                    return Err(invalid("ranges overlap"));
                }
            }
            restrictions.push(restriction);

            rest = tail.trim();
            if let Some(after_comma) = rest.strip_prefix(',') {
                rest = after_comma.trim();
            }
        }

        if !rest.is_empty() {
            if !restrictions.is_empty() {
                return Err(invalid(
                    "only fully-qualified sets are allowed when multiple ranges are given",
                ));
            }
            if rest.contains(['[', ']', '(', ')', ',']) {
                return Err(invalid("unexpected range delimiter in version"));
            }
            return Ok(Self {
                raw: spec.trim().to_owned(),
                recommended: Some(Version::parse(rest)),
                restrictions,
            });
        }

        Ok(Self {
            raw: spec.trim().to_owned(),
            recommended: None,
            restrictions,
        })
    }

    /// The soft (preferred) version, when the spec is not a range.
    pub fn recommended(&self) -> Option<&Version> {
        self.recommended.as_ref()
    }

    /// The restrictions, empty for a soft version.
    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    /// Whether `version` satisfies this spec.
    ///
    /// A soft version only matches itself.
    pub fn contains(&self, version: &Version) -> bool {
        match &self.recommended {
            Some(recommended) => recommended == version,
            None => self.restrictions.iter().any(|r| r.contains(version)),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_restriction(spec: &str) -> Result<Restriction, String> {
    let lower_inclusive = spec.starts_with('[');
    let upper_inclusive = spec.ends_with(']');
    let inner = spec
        .get(1..spec.len().saturating_sub(1))
        .ok_or_else(|| format!("malformed range `{spec}`"))?
        .trim();

    let Some((lower, upper)) = inner.split_once(',') else {
        if !lower_inclusive || !upper_inclusive {
            return Err(format!("single version must be surrounded by [] in `{spec}`"));
        }
        if inner.is_empty() {
            return Err("empty version in range".to_owned());
        }
        let bound = Bound {
            version: Version::parse(inner),
            inclusive: true,
        };
        return Ok(Restriction {
            lower: Some(bound.clone()),
            upper: Some(bound),
        });
    };

    let lower = lower.trim();
    let upper = upper.trim();
    if upper.contains(',') {
        return Err(format!("too many bounds in `{spec}`"));
    }
    if !lower.is_empty() && lower == upper {
        return Err(format!("range cannot have identical boundaries in `{spec}`"));
    }

    let lower = (!lower.is_empty()).then(|| Bound {
        version: Version::parse(lower),
        inclusive: lower_inclusive,
    });
    let upper = (!upper.is_empty()).then(|| Bound {
        version: Version::parse(upper),
        inclusive: upper_inclusive,
    });

    if let (Some(l), Some(u)) = (&lower, &upper) {
        if u.version < l.version {
            return Err(format!("range defies version ordering in `{spec}`"));
        }
    }

    Ok(Restriction { lower, upper })
}


#[cfg(test)]
mod proptests {
    use super::{Version, VersionSpec};

    use proptest::prelude::{prop_assert, proptest};

    proptest! {
        /// Arbitrary input must never make the parser panic.
        #[test]
        fn parse_never_panics(spec in ".*") {
            let _ = VersionSpec::parse(&spec);
        }

        /// Exclusive bounds never contain their own endpoints.
        #[test]
        fn exclusive_bounds_are_excluded(lo in 0u32..100, span in 1u32..100) {
            let hi = lo + span;
            let parsed = VersionSpec::parse(&format!("({lo},{hi})"));
            prop_assert!(parsed.is_ok());
            if let Ok(spec) = parsed {
                prop_assert!(!spec.contains(&Version::parse(&lo.to_string())));
                prop_assert!(!spec.contains(&Version::parse(&hi.to_string())));
                let mid = format!("{lo}.5");
                prop_assert!(spec.contains(&Version::parse(&mid)));
            }
        }
    }
}
