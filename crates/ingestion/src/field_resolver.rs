//! FieldResolver - fuzzy lookup of a logical field inside an untyped row
//!
//! Headers are matched against candidate names in three tiers, strongest
//! first; the first column (in original order) matching at the strongest
//! tier wins:
//!
//! 1. `Exact`: case-insensitive equality
//! 2. `Compact`: equality after removing whitespace and `.!,:;_-`
//! 3. `Substring`: compact header contains the compact candidate or vice versa
//!
//! A blank header never matches anything.

/// Header match strength, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Compact,
    Substring,
}

/// Lowercase and drop whitespace plus `.!,:;_-`
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '!' | ',' | ':' | ';' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Header text with its comparison forms precomputed
#[derive(Debug, Clone)]
pub struct HeaderText {
    raw: String,
    lower: String,
    compact: String,
}

impl HeaderText {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = raw.trim().to_lowercase();
        let compact = normalize(&raw);
        Self {
            raw,
            lower,
            compact,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_blank(&self) -> bool {
        self.compact.is_empty()
    }

    /// Strongest tier at which this header matches `candidate`
    pub fn tier(&self, candidate: &str) -> Option<MatchTier> {
        if self.is_blank() {
            return None;
        }
        let lower = candidate.trim().to_lowercase();
        if self.lower == lower {
            return Some(MatchTier::Exact);
        }
        let compact = normalize(candidate);
        if compact.is_empty() {
            return None;
        }
        if self.compact == compact {
            return Some(MatchTier::Compact);
        }
        if self.compact.contains(&compact) || compact.contains(&self.compact) {
            return Some(MatchTier::Substring);
        }
        None
    }

    /// Strongest tier over all candidates
    pub fn best_tier(&self, candidates: &[&str]) -> Option<MatchTier> {
        candidates.iter().filter_map(|c| self.tier(c)).min()
    }
}

/// Resolve a field in a keyed row (single header row)
///
/// Keys are scanned in their original order.
pub fn resolve<'r, K, V>(row: &'r [(K, V)], candidates: &[&str]) -> Option<&'r V>
where
    K: AsRef<str>,
{
    row.iter()
        .filter_map(|(key, value)| {
            HeaderText::new(key.as_ref())
                .best_tier(candidates)
                .map(|tier| (tier, value))
        })
        .min_by_key(|(tier, _)| *tier)
        .map(|(_, value)| value)
}

/// Candidate names for one logical field under a two-row header
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidates {
    /// Group header candidates (upper, merged row)
    pub groups: &'static [&'static str],
    /// Field header candidates (lower row)
    pub fields: &'static [&'static str],
}

#[derive(Debug, Clone)]
struct HeaderPair {
    index: usize,
    group: HeaderText,
    field: HeaderText,
}

/// Column locator for a two-row merged header
///
/// Each column is identified by a (group, field) pair. Blank group cells
/// inherit the nearest non-blank group to their left, which is how a merged
/// group header reads once the merge is flattened.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    columns: Vec<HeaderPair>,
}

impl FieldResolver {
    /// Build from the group row and the field row
    pub fn from_header_rows<G, F>(group_row: &[G], field_row: &[F]) -> Self
    where
        G: AsRef<str>,
        F: AsRef<str>,
    {
        let width = group_row.len().max(field_row.len());
        let mut columns = Vec::with_capacity(width);
        let mut current_group = String::new();

        for index in 0..width {
            let group = group_row.get(index).map(|g| g.as_ref().trim()).unwrap_or("");
            if !group.is_empty() {
                current_group = group.to_string();
            }
            let field = field_row.get(index).map(|f| f.as_ref().trim()).unwrap_or("");
            columns.push(HeaderPair {
                index,
                group: HeaderText::new(current_group.clone()),
                field: HeaderText::new(field),
            });
        }

        Self { columns }
    }

    /// Number of header columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column index of a field; both halves must match
    ///
    /// A pair ranks by its weaker half; the strongest-ranked pair wins and
    /// ties go to the leftmost column.
    pub fn locate(&self, candidates: &FieldCandidates) -> Option<usize> {
        self.columns
            .iter()
            .filter_map(|column| {
                let group = column.group.best_tier(candidates.groups)?;
                let field = column.field.best_tier(candidates.fields)?;
                Some((group.max(field), column.index))
            })
            .min_by_key(|(tier, _)| *tier)
            .map(|(_, index)| index)
    }

    /// Header labels of a column as `(group, field)`
    pub fn labels(&self, index: usize) -> Option<(&str, &str)> {
        self.columns
            .get(index)
            .map(|c| (c.group.as_str(), c.field.as_str()))
    }
}
