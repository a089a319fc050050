use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::DomainError;

/// Parsed form of an OS profile version string, `MAJOR.MINOR.PATCH[.BUILD[.N]...]`
/// (§4.E.4). Comparison is purely numeric, segment by segment, so leading
/// zeros never change ordering (`"01.2.3" == "1.2.3"`); the raw text of each
/// build segment is kept alongside so [`Self::canonical`] can still show a
/// leading zero that numeric comparison rightly ignores (`"3.0.20250717.0732"`
/// orders equal to `"...0732"` stripped of zeros, but still renders as
/// `0732`, matching §9's open-question resolution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVersion {
    segments: Vec<u64>,
    build_text: Vec<String>,
    raw: String,
}

impl ImageVersion {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Renders the canonical `MAJOR.MINOR.PATCH[-buildBUILD[.N]...]` form
    /// used when surfacing the resolved version back to callers (§4.E.4).
    /// The `build` prefix is only applied when the build segment carries a
    /// leading zero (per §9's open question); a build segment without one is
    /// appended raw.
    pub fn canonical(&self) -> String {
        let head = self.segments[..3.min(self.segments.len())]
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        if self.build_text.is_empty() {
            return head;
        }
        let tail = self.build_text.join(".");
        let has_leading_zero = self.build_text[0].len() > 1 && self.build_text[0].starts_with('0');
        if has_leading_zero {
            format!("{head}-build{tail}")
        } else {
            format!("{head}-{tail}")
        }
    }
}

impl FromStr for ImageVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::UnparseableVersion(s.to_string()));
        }
        let mut segments = Vec::new();
        for part in s.split('.') {
            let n: u64 = part
                .parse()
                .map_err(|_| DomainError::UnparseableVersion(s.to_string()))?;
            segments.push(n);
        }
        if segments.len() < 3 {
            return Err(DomainError::UnparseableVersion(s.to_string()));
        }
        let build_text = s.split('.').skip(3).map(str::to_string).collect();
        Ok(ImageVersion { segments, build_text, raw: s.to_string() })
    }
}

impl PartialOrd for ImageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Picks the lexically-latest (by numeric version) string from a set of
/// candidate profile versions, used when resolving `UpdateStrategy::Latest`
/// against a profile name's immutable OS family (§4.E.4).
pub fn latest<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter_map(|s| s.parse::<ImageVersion>().ok().map(|v| (v, s)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, s)| s)
}
