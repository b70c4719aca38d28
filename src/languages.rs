use std::collections::BTreeMap;

/// Bytes per language for a single repository, as reported by GitHub.
pub type LanguageBytes = BTreeMap<String, u64>;

/// Label used for everything ranked below the top N.
pub const OTHER_LABEL: &str = "Other";

/// Cumulative byte counts across every fetched repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTotals {
    bytes: BTreeMap<String, u64>,
    aliases: BTreeMap<String, String>,
}

/// One ranked row of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub language: String,
    pub bytes: u64,
    pub fraction: f64,
}

impl LanguageTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals that fold `from` into `to` for every `(from, to)` alias.
    pub fn with_aliases(aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            bytes: BTreeMap::new(),
            aliases: aliases.into_iter().collect(),
        }
    }

    /// Add one repository's byte map. Zero-byte entries never create a key.
    pub fn add(&mut self, langs: &LanguageBytes) {
        for (lang, &size) in langs {
            if size == 0 {
                continue;
            }
            let key = self.aliases.get(lang).unwrap_or(lang);
            let slot = self.bytes.entry(key.clone()).or_insert(0);
            *slot = slot.saturating_add(size);
        }
    }

    pub fn get(&self, lang: &str) -> Option<u64> {
        self.bytes.get(lang).copied()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.bytes.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.bytes
    }

    /// Languages by descending bytes (ties by name), the tail past `top_n`
    /// collapsed into a single [`OTHER_LABEL`] row. A language literally named
    /// [`OTHER_LABEL`] always lands in that row. Empty when the total is 0.
    pub fn ranked(&self, top_n: usize) -> Vec<Share> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }

        let mut items: Vec<(&String, u64)> = self
            .bytes
            .iter()
            .filter(|(k, _)| k.as_str() != OTHER_LABEL)
            .map(|(k, v)| (k, *v))
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let share = |language: String, bytes: u64| Share {
            language,
            bytes,
            fraction: bytes as f64 / total as f64,
        };

        let mut out: Vec<Share> = items
            .iter()
            .take(top_n)
            .map(|(lang, bytes)| share((*lang).clone(), *bytes))
            .collect();

        let rest = items
            .iter()
            .skip(top_n)
            .fold(self.get(OTHER_LABEL).unwrap_or(0), |acc, (_, v)| {
                acc.saturating_add(*v)
            });
        if rest > 0 {
            out.push(share(OTHER_LABEL.to_string(), rest));
        }

        out
    }
}

/// Sum a sequence of per-repository maps.
pub fn aggregate<'a, I>(maps: I) -> LanguageTotals
where
    I: IntoIterator<Item = &'a LanguageBytes>,
{
    let mut totals = LanguageTotals::new();
    for m in maps {
        totals.add(m);
    }
    totals
}
