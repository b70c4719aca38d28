use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::github::DEFAULT_API_URL;
use crate::pipeline::FailurePolicy;
use crate::svg::{ChartOptions, Layout, Theme};

pub const DEFAULT_OUTPUT: &str = "assets/top_langs.svg";

const USER_VARS: &[&str] = &["GITHUB_USERNAME", "GITHUB_ACTOR"];
const TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN", "ACCESS_TOKEN"];
const API_URL_VAR: &str = "GITHUB_API_URL";

/// Raw chart settings as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ChartArgs {
    pub user: Option<String>,
    pub output: Option<PathBuf>,
    pub api_url: Option<String>,
    pub layout: Layout,
    pub theme: Theme,
    pub top: usize,
    pub merge: Vec<String>,
    pub skip_failed: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub user: String,
    pub token: Option<String>,
    pub api_url: String,
    pub output: PathBuf,
    pub chart: ChartOptions,
    pub aliases: Vec<(String, String)>,
    pub policy: FailurePolicy,
}

impl Config {
    /// Resolve CLI flags against the process environment.
    pub fn from_env(args: ChartArgs) -> Result<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Flags win over environment variables; the first non-empty variable in
    /// each list is used.
    pub fn resolve(args: ChartArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first_set = |keys: &[&str]| {
            keys.iter()
                .filter_map(|&k| env(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let user = args
            .user
            .filter(|u| !u.trim().is_empty())
            .or_else(|| first_set(USER_VARS))
            .context("GitHub user not set (pass --user or set GITHUB_USERNAME)")?;

        let api_url = args
            .api_url
            .or_else(|| first_set(&[API_URL_VAR]))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if args.top == 0 {
            bail!("--top must be at least 1");
        }

        let aliases = args
            .merge
            .iter()
            .map(|m| parse_alias(m))
            .collect::<Result<Vec<_>>>()?;
        let aliases = resolve_alias_chains(aliases)?;

        Ok(Self {
            user,
            token: first_set(TOKEN_VARS),
            api_url,
            output: args.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            chart: ChartOptions {
                layout: args.layout,
                theme: args.theme,
                top_n: args.top,
            },
            aliases,
            policy: if args.skip_failed {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Abort
            },
        })
    }
}

/// Parse a `FROM=TO` language alias.
pub fn parse_alias(s: &str) -> Result<(String, String)> {
    let (from, to) = s
        .split_once('=')
        .with_context(|| format!("invalid merge '{s}', expected FROM=TO"))?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        bail!("invalid merge '{s}', both sides must be non-empty");
    }
    Ok((from.to_string(), to.to_string()))
}

/// Point every alias at the end of its chain, so `A=B` with `B=C` folds `A`
/// straight into `C`. A later `FROM` overrides an earlier one; cycles are
/// rejected.
pub fn resolve_alias_chains(aliases: Vec<(String, String)>) -> Result<Vec<(String, String)>> {
    let direct: BTreeMap<String, String> = aliases.into_iter().collect();

    let mut resolved = Vec::with_capacity(direct.len());
    for from in direct.keys() {
        let mut seen = BTreeSet::from([from.as_str()]);
        let mut target = direct[from].as_str();
        while let Some(next) = direct.get(target) {
            if !seen.insert(target) {
                break;
            }
            target = next.as_str();
        }
        if seen.contains(target) {
            bail!("--merge aliases form a cycle through '{from}'");
        }
        resolved.push((from.clone(), target.to_string()));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{LanguageBytes, LanguageTotals};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn args() -> ChartArgs {
        ChartArgs {
            top: 5,
            ..Default::default()
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn user_flag_beats_environment() {
        let cfg = Config::resolve(
            ChartArgs {
                user: Some("flag-user".to_string()),
                ..args()
            },
            env(&[("GITHUB_USERNAME", "env-user")]),
        )
        .unwrap();
        assert_eq!(cfg.user, "flag-user");
    }

    #[test]
    fn falls_back_to_actor() {
        let cfg = Config::resolve(
            args(),
            env(&[("GITHUB_USERNAME", ""), ("GITHUB_ACTOR", "octocat")]),
        )
        .unwrap();
        assert_eq!(cfg.user, "octocat");
    }

    #[test]
    fn missing_user_is_an_error() {
        assert!(Config::resolve(args(), env(&[])).is_err());
    }

    #[test]
    fn defaults() {
        let cfg = Config::resolve(args(), env(&[("GITHUB_ACTOR", "octocat")])).unwrap();

        assert_eq!(cfg.token, None);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cfg.policy, FailurePolicy::Abort);
        assert_eq!(cfg.chart.layout, Layout::Donut);
        assert_eq!(cfg.chart.top_n, 5);
    }

    #[test]
    fn token_precedence() {
        let cfg = Config::resolve(
            args(),
            env(&[
                ("GITHUB_ACTOR", "octocat"),
                ("GH_TOKEN", "second"),
                ("ACCESS_TOKEN", "third"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.token.as_deref(), Some("second"));
    }

    #[test]
    fn api_url_is_trimmed() {
        let cfg = Config::resolve(
            args(),
            env(&[
                ("GITHUB_ACTOR", "octocat"),
                ("GITHUB_API_URL", "https://ghe.example.test/api/v3/"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.api_url, "https://ghe.example.test/api/v3");
    }

    #[test]
    fn rejects_zero_top() {
        let result = Config::resolve(
            ChartArgs {
                top: 0,
                ..args()
            },
            env(&[("GITHUB_ACTOR", "octocat")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn parses_merge_aliases() {
        let cfg = Config::resolve(
            ChartArgs {
                merge: vec!["TypeScript = JavaScript".to_string()],
                skip_failed: true,
                ..args()
            },
            env(&[("GITHUB_ACTOR", "octocat")]),
        )
        .unwrap();

        assert_eq!(
            cfg.aliases,
            vec![("TypeScript".to_string(), "JavaScript".to_string())]
        );
        assert_eq!(cfg.policy, FailurePolicy::Skip);
    }

    #[test]
    fn alias_chains_resolve_to_their_last_target() {
        let resolved = resolve_alias_chains(vec![
            ("A".to_string(), "B".to_string()),
            ("B".to_string(), "C".to_string()),
        ])
        .unwrap();

        assert_eq!(
            resolved,
            vec![
                ("A".to_string(), "C".to_string()),
                ("B".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn chained_merges_fold_bytes_into_the_final_language() {
        let cfg = Config::resolve(
            ChartArgs {
                merge: vec!["A=B".to_string(), "B=C".to_string()],
                ..args()
            },
            env(&[("GITHUB_ACTOR", "octocat")]),
        )
        .unwrap();

        let mut totals = LanguageTotals::with_aliases(cfg.aliases);
        let repo: LanguageBytes = [("A".to_string(), 5), ("B".to_string(), 3)]
            .into_iter()
            .collect();
        totals.add(&repo);

        assert_eq!(totals.get("C"), Some(8));
        assert_eq!(totals.get("B"), None);
    }

    #[test]
    fn rejects_alias_cycles() {
        let pairs = |list: &[(&str, &str)]| {
            list.iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect::<Vec<_>>()
        };

        assert!(resolve_alias_chains(pairs(&[("A", "A")])).is_err());
        assert!(resolve_alias_chains(pairs(&[("A", "B"), ("B", "A")])).is_err());
        assert!(resolve_alias_chains(pairs(&[("X", "A"), ("A", "B"), ("B", "A")])).is_err());
    }

    #[test]
    fn rejects_malformed_alias() {
        assert!(parse_alias("TypeScript").is_err());
        assert!(parse_alias("=JavaScript").is_err());
    }
}
