/*!
 * Ignore-rule evaluation
 *
 * Rules come from three tiers. Built-in defaults are final. Ignore files
 * found during traversal are evaluated nearest directory first, and within
 * one directory the last matching line wins, so `!pattern` can re-include a
 * path excluded by an earlier line or by a `--exclude` pattern. User
 * excludes apply only when no ignore file had an opinion.
 */

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use log::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::types::{IgnoreRule, RuleOrigin, SkipReason};
use crate::utils::DEFAULT_EXCLUDES;

/// Ignore files read at every directory level, lowest precedence first
pub const IGNORE_FILENAMES: &[&str] = &[".gitignore", ".flatfsignore"];

/// Rules loaded from the ignore files of one directory
struct Scope {
    /// Absolute directory the rules are anchored at
    dir: PathBuf,
    matcher: Gitignore,
}

/// Decides which paths are excluded from a run
pub struct IgnoreMatcher {
    root: PathBuf,
    defaults: Option<Gitignore>,
    user: Gitignore,
    /// Ignore-file scopes keyed by directory depth (root = 0)
    scopes: BTreeMap<usize, Scope>,
    /// Absolute paths that are always excluded, such as the output directory
    reserved: Vec<PathBuf>,
    respect_ignore_files: bool,
    rules: Vec<IgnoreRule>,
}

impl IgnoreMatcher {
    /// Build the default and user tiers for a run rooted at `root`.
    /// `root` should be absolute; ignore files are loaded with [`enter_dir`].
    ///
    /// [`enter_dir`]: IgnoreMatcher::enter_dir
    pub fn new(root: &Path, config: &Config) -> Result<Self> {
        let mut rules = Vec::new();

        let defaults = if config.use_default_excludes {
            let mut builder = GitignoreBuilder::new(root);
            for pattern in DEFAULT_EXCLUDES {
                builder.add_line(None, pattern)?;
                rules.extend(IgnoreRule::parse(pattern, RuleOrigin::Default));
            }
            Some(builder.build()?)
        } else {
            None
        };

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &config.exclude_patterns {
            builder.add_line(None, pattern)?;
            rules.extend(IgnoreRule::parse(pattern, RuleOrigin::User));
        }
        let user = builder.build()?;

        Ok(Self {
            root: root.to_path_buf(),
            defaults,
            user,
            scopes: BTreeMap::new(),
            reserved: Vec::new(),
            respect_ignore_files: config.respect_gitignore,
            rules,
        })
    }

    /// Always exclude the given absolute path (and therefore its subtree)
    pub fn reserve(&mut self, path: PathBuf) {
        self.reserved.push(path);
    }

    /// Every rule seen so far, in load order
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Load the ignore files of `dir`, which sits `depth` levels below the
    /// root. Scopes at `depth` or deeper belong to directories already left
    /// behind and are dropped first.
    pub fn enter_dir(&mut self, dir: &Path, depth: usize) {
        self.scopes.retain(|&d, _| d < depth);

        if !self.respect_ignore_files {
            return;
        }

        let mut builder = GitignoreBuilder::new(dir);
        let mut loaded = 0;

        for name in IGNORE_FILENAMES {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read ignore file {}: {}", path.display(), e);
                    continue;
                }
            };

            let origin = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
            for line in content.lines() {
                let Some(rule) = IgnoreRule::parse(line, RuleOrigin::IgnoreFile(origin.clone()))
                else {
                    continue;
                };
                if let Err(e) = builder.add_line(Some(path.clone()), line) {
                    warn!("Skipping invalid pattern in {}: {}", path.display(), e);
                    continue;
                }
                self.rules.push(rule);
                loaded += 1;
            }
        }

        if loaded == 0 {
            return;
        }

        match builder.build() {
            Ok(matcher) => {
                debug!("Loaded {} ignore rules for {}", loaded, dir.display());
                self.scopes.insert(
                    depth,
                    Scope {
                        dir: dir.to_path_buf(),
                        matcher,
                    },
                );
            }
            Err(e) => warn!("Failed to compile ignore rules in {}: {}", dir.display(), e),
        }
    }

    /// Whether `rel_path` (relative to the root) is excluded
    pub fn matches(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.check(rel_path, is_dir).is_some()
    }

    /// Evaluate all tiers and return the reason an entry is excluded, if any
    pub fn check(&self, rel_path: &Path, is_dir: bool) -> Option<SkipReason> {
        let abs = self.root.join(rel_path);

        if self.reserved.iter().any(|p| *p == abs) {
            return Some(SkipReason::Ignored {
                rule: rel_path.to_string_lossy().to_string(),
                origin: "output directory".to_string(),
            });
        }

        if let Some(defaults) = &self.defaults {
            if let Match::Ignore(glob) = defaults.matched(&abs, is_dir) {
                return Some(SkipReason::Ignored {
                    rule: glob.original().to_string(),
                    origin: RuleOrigin::Default.to_string(),
                });
            }
        }

        for scope in self.scopes.values().rev() {
            if !abs.starts_with(&scope.dir) {
                continue;
            }
            match scope.matcher.matched(&abs, is_dir) {
                Match::Ignore(glob) => {
                    let origin = glob
                        .from()
                        .map(|p| p.strip_prefix(&self.root).unwrap_or(p).display().to_string())
                        .unwrap_or_default();
                    return Some(SkipReason::Ignored {
                        rule: glob.original().to_string(),
                        origin,
                    });
                }
                Match::Whitelist(_) => return None,
                Match::None => {}
            }
        }

        if let Match::Ignore(glob) = self.user.matched(&abs, is_dir) {
            return Some(SkipReason::Ignored {
                rule: glob.original().to_string(),
                origin: RuleOrigin::User.to_string(),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn matcher_for(root: &Path, configure: impl FnOnce(&mut Config)) -> IgnoreMatcher {
        let mut config = Config::new(root);
        configure(&mut config);
        IgnoreMatcher::new(root, &config).unwrap()
    }

    #[test]
    fn test_default_excludes() {
        let dir = tempdir().unwrap();
        let matcher = matcher_for(dir.path(), |_| {});

        assert!(matcher.matches(Path::new(".git"), true));
        assert!(matcher.matches(Path::new("sub/node_modules"), true));
        assert!(matcher.matches(Path::new(".venv"), true));
        assert!(matcher.matches(Path::new("pkg/__pycache__"), true));
        assert!(matcher.matches(Path::new("src/mod.pyc"), false));
        assert!(matcher.matches(Path::new(".DS_Store"), false));
        assert!(!matcher.matches(Path::new("src/main.rs"), false));
        // Directory-only defaults do not hit plain files
        assert!(!matcher.matches(Path::new("venv"), false));
    }

    #[test]
    fn test_defaults_can_be_disabled() {
        let dir = tempdir().unwrap();
        let matcher = matcher_for(dir.path(), |c| c.use_default_excludes = false);
        assert!(!matcher.matches(Path::new(".idea"), true));
    }

    #[test]
    fn test_negation_precedence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n!keep.log\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |_| {});
        matcher.enter_dir(dir.path(), 0);

        assert!(matcher.matches(Path::new("other.log"), false));
        assert!(!matcher.matches(Path::new("keep.log"), false));
        assert!(matcher.matches(Path::new("logs/deep.log"), false));
    }

    #[test]
    fn test_directory_only_and_double_star() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".gitignore"),
            "build/\n/root_only.txt\ndocs/**/*.tmp\n",
        )
        .unwrap();

        let mut matcher = matcher_for(dir.path(), |_| {});
        matcher.enter_dir(dir.path(), 0);

        assert!(matcher.matches(Path::new("build"), true));
        assert!(!matcher.matches(Path::new("build"), false));
        assert!(matcher.matches(Path::new("root_only.txt"), false));
        assert!(!matcher.matches(Path::new("nested/root_only.txt"), false));
        assert!(matcher.matches(Path::new("docs/a/b/c.tmp"), false));
        assert!(!matcher.matches(Path::new("other/c.tmp"), false));
    }

    #[test]
    fn test_nearest_ignore_file_wins() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join(".gitignore"), "*.txt\n").unwrap();
        fs::write(sub.join(".gitignore"), "!notes.txt\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |_| {});
        matcher.enter_dir(dir.path(), 0);
        matcher.enter_dir(&sub, 1);

        assert!(!matcher.matches(Path::new("sub/notes.txt"), false));
        assert!(matcher.matches(Path::new("sub/other.txt"), false));
        assert!(matcher.matches(Path::new("notes.txt"), false));

        // Leaving the subdirectory drops its scope
        matcher.enter_dir(dir.path(), 0);
        assert!(matcher.matches(Path::new("sub/notes.txt"), false));
    }

    #[test]
    fn test_user_excludes_lowest_tier() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "!important.csv\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |c| {
            c.exclude_patterns = vec!["*.csv".to_string()];
        });
        matcher.enter_dir(dir.path(), 0);

        assert!(matcher.matches(Path::new("data.csv"), false));
        assert!(!matcher.matches(Path::new("important.csv"), false));
    }

    #[test]
    fn test_no_gitignore_keeps_defaults_and_user_rules() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.md\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |c| {
            c.respect_gitignore = false;
            c.exclude_patterns = vec!["secret.txt".to_string()];
        });
        matcher.enter_dir(dir.path(), 0);

        assert!(!matcher.matches(Path::new("README.md"), false));
        assert!(matcher.matches(Path::new("secret.txt"), false));
        assert!(matcher.matches(Path::new(".git"), true));
    }

    #[test]
    fn test_negation_cannot_override_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "!.DS_Store\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |_| {});
        matcher.enter_dir(dir.path(), 0);

        assert!(matcher.matches(Path::new(".DS_Store"), false));
    }

    #[test]
    fn test_reserved_path_and_reason() {
        let dir = tempdir().unwrap();
        let mut matcher = matcher_for(dir.path(), |_| {});
        matcher.reserve(dir.path().join("out"));

        let reason = matcher.check(Path::new("out"), true).unwrap();
        assert!(matches!(reason, SkipReason::Ignored { .. }));
        assert!(matcher.matches(Path::new("out"), true));
        assert!(!matcher.matches(Path::new("output"), true));
    }

    #[test]
    fn test_rules_record_origin_and_negation() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "# comment\n\n*.log\n!keep.log\n").unwrap();

        let mut matcher = matcher_for(dir.path(), |c| {
            c.use_default_excludes = false;
            c.exclude_patterns = vec!["tmp/".to_string()];
        });
        matcher.enter_dir(dir.path(), 0);

        let rules = matcher.rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].origin, RuleOrigin::User);
        assert_eq!(
            rules[2].origin,
            RuleOrigin::IgnoreFile(PathBuf::from(".gitignore"))
        );
        assert!(rules[2].negated);
        assert_eq!(rules[2].as_line(), "!keep.log");
    }
}
