/*!
 * Text rendering of the accepted directory structure
 */

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Nested view of the accepted files
#[derive(Debug, Default)]
struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: BTreeSet<String>,
}

impl TreeNode {
    fn insert(&mut self, segments: &[String]) {
        match segments {
            [] => {}
            [file] => {
                self.files.insert(file.clone());
            }
            [dir, rest @ ..] => self.dirs.entry(dir.clone()).or_default().insert(rest),
        }
    }

    fn count(&self) -> (usize, usize) {
        self.dirs.values().fold((self.dirs.len(), self.files.len()), |(d, f), child| {
            let (cd, cf) = child.count();
            (d + cd, f + cf)
        })
    }
}

/// Renders accepted file paths as a connector tree rooted at the project name.
///
/// Only files are given; directories appear exactly when they lead to at
/// least one file. Within a directory, subdirectories come first, then
/// files, each sorted by name.
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    root_name: String,
}

impl TreeRenderer {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
        }
    }

    pub fn render<'a, I>(&self, accepted: I) -> String
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut root = TreeNode::default();
        for segments in accepted {
            root.insert(segments);
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.root_name);
        render_children(&root, "", &mut out);

        let (dirs, files) = root.count();
        let _ = writeln!(
            out,
            "\n{} {}, {} {}",
            dirs,
            if dirs == 1 { "directory" } else { "directories" },
            files,
            if files == 1 { "file" } else { "files" }
        );
        out
    }
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let total = node.dirs.len() + node.files.len();
    let mut index = 0;

    for (name, child) in &node.dirs {
        index += 1;
        let last = index == total;
        let _ = writeln!(out, "{}{}{}", prefix, connector(last), name);
        let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(child, &next, out);
    }

    for name in &node.files {
        index += 1;
        let _ = writeln!(out, "{}{}{}", prefix, connector(index == total), name);
    }
}

fn connector(last: bool) -> &'static str {
    if last {
        "└── "
    } else {
        "├── "
    }
}
