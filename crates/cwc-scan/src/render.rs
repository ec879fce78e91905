//! Box-drawing rendering of a gathered tree.

use cwc_core::FileNode;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render `root` and its descendants as an indented tree.
///
/// The root name is printed bare on the first line; every line ends with a
/// newline. Children appear in the order they were gathered.
pub fn generate_file_tree(root: &FileNode) -> String {
    let mut out = String::new();
    out.push_str(&root.name);
    out.push('\n');
    write_children(&mut out, root, "");
    out
}

fn write_children(out: &mut String, node: &FileNode, prefix: &str) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        write_entry(out, child, prefix, i + 1 == count);
    }
}

fn write_entry(out: &mut String, node: &FileNode, prefix: &str, is_last: bool) {
    let connector = if is_last { LAST_BRANCH } else { BRANCH };
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(&node.name);
    out.push('\n');

    if node.is_dir() {
        let continuation = if is_last { SPACE } else { PIPE };
        write_children(out, node, &format!("{prefix}{continuation}"));
    }
}
