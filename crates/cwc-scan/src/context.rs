//! Assembly of the context document handed to the model.

use cwc_core::File;

/// Build the context document: the rendered tree followed by one fenced
/// block per file, annotated with the file's type label.
pub fn build_context(tree: &str, files: &[File]) -> String {
    let mut context = String::from("Context:\n\n## File tree\n\n```\n");
    context.push_str(tree);
    context.push_str("```\n\n## File contents\n\n");

    for file in files {
        context.push_str("./");
        context.push_str(&file.path);
        context.push_str("\n```");
        context.push_str(&file.file_type);
        context.push('\n');
        context.push_str(&file.contents());
        context.push_str("\n```\n\n");
    }

    context
}

/// Files whose content exceeds `threshold` bytes.
pub fn large_files(files: &[File], threshold: u64) -> impl Iterator<Item = &File> {
    files.iter().filter(move |file| file.size() > threshold)
}

/// Log an advisory warning for every file larger than `threshold`.
///
/// Size is never enforced; the warning is the only effect.
pub fn warn_large_files(files: &[File], threshold: u64) -> usize {
    let mut count = 0;
    for file in large_files(files, threshold) {
        tracing::warn!(
            "{} is very large ({}) and will degrade performance",
            file.path,
            humansize::format_size(file.size(), humansize::DECIMAL)
        );
        count += 1;
    }
    count
}
