//! Auto-saving code blocks from replies
//!
//! When enabled, non-shell code blocks are written into the configured code
//! directory. Filenames come from a leading comment when the block has one,
//! otherwise from a timestamp.

use chrono::Local;
use ollamacode_core::CodeBlock;
use ollamacode_foundation::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^(?:#|//)\s*([A-Za-z][\w ]*)").expect("name regex"))
}

/// Map a language tag to a file extension
fn extension_for(lang: &str) -> &'static str {
    match lang {
        "python" | "py" => "py",
        "javascript" | "js" => "js",
        "typescript" | "ts" => "ts",
        "html" => "html",
        "css" => "css",
        "c" => "c",
        "cpp" | "c++" => "cpp",
        "java" => "java",
        "rust" | "rs" => "rs",
        "go" => "go",
        "ruby" | "rb" => "rb",
        "php" => "php",
        "bash" | "shell" | "sh" => "sh",
        "sql" => "sql",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yml",
        "markdown" | "md" => "md",
        _ => "txt",
    }
}

/// Derive a filename for a code block
pub fn filename_for(source: &str, lang: &str) -> String {
    let first_line = source.lines().next().unwrap_or("");

    let stem = name_re()
        .captures(first_line)
        .and_then(|c| c.get(1))
        .map(|m| {
            m.as_str()
                .trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("code_{}", Local::now().format("%Y%m%d_%H%M%S")));

    format!("{}.{}", stem, extension_for(lang))
}

/// Write a block into the code directory, returning the path
pub fn save_block(block: &CodeBlock, code_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(code_dir)?;
    let path = code_dir.join(filename_for(&block.source, &block.lang));
    std::fs::write(&path, &block.source)?;
    tracing::info!(path = %path.display(), lang = %block.lang, "code block saved");
    Ok(path)
}
