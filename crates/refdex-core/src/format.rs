//! Manifest source formats: TOML, JSON, and Markdown tables.
//!
//! All three formats carry the same rows (`id`, `title`, `path`, `tier`) in
//! authored order:
//!
//! ```toml
//! [[documents]]
//! id = "images"
//! title = "Image Optimization"
//! path = "references/images.md"
//! tier = "high"
//! ```
//!
//! ```json
//! { "documents": [{ "id": "images", "title": "Image Optimization",
//!                   "path": "references/images.md", "tier": "high" }] }
//! ```
//!
//! ```text
//! | ID     | Title              | Path                   | Tier |
//! |--------|--------------------|------------------------|------|
//! | images | Image Optimization | `references/images.md` | high |
//! ```
//!
//! The Markdown reader takes the first pipe table whose header names all four
//! columns (case-insensitive, any order, extra columns ignored). Surrounding
//! prose is skipped, so a bundle's `SKILL.md` can be used as the manifest.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::manifest::{DocumentEntry, Manifest, ManifestError};

/// A manifest source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestFormat {
    Toml,
    Json,
    Markdown,
}

impl ManifestFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Resolve a configured format name, where `"auto"` means detect from
    /// `path`.
    pub fn resolve(name: &str, path: &Path) -> Result<Self, ManifestError> {
        if name == "auto" {
            return Self::from_path(path)
                .ok_or_else(|| ManifestError::UnknownFormat(path.display().to_string()));
        }
        name.parse()
    }

    /// Parse manifest source text in this format.
    pub fn parse(&self, text: &str) -> Result<Manifest, ManifestError> {
        let entries = match self {
            Self::Toml => toml::from_str::<ManifestDoc>(text)?.documents,
            Self::Json => serde_json::from_str::<ManifestDoc>(text)?.documents,
            Self::Markdown => parse_markdown(text)?,
        };
        Manifest::new(entries)
    }

    /// Serialize a manifest to source text in this format.
    pub fn render(&self, manifest: &Manifest) -> Result<String, ManifestError> {
        let doc = ManifestDocRef {
            documents: manifest.entries(),
        };
        match self {
            Self::Toml => Ok(toml::to_string_pretty(&doc)?),
            Self::Json => Ok(serde_json::to_string_pretty(&doc)?),
            Self::Markdown => render_markdown(manifest),
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => write!(f, "toml"),
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ManifestFormat {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(ManifestError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct ManifestDoc {
    #[serde(default)]
    documents: Vec<DocumentEntry>,
}

#[derive(Serialize)]
struct ManifestDocRef<'a> {
    documents: &'a [DocumentEntry],
}

/// Read and parse a manifest file.
///
/// With `format = None` the format is detected from the file extension.
pub async fn load(path: &Path, format: Option<ManifestFormat>) -> Result<Manifest, ManifestError> {
    let format = match format {
        Some(f) => f,
        None => ManifestFormat::from_path(path)
            .ok_or_else(|| ManifestError::UnknownFormat(path.display().to_string()))?,
    };
    let text = tokio::fs::read_to_string(path).await?;
    let manifest = format.parse(&text)?;
    tracing::info!(
        path = %path.display(),
        format = %format,
        entries = manifest.len(),
        "Loaded reference manifest"
    );
    Ok(manifest)
}

// ── Markdown tables ─────────────────────────────────────────────────────

/// Column positions of the four manifest fields within a table row.
struct Columns {
    id: usize,
    title: usize,
    path: usize,
    tier: usize,
}

impl Columns {
    fn from_header(cells: &[String]) -> Option<Self> {
        let find = |name: &str| {
            cells
                .iter()
                .position(|c| strip_code(c).eq_ignore_ascii_case(name))
        };
        Some(Self {
            id: find("id")?,
            title: find("title")?,
            path: find("path")?,
            tier: find("tier")?,
        })
    }

    fn width(&self) -> usize {
        self.id.max(self.title).max(self.path).max(self.tier) + 1
    }
}

fn parse_markdown(text: &str) -> Result<Vec<DocumentEntry>, ManifestError> {
    let lines: Vec<&str> = text.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if is_table_row(line)
            && let Some(columns) = Columns::from_header(&split_row(line))
        {
            let separator = lines.get(i + 1).map(|l| l.trim()).unwrap_or("");
            if !is_separator_row(separator) {
                return Err(ManifestError::Markdown {
                    line: i + 2,
                    reason: "expected a separator row after the table header".to_string(),
                });
            }
            return parse_rows(&lines, i + 2, &columns);
        }
        i += 1;
    }

    Err(ManifestError::MissingTable)
}

fn parse_rows(
    lines: &[&str],
    start: usize,
    columns: &Columns,
) -> Result<Vec<DocumentEntry>, ManifestError> {
    let mut entries = Vec::new();

    for (offset, raw) in lines[start..].iter().enumerate() {
        let line_no = start + offset + 1;
        let line = raw.trim();
        if !is_table_row(line) {
            break;
        }

        let cells = split_row(line);
        if cells.len() < columns.width() {
            return Err(ManifestError::Markdown {
                line: line_no,
                reason: format!(
                    "row has {} cells, expected at least {}",
                    cells.len(),
                    columns.width()
                ),
            });
        }

        let tier_cell = unescape(strip_code(&cells[columns.tier]));
        let tier = tier_cell.parse().map_err(|e| ManifestError::Markdown {
            line: line_no,
            reason: format!("{e}"),
        })?;

        entries.push(DocumentEntry {
            id: unescape(strip_code(&cells[columns.id])),
            title: unescape(&cells[columns.title]),
            path: unescape(link_target(strip_code(&cells[columns.path]))),
            tier,
        });
    }

    Ok(entries)
}

fn is_table_row(line: &str) -> bool {
    line.starts_with('|')
}

fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && split_row(line).iter().all(|cell| {
            !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':')
        })
}

/// Split a pipe-table row into trimmed cells.
///
/// Backslash escapes are kept in the cell text (an escaped `\|` does not end
/// the cell) and decoded later by [`unescape`], once wrapping backticks and
/// link syntax have been recognised.
fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut closed = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        closed = false;
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => {
                cells.push(std::mem::take(&mut current).trim().to_string());
                closed = true;
            }
            _ => current.push(c),
        }
    }
    if !closed {
        cells.push(current.trim().to_string());
    }
    cells
}

/// Decode backslash escapes of ASCII punctuation. Other backslashes are
/// literal, so hand-written paths such as `docs\ssr.md` survive.
fn unescape(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && next.is_ascii_punctuation() => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Strip a single pair of unescaped wrapping backticks.
fn strip_code(cell: &str) -> &str {
    cell.strip_prefix('`')
        .and_then(|c| c.strip_suffix('`'))
        .filter(|c| !c.ends_with('\\'))
        .map(str::trim)
        .unwrap_or(cell)
}

/// `[label](target)` → `target`; anything else is returned as-is.
fn link_target(cell: &str) -> &str {
    if !cell.starts_with('[') || !cell.ends_with(')') {
        return cell;
    }
    match cell.find("](") {
        Some(pos) => strip_code(cell[pos + 2..cell.len() - 1].trim()),
        None => cell,
    }
}

/// Escape a value so [`split_row`] and [`unescape`] read it back unchanged.
///
/// Cells are trimmed and rows are single lines, so values with surrounding
/// whitespace or line breaks have no faithful Markdown form.
fn escape_cell(id: &str, value: &str) -> Result<String, ManifestError> {
    let unrepresentable = |reason: &str| ManifestError::Unrepresentable {
        id: id.to_string(),
        reason: format!("{reason} in {value:?}"),
    };
    if value.trim() != value {
        return Err(unrepresentable("surrounding whitespace"));
    }
    if value.contains('\n') {
        return Err(unrepresentable("line break"));
    }

    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '|' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(out)
}

fn render_markdown(manifest: &Manifest) -> Result<String, ManifestError> {
    let mut out = String::from("| id | title | path | tier |\n|----|-------|------|------|\n");
    for entry in manifest {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&entry.id, &entry.id)?,
            escape_cell(&entry.id, &entry.title)?,
            escape_cell(&entry.id, &entry.path)?,
            entry.tier
        ));
    }
    Ok(out)
}
