use crate::core::briefs::{document_link, BriefOutcome};
use crate::core::search::{SearchDiagnostic, SearchOutcome};
use crate::core::workspace::{ClientMetrics, DocumentRecord, FolderChoice};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

/// Discord's cap on an embed description.
pub const DESCRIPTION_LIMIT: usize = 4096;
/// Discord's cap on an embed field value.
pub const FIELD_LIMIT: usize = 1024;
/// Discord's cap on the name and value of one autocomplete choice.
pub const CHOICE_LIMIT: usize = 100;
/// Discord shows at most this many autocomplete choices.
pub const MAX_CHOICES: usize = 25;

const BRIEFS_COLOR: u32 = 0x1A73E8; // Google blue
const WARNING_COLOR: u32 = 0xF9AB00;

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Joins as many whole lines as fit in `limit` characters.
/// Returns the text and how many lines made it in.
pub fn pack_lines(lines: &[String], separator: &str, limit: usize) -> (String, usize) {
    let mut text = String::new();
    let mut used = 0usize;
    let mut shown = 0usize;

    for line in lines {
        let extra = if shown == 0 { 0 } else { separator.chars().count() };
        let len = line.chars().count();
        if used + extra + len > limit {
            break;
        }
        if shown > 0 {
            text.push_str(separator);
        }
        text.push_str(line);
        used += extra + len;
        shown += 1;
    }

    (text, shown)
}

// Square brackets would close the markdown link early.
fn link_text(name: &str) -> String {
    name.replace('[', "(").replace(']', ")")
}

/// One search hit: linked title, folder path and relative modified time.
pub fn document_line(document: &DocumentRecord) -> String {
    let link = document
        .web_view_link
        .clone()
        .unwrap_or_else(|| document_link(&document.id));
    let modified = document
        .modified_time
        .map(|t| format!("<t:{}:R>", t.timestamp()))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "**[{}]({})**\n📁 {} · modified {}",
        link_text(&document.name),
        link,
        document.folder_name,
        modified
    )
}

pub fn diagnostic_line(diagnostic: &SearchDiagnostic) -> String {
    match diagnostic {
        SearchDiagnostic::FolderUnavailable { folder_id, reason } => {
            format!("Folder `{}` could not be read: {}", folder_id, reason)
        }
        SearchDiagnostic::PathCycle { folder_id } => {
            format!("Folder `{}` sits in a parent loop; its path was cut short", folder_id)
        }
    }
}

/// Heading for a search: the keyword if there was one, otherwise "all briefs".
pub fn search_title(keyword: Option<&str>) -> String {
    match keyword.map(str::trim).filter(|k| !k.is_empty()) {
        Some(keyword) => truncate_chars(&format!("🔎 Briefs matching \"{}\"", keyword), 256),
        None => "📚 All briefs".to_string(),
    }
}

pub fn search_embed(
    keyword: Option<&str>,
    scope_label: Option<&str>,
    outcome: &SearchOutcome,
) -> CreateEmbed {
    let lines: Vec<String> = outcome.documents.iter().map(document_line).collect();
    let (description, shown) = pack_lines(&lines, "\n\n", DESCRIPTION_LIMIT);

    let description = if outcome.documents.is_empty() {
        "No briefs found.".to_string()
    } else {
        description
    };

    let mut footer = format!(
        "Showing {} of {} · {} folders searched",
        shown,
        outcome.documents.len(),
        outcome.folders_searched
    );
    if let Some(scope) = scope_label {
        footer.push_str(&format!(" · in {}", scope));
    }

    let mut embed = CreateEmbed::new()
        .title(search_title(keyword))
        .description(description)
        .color(if outcome.diagnostics.is_empty() {
            BRIEFS_COLOR
        } else {
            WARNING_COLOR
        })
        .footer(CreateEmbedFooter::new(truncate_chars(&footer, 2048)))
        .timestamp(serenity::Timestamp::now());

    if !outcome.diagnostics.is_empty() {
        let lines: Vec<String> = outcome
            .diagnostics
            .iter()
            .map(|d| format!("- {}", truncate_chars(&diagnostic_line(d), 300)))
            .collect();
        let (value, shown) = pack_lines(&lines, "\n", FIELD_LIMIT - 40);
        let hidden = lines.len() - shown;
        let value = if hidden > 0 {
            format!("{}\n…and {} more", value, hidden)
        } else {
            value
        };
        embed = embed.field("⚠️ Partial results", value, false);
    }

    embed
}

/// Shown when a scope matched no offered folder and was used as a raw id.
pub fn unrecognised_scope_note(input: &str) -> String {
    format!(
        "⚠️ `{}` is not one of the folders in `/briefs scopes`, so it was treated as a folder id.",
        truncate_chars(input.trim(), CHOICE_LIMIT)
    )
}

/// A list of folders, one `path` per line.
pub fn folders_embed(title: &str, choices: &[FolderChoice], empty_message: &str) -> CreateEmbed {
    let lines: Vec<String> = choices
        .iter()
        .map(|choice| format!("- `{}`", choice.path))
        .collect();
    let (description, shown) = pack_lines(&lines, "\n", DESCRIPTION_LIMIT);

    let embed = CreateEmbed::new()
        .title(title)
        .description(if choices.is_empty() {
            empty_message.to_string()
        } else {
            description
        })
        .color(BRIEFS_COLOR);

    if shown < choices.len() {
        embed.footer(CreateEmbedFooter::new(format!(
            "Showing {} of {} folders",
            shown,
            choices.len()
        )))
    } else {
        embed
    }
}

fn or_blank(value: &str) -> String {
    if value.trim().is_empty() {
        "n/a".to_string()
    } else {
        value.to_string()
    }
}

pub fn client_embed(name: &str, metrics: &ClientMetrics) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("📊 {}", truncate_chars(name, 240)))
        .color(BRIEFS_COLOR)
        .field("Lead", or_blank(&metrics.lead), false)
        .field("Tickets", or_blank(&metrics.tickets), true)
        .field("Completed", or_blank(&metrics.completed), true)
        .field("Percent", or_blank(&metrics.percent), true)
}

pub fn brief_embed(outcome: &BriefOutcome, folder_label: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("📝 Brief created")
        .description(format!("**[{}]({})**", link_text(&outcome.title), outcome.link))
        .color(0x34A853) // Green
        .field("Folder", truncate_chars(folder_label, FIELD_LIMIT), false)
        .timestamp(serenity::Timestamp::now());

    let unused = outcome.unused_placeholders();
    if !unused.is_empty() {
        embed = embed.field(
            "Placeholders not found in the template",
            unused
                .iter()
                .map(|p| format!("`{}`", p))
                .collect::<Vec<_>>()
                .join(", "),
            false,
        );
    }

    embed
}

/// The string offered for a folder in autocomplete. Paths too long for
/// Discord fall back to the folder id, which resolves just the same.
pub fn choice_value(choice: &FolderChoice) -> String {
    if choice.path.chars().count() <= CHOICE_LIMIT {
        choice.path.clone()
    } else {
        choice.id.clone()
    }
}

/// Case-insensitive substring filter for autocomplete, capped at Discord's limit.
pub fn filter_choices<I>(candidates: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let partial = partial.trim().to_lowercase();
    candidates
        .into_iter()
        .filter(|c| c.chars().count() <= CHOICE_LIMIT)
        .filter(|c| partial.is_empty() || c.to_lowercase().contains(&partial))
        .take(MAX_CHOICES)
        .collect()
}
