use std::sync::Arc;

use crate::core::briefs::{extract_document_id, BriefError, BriefRequest, BriefService};
use crate::core::clients::ClientMetricsService;
use crate::core::folders::{match_choice, resolve_choice, FolderService, SubtreeEnumerator};
use crate::core::search::SearchService;
use crate::discord::formatter;
use crate::infra::google::GoogleWorkspaceClient;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command.
pub struct Data {
    pub folders: Arc<FolderService<GoogleWorkspaceClient>>,
    pub search: Arc<SearchService<GoogleWorkspaceClient>>,
    pub subtrees: Arc<SubtreeEnumerator<GoogleWorkspaceClient>>,
    pub clients: Arc<ClientMetricsService<GoogleWorkspaceClient>>,
    pub briefs: Arc<BriefService<GoogleWorkspaceClient>>,
    /// Used by `/briefs create` when no template is given.
    pub default_template_id: Option<String>,
}

/// Root `/briefs` command. Subcommands do the work.
#[poise::command(
    slash_command,
    subcommands("search", "folders", "scopes", "client", "create", "refresh")
)]
pub async fn briefs(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "Developer brief commands:\n\
        `/briefs search [keyword] [scope]` - Find briefs, newest first (no keyword lists everything)\n\
        `/briefs folders` - Folders a new brief can be saved in\n\
        `/briefs scopes` - Folders a search can be narrowed to\n\
        `/briefs client <name>` - Ticket numbers for one client\n\
        `/briefs create ...` - Copy a template into a new brief\n\
        `/briefs refresh` - Forget cached folder trees (admins only)",
    )
    .await?;
    Ok(())
}

/// Search brief documents by keyword, newest first.
#[poise::command(slash_command)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Text to look for (leave empty to list every brief)"] keyword: Option<String>,
    #[description = "Only search inside this folder"]
    #[autocomplete = "autocomplete_scope"]
    scope: Option<String>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let mut scope_note = None;
    let scope_id = match scope.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(input) => {
            let choices = ctx.data().folders.scope_folders().await?;
            match match_choice(&choices, input) {
                Some(choice) => Some(choice.id.clone()),
                None => {
                    scope_note = Some(formatter::unrecognised_scope_note(input));
                    Some(input.to_string())
                }
            }
        }
        None => None,
    };

    let outcome = ctx
        .data()
        .search
        .search_documents(keyword.as_deref(), scope_id.as_deref())
        .await?;

    tracing::info!(
        user = %ctx.author().name,
        keyword = ?keyword,
        scope = ?scope_id,
        scope_recognised = scope_note.is_none(),
        results = outcome.documents.len(),
        diagnostics = outcome.diagnostics.len(),
        "Brief search"
    );

    let embed = formatter::search_embed(keyword.as_deref(), scope.as_deref(), &outcome);
    let mut reply = poise::CreateReply::default().embed(embed);
    if let Some(note) = scope_note {
        reply = reply.content(note);
    }
    ctx.send(reply).await?;
    Ok(())
}

/// List the technical SEO folders new briefs can be created in.
#[poise::command(slash_command)]
pub async fn folders(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let choices = ctx.data().folders.destination_folders().await?;
    let embed = formatter::folders_embed(
        "📂 Brief destinations",
        &choices,
        "No folders named \"Technical SEO\" were found.",
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List the folders a search can be narrowed to.
#[poise::command(slash_command)]
pub async fn scopes(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let choices = ctx.data().folders.scope_folders().await?;
    let embed = formatter::folders_embed(
        "🗂️ Search scopes",
        &choices,
        "The briefs folder has no subfolders.",
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the account lead and ticket numbers for a client.
#[poise::command(slash_command)]
pub async fn client(
    ctx: Context<'_>,
    #[description = "Client name"]
    #[autocomplete = "autocomplete_client"]
    name: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().clients.client(&name).await? {
        Some((name, metrics)) => {
            let embed = formatter::client_embed(&name, &metrics);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        None => {
            ctx.say(format!("No client called `{}` in the accounts sheet.", name.trim()))
                .await?;
        }
    }
    Ok(())
}

/// Create a new brief from a template document.
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Client name"]
    #[autocomplete = "autocomplete_client"]
    client: String,
    #[description = "Reference number, e.g. REQ-12"] ref_no: String,
    #[description = "Issue category"] category: String,
    #[description = "Issue name"] issue: String,
    #[description = "Priority"] priority: String,
    #[description = "Folder to save the brief in"]
    #[autocomplete = "autocomplete_destination"]
    folder: String,
    #[description = "Template document link or id (defaults to the configured template)"]
    template: Option<String>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let template_id = match template.as_deref() {
        Some(raw) => match extract_document_id(raw) {
            Some(id) => id,
            None => {
                ctx.say("That doesn't look like a Google Docs link or document id.")
                    .await?;
                return Ok(());
            }
        },
        None => match ctx.data().default_template_id.clone() {
            Some(id) => id,
            None => {
                ctx.say("No template given and `BRIEF_TEMPLATE_ID` is not configured.")
                    .await?;
                return Ok(());
            }
        },
    };

    let destinations = ctx.data().folders.destination_folders().await?;
    let target_folder_id = resolve_choice(&destinations, &folder);
    let folder_label = destinations
        .iter()
        .find(|choice| choice.id == target_folder_id)
        .map(|choice| choice.path.clone())
        .unwrap_or_else(|| format!("`{}`", target_folder_id));

    let request = BriefRequest {
        template_id,
        target_folder_id,
        client_name: client,
        ref_no,
        issue_category: category,
        issue_name: issue,
        priority,
    };

    match ctx.data().briefs.create_brief(&request).await {
        Ok(outcome) => {
            tracing::info!(
                user = %ctx.author().name,
                document_id = %outcome.document_id,
                title = %outcome.title,
                "Brief created"
            );
            let embed = formatter::brief_embed(&outcome, &folder_label);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(err @ BriefError::Substitution { .. }) => {
            let orphan = err.orphaned_document().unwrap_or_default();
            ctx.say(format!(
                "The template was copied but filling it in failed: {}\n\
                 The half-made copy is still in Drive: {}\n\
                 Please delete it before trying again.",
                err,
                crate::core::briefs::document_link(orphan)
            ))
            .await?;
        }
        Err(err) => {
            ctx.say(format!("Could not create the brief: {}", err)).await?;
        }
    }
    Ok(())
}

/// Forget cached folder trees so new folders show up in searches.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn refresh(
    ctx: Context<'_>,
    #[description = "Only forget this search scope (default: everything)"]
    #[autocomplete = "autocomplete_scope"]
    scope: Option<String>,
) -> Result<(), Error> {
    let subtrees = &ctx.data().subtrees;

    match scope.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(input) => {
            ctx.defer().await?;
            let choices = ctx.data().folders.scope_folders().await?;
            let recognised = match_choice(&choices, input).is_some();
            let folder_id = resolve_choice(&choices, input);
            let removed = subtrees.invalidate(&folder_id);
            tracing::info!(user = %ctx.author().name, folder_id = %folder_id, removed, recognised, "Subtree cache entry invalidated");
            let mut message = if removed {
                format!("Forgot the cached folder tree for `{}`.", input)
            } else {
                format!("`{}` was not cached.", input)
            };
            if !recognised {
                message.push('\n');
                message.push_str(&formatter::unrecognised_scope_note(input));
            }
            ctx.say(message).await?;
        }
        None => {
            let cleared = subtrees.clear();
            tracing::info!(user = %ctx.author().name, cleared, "Subtree cache cleared");
            ctx.say(format!("Cleared {} cached folder tree(s).", cleared))
                .await?;
        }
    }

    tracing::debug!(remaining = subtrees.cached_roots(), "Subtree cache size");
    Ok(())
}

async fn autocomplete_scope<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let choices = ctx.data().folders.scope_folders().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Scope autocomplete failed");
        Vec::new()
    });
    formatter::filter_choices(choices.iter().map(formatter::choice_value), partial).into_iter()
}

async fn autocomplete_destination<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let choices = ctx
        .data()
        .folders
        .destination_folders()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Folder autocomplete failed");
            Vec::new()
        });
    formatter::filter_choices(choices.iter().map(formatter::choice_value), partial).into_iter()
}

async fn autocomplete_client<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let clients = ctx
        .data()
        .clients
        .read_client_metrics()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Client autocomplete failed");
            Default::default()
        });
    formatter::filter_choices(clients.into_keys(), partial).into_iter()
}
