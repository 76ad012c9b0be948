//! Effect command handlers.

use std::sync::Arc;

use tabled::Tabled;

use conjure_core::view::{LOADING_MESSAGE, KindFilter, ListPage, ListView, PagePolicy, Paginator};
use conjure_core::{
    Command as CoreCommand, CommandResult, CreateEffectRequest, Dashboard, Effect, EffectKind,
    EntityId, UpdateEffectRequest,
};

use crate::cli::{EffectsArgs, EffectsCommand, FilterArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EffectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

impl From<&Arc<Effect>> for EffectRow {
    fn from(e: &Arc<Effect>) -> Self {
        Self {
            id: e.id.to_string(),
            name: e.name.clone(),
            kind: e.kind.to_string(),
            intensity: e
                .parameters
                .intensity()
                .map_or_else(|| "-".into(), |v| format!("{v:.2}")),
            duration: e
                .parameters
                .duration_ms()
                .map_or_else(|| "-".into(), |ms| format!("{ms}ms")),
        }
    }
}

fn detail(e: &Effect) -> String {
    let mut lines = vec![
        format!("ID:          {}", e.id),
        format!("Name:        {}", e.name),
        format!("Type:        {}", e.kind),
        format!("Description: {}", e.description.as_deref().unwrap_or("-")),
    ];
    if e.parameters.is_empty() {
        lines.push("Parameters:  -".into());
    } else {
        lines.push("Parameters:".into());
        for (key, value) in e.parameters.iter() {
            lines.push(format!("  {key:<12} {value}"));
        }
    }
    lines.join("\n")
}

fn pager_footer(page: &ListPage<Effect>) -> String {
    format!(
        "Page {} of {} ({} effects)",
        page.page, page.page_count, page.total_matches
    )
}

fn print_effect(effect: &Effect, global: &GlobalOpts) {
    let out = output::render_single(&global.output, effect, detail, |e| e.id.to_string());
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: EffectsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EffectsCommand::List {
            filter,
            page,
            page_size,
            all,
        } => list(dashboard, &filter, page, page_size, all, global).await,

        EffectsCommand::Get { effect } => {
            let id = EntityId::from(effect);
            let found = dashboard
                .fetch_effect(&id)
                .await
                .map_err(|e| util::not_found(e, "effect", &id))?;
            print_effect(&found, global);
            Ok(())
        }

        EffectsCommand::Create {
            name,
            kind,
            params,
            description,
            from_file,
        } => {
            let req = if let Some(path) = from_file {
                serde_json::from_value::<CreateEffectRequest>(util::read_json_file(&path)?)?
            } else {
                CreateEffectRequest {
                    name: name.unwrap_or_default(),
                    kind: EffectKind::from(kind.unwrap_or_default()),
                    parameters: util::parse_params(&params)?,
                    description,
                }
            };
            if req.name.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: "effect name cannot be empty".into(),
                });
            }

            let result = dashboard.execute(CoreCommand::CreateEffect(req)).await?;
            if let CommandResult::Effect(effect) = result {
                print_effect(&effect, global);
            }
            Ok(())
        }

        EffectsCommand::Update {
            effect,
            name,
            kind,
            params,
            description,
        } => {
            let update = UpdateEffectRequest {
                name,
                kind: kind.map(EffectKind::from),
                parameters: if params.is_empty() {
                    None
                } else {
                    Some(util::parse_params(&params)?)
                },
                description,
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass at least one of \
                             --name, --type, --param, --description"
                        .into(),
                });
            }

            let id = EntityId::from(effect);
            let result = dashboard
                .execute(CoreCommand::UpdateEffect {
                    id: id.clone(),
                    update,
                })
                .await
                .map_err(|e| util::not_found(e, "effect", &id))?;
            if let CommandResult::Effect(effect) = result {
                print_effect(&effect, global);
            }
            Ok(())
        }

        EffectsCommand::Delete { effect } => {
            let id = EntityId::from(effect);
            if !util::confirm(&format!("Delete effect {id}?"), global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::DeleteEffect { id: id.clone() })
                .await
                .map_err(|e| util::not_found(e, "effect", &id))?;
            if !global.quiet {
                eprintln!("Deleted effect {id}");
            }
            Ok(())
        }
    }
}

async fn list(
    dashboard: &Dashboard,
    filter: &FilterArgs,
    page: usize,
    page_size: Option<usize>,
    all: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner(global, LOADING_MESSAGE);
    let fetched = dashboard.fetch_effects().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    fetched?;

    // The list query writes through to the echo store; render its snapshot.
    let effects = dashboard.store().effects_snapshot();

    let size = if all {
        effects.len().max(1)
    } else {
        page_size.unwrap_or(dashboard.config().page_size)
    };
    let mut view = ListView::new(Paginator::new(size), PagePolicy::Clamp);
    if let Some(ref search) = filter.search {
        view.set_search(search.as_str());
    }
    if let Some(ref kind) = filter.kind {
        let kind: KindFilter = kind.parse().unwrap_or_default();
        view.set_kind(kind);
    }
    view.set_page(page);
    let rendered = view.render(effects.as_slice());

    let mut out = output::render_list(
        &global.output,
        &rendered.items,
        |e| EffectRow::from(e),
        |e| e.id.to_string(),
    );
    if matches!(global.output, OutputFormat::Table) {
        if rendered.is_empty() {
            out = "No effects found.".into();
        } else if rendered.shows_pager() {
            out = format!("{out}\n{}", pager_footer(&rendered));
        }
    }
    output::print_output(&out, global.quiet);
    Ok(())
}
