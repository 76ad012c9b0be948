//! Trigger command handlers, including the live `watch` view.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use tabled::Tabled;

use conjure_core::view::{
    EMPTY_TRIGGERS_MESSAGE, KindFilter, LOADING_MESSAGE, ListFilter, TRIGGERS_ERROR_MESSAGE,
};
use conjure_core::{
    Command as CoreCommand, CommandResult, CreateTriggerRequest, Dashboard, EffectParameters,
    EntityId, QueryState, Trigger, UpdateTriggerRequest,
};

use crate::cli::{
    ConditionArgs, FilterArgs, GlobalOpts, OutputFormat, TriggersArgs, TriggersCommand,
};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TriggerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Effect")]
    effect: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn row(t: &Arc<Trigger>, color: bool) -> TriggerRow {
    TriggerRow {
        id: t.id.to_string(),
        name: t.name.clone(),
        condition: t.condition.to_string(),
        effect: t
            .effect_id
            .as_ref()
            .map_or_else(|| "-".into(), ToString::to_string),
        status: output::status_badge(t.enabled, color),
        created: t
            .created_at
            .map_or_else(|| "-".into(), |at| at.format("%Y-%m-%d %H:%M").to_string()),
    }
}

fn detail(t: &Trigger) -> String {
    let mut lines = vec![
        format!("ID:          {}", t.id),
        format!("Name:        {}", t.name),
        format!("Condition:   {}", t.condition),
        format!(
            "Effect:      {}",
            t.effect_id.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Status:      {}", t.status_label()),
        format!(
            "Created:     {}",
            t.created_at.map_or_else(|| "-".into(), |at| at.to_rfc3339())
        ),
        format!("Description: {}", t.description.as_deref().unwrap_or("-")),
    ];
    for (key, value) in t.parameters.iter() {
        lines.push(format!("  {key:<12} {value}"));
    }
    lines.join("\n")
}

fn print_trigger(trigger: &Trigger, global: &GlobalOpts) {
    let out = output::render_single(&global.output, trigger, detail, |t| t.id.to_string());
    output::print_output(&out, global.quiet);
}

fn list_filter(filter: &FilterArgs) -> ListFilter {
    let kind = filter
        .kind
        .as_deref()
        .and_then(|k| k.parse::<KindFilter>().ok())
        .unwrap_or_default();
    ListFilter::new(filter.search.clone().unwrap_or_default(), kind)
}

/// Render a trigger list. An empty table becomes the empty-list message.
fn render_triggers(triggers: &[Arc<Trigger>], global: &GlobalOpts) -> String {
    if triggers.is_empty() && matches!(global.output, OutputFormat::Table) {
        return EMPTY_TRIGGERS_MESSAGE.into();
    }
    let color = output::should_color(&global.color);
    output::render_list(&global.output, triggers, |t| row(t, color), |t| t.id.to_string())
}

fn condition_from_args(
    args: &ConditionArgs,
) -> Result<Option<conjure_core::TriggerCondition>, CliError> {
    args.condition_type
        .as_deref()
        .map(|kind| util::parse_condition(kind, args.condition_value.as_deref()))
        .transpose()
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    dashboard: &Dashboard,
    args: TriggersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TriggersCommand::List {
            filter,
            limit,
            offset,
        } => {
            let spinner = util::spinner(global, LOADING_MESSAGE);
            let fetched = match limit {
                Some(limit) => dashboard.fetch_triggers_page(limit, offset).await.map(|page| {
                    tracing::debug!(total = page.total, "trigger page fetched");
                    page.triggers.into_iter().map(Arc::new).collect::<Vec<_>>()
                }),
                None => dashboard.fetch_triggers().await.map(|_| {
                    dashboard.store().triggers_snapshot().as_ref().clone()
                }),
            };
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let triggers = fetched?;

            let shown = list_filter(&filter).apply(&triggers);
            output::print_output(&render_triggers(&shown, global), global.quiet);
            Ok(())
        }

        TriggersCommand::Get { trigger } => {
            let id = EntityId::from(trigger);
            let found = dashboard
                .fetch_trigger(&id)
                .await
                .map_err(|e| util::not_found(e, "trigger", &id))?;
            print_trigger(&found, global);
            Ok(())
        }

        TriggersCommand::Create {
            name,
            condition,
            effect,
            disabled,
            description,
        } => {
            let condition = condition_from_args(&condition)?.ok_or_else(|| {
                CliError::Validation {
                    field: "when".into(),
                    reason: "a condition type is required (e.g. --when event --value player_join)"
                        .into(),
                }
            })?;
            let req = CreateTriggerRequest {
                name,
                condition,
                effect_id: effect.map(EntityId::from),
                enabled: !disabled,
                description,
                parameters: EffectParameters::new(),
            };

            let result = dashboard.execute(CoreCommand::CreateTrigger(req)).await?;
            if let CommandResult::Trigger(trigger) = result {
                print_trigger(&trigger, global);
            }
            Ok(())
        }

        TriggersCommand::Update {
            trigger,
            name,
            condition,
            effect,
            enabled,
            description,
        } => {
            let update = UpdateTriggerRequest {
                name,
                condition: condition_from_args(&condition)?,
                effect_id: effect.map(EntityId::from),
                enabled,
                description,
                parameters: None,
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change".into(),
                });
            }

            let id = EntityId::from(trigger);
            let result = dashboard
                .execute(CoreCommand::UpdateTrigger {
                    id: id.clone(),
                    update,
                })
                .await
                .map_err(|e| util::not_found(e, "trigger", &id))?;
            if let CommandResult::Trigger(trigger) = result {
                print_trigger(&trigger, global);
            }
            Ok(())
        }

        TriggersCommand::Delete { trigger } => {
            let id = EntityId::from(trigger);
            if !util::confirm(&format!("Delete trigger {id}?"), global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::DeleteTrigger { id: id.clone() })
                .await
                .map_err(|e| util::not_found(e, "trigger", &id))?;
            if !global.quiet {
                eprintln!("Deleted trigger {id}");
            }
            Ok(())
        }

        TriggersCommand::Toggle { trigger } => {
            let id = EntityId::from(trigger);
            let result = dashboard
                .execute(CoreCommand::ToggleTrigger { id: id.clone() })
                .await
                .map_err(|e| util::not_found(e, "trigger", &id))?;
            if let CommandResult::Trigger(trigger) = result {
                if matches!(global.output, OutputFormat::Table) {
                    output::print_output(
                        &format!("Trigger {} is now {}", trigger.id, trigger.status_label()),
                        global.quiet,
                    );
                } else {
                    print_trigger(&trigger, global);
                }
            }
            Ok(())
        }

        TriggersCommand::Cancel { trigger } => {
            let id = EntityId::from(trigger);
            if !util::confirm(&format!("Cancel trigger {id}?"), global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::CancelTrigger { id: id.clone() })
                .await
                .map_err(|e| util::not_found(e, "trigger", &id))?;
            if !global.quiet {
                eprintln!("Cancelled trigger {id}");
            }
            Ok(())
        }

        TriggersCommand::Watch { filter } => watch(dashboard, &filter, global).await,
    }
}

// ── Live view ───────────────────────────────────────────────────────

/// What the live view shows for one query state.
fn render_state(
    state: &QueryState<Vec<Trigger>>,
    dashboard: &Dashboard,
    filter: &ListFilter,
    global: &GlobalOpts,
) -> String {
    if state.data.is_none() {
        return if state.error.is_some() {
            TRIGGERS_ERROR_MESSAGE.into()
        } else {
            LOADING_MESSAGE.into()
        };
    }

    let snapshot = dashboard.store().triggers_snapshot();
    let mut out = render_triggers(&filter.apply(snapshot.as_slice()), global);
    if matches!(global.output, OutputFormat::Table) {
        let age = dashboard
            .store()
            .triggers_data_age_secs()
            .map_or_else(String::new, |secs| format!(" (updated {secs}s ago)"));
        let stale = if state.error.is_some() {
            format!("\n{TRIGGERS_ERROR_MESSAGE}")
        } else {
            String::new()
        };
        out = format!("{out}\n{} triggers{age}{stale}", snapshot.len());
    }
    out
}

async fn watch(
    dashboard: &Dashboard,
    filter: &FilterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = list_filter(filter);
    let mut sub = dashboard.triggers();
    let clear = std::io::stdout().is_terminal() && matches!(global.output, OutputFormat::Table);

    let mut state = sub.state();
    loop {
        let frame = render_state(&state, dashboard, &filter, global);
        if clear {
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "\x1b[2J\x1b[H");
        }
        output::print_output(&frame, global.quiet);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = sub.changed() => match next {
                Some(next) => state = next,
                None => break,
            },
        }
    }
    Ok(())
}
