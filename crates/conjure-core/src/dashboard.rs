// ── Dashboard facade ──
//
// Owns the API client, the echo store, and every query. Reads go through
// queries (shared, de-duplicated, revalidating); writes go through the
// client and then force the affected queries to refetch.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use conjure_api::types::{EffectCreate, EffectUpdate, TriggerCreate, TriggerUpdate};
use conjure_api::{ApiClient, TokenStore, TransportConfig};

use crate::command::{
    Command, CommandResult, CreateEffectRequest, CreateTriggerRequest, UpdateEffectRequest,
    UpdateTriggerRequest,
};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::{Effect, EntityId, Session, Trigger, User};
use crate::query::{
    FetchResult, Query, QueryCache, QueryKey, Resource, RevalidateEvent, Subscription,
};
use crate::store::EchoStore;

/// One page from the paged trigger listing.
#[derive(Debug, Clone)]
pub struct TriggerPage {
    pub triggers: Vec<Trigger>,
    /// Total across all pages, as reported by the backend.
    pub total: usize,
}

// ── Fetchers ─────────────────────────────────────────────────────────

async fn fetch_effects(api: ApiClient) -> Result<Vec<Effect>, CoreError> {
    let list = api.list_effects().await?;
    Ok(list.into_iter().map(Effect::from).collect())
}

async fn fetch_triggers(api: ApiClient) -> Result<Vec<Trigger>, CoreError> {
    let list = api.list_triggers().await?;
    Ok(list.into_iter().map(Trigger::from).collect())
}

async fn fetch_effect(api: ApiClient, id: EntityId) -> Result<Effect, CoreError> {
    Ok(Effect::from(api.get_effect(id.as_str()).await?))
}

async fn fetch_trigger(api: ApiClient, id: EntityId) -> Result<Trigger, CoreError> {
    Ok(Trigger::from(api.get_trigger(id.as_str()).await?))
}

fn notify_boxed<T: Send + Sync + 'static>(
    query: Query<T>,
    event: RevalidateEvent,
) -> BoxFuture<'static, bool> {
    async move { query.notify(event).await }.boxed()
}

/// Log a failed post-mutation refetch. The mutation itself succeeded, and
/// the failure is already recorded in the query's state.
fn log_refetch<T>(key: &QueryKey, result: &FetchResult<T>) {
    if let Err(e) = result {
        warn!(%key, error = %e, "revalidation after mutation failed");
    }
}

// ── Dashboard ────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Dropping the last clone
/// (or calling [`shutdown`](Self::shutdown)) stops every background task.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    api: ApiClient,
    store: Arc<EchoStore>,
    effects: Query<Vec<Effect>>,
    triggers: Query<Vec<Trigger>>,
    effect_items: QueryCache<Effect>,
    trigger_items: QueryCache<Trigger>,
    /// Root token; every query's token is a child of it.
    cancel: CancellationToken,
}

impl Drop for DashboardInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Dashboard {
    /// Build a dashboard talking to `config.api_url`.
    pub fn new(
        config: DashboardConfig,
        tokens: Arc<dyn TokenStore>,
        store: Arc<EchoStore>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let api = ApiClient::new(config.api_url.clone(), &transport, tokens)?;
        Ok(Self::with_api(config, api, store))
    }

    /// Build a dashboard around an existing client.
    pub fn with_api(config: DashboardConfig, api: ApiClient, store: Arc<EchoStore>) -> Self {
        let cancel = CancellationToken::new();

        let effects = {
            let api = api.clone();
            let sink = Arc::clone(&store);
            Query::builder(QueryKey::list(Resource::Effects), move || {
                fetch_effects(api.clone())
            })
            .policy(config.effects)
            .on_success(move |list: &Vec<Effect>| sink.set_effects(list.clone()))
            .cancel_with(&cancel)
            .build()
        };

        let triggers = {
            let api = api.clone();
            let sink = Arc::clone(&store);
            Query::builder(QueryKey::list(Resource::Triggers), move || {
                fetch_triggers(api.clone())
            })
            .policy(config.triggers)
            .on_success(move |list: &Vec<Trigger>| sink.set_triggers(list.clone()))
            .cancel_with(&cancel)
            .build()
        };

        Self {
            inner: Arc::new(DashboardInner {
                config,
                api,
                store,
                effects,
                triggers,
                effect_items: QueryCache::new(),
                trigger_items: QueryCache::new(),
                cancel,
            }),
        }
    }

    /// One-shot: build, run closure, shut down.
    ///
    /// Background revalidation is disabled since a single
    /// request-response cycle is all the caller needs.
    pub async fn oneshot<F, Fut, T>(
        config: DashboardConfig,
        tokens: Arc<dyn TokenStore>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let dashboard = Self::new(
            config.without_background_refresh(),
            tokens,
            Arc::new(EchoStore::new()),
        )?;
        let result = f(dashboard.clone()).await;
        dashboard.shutdown();
        result
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<EchoStore> {
        &self.inner.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn effects(&self) -> Subscription<Vec<Effect>> {
        self.inner.effects.subscribe()
    }

    pub fn triggers(&self) -> Subscription<Vec<Trigger>> {
        self.inner.triggers.subscribe()
    }

    pub fn effect(&self, id: &EntityId) -> Subscription<Effect> {
        self.effect_query(id).subscribe()
    }

    pub fn trigger(&self, id: &EntityId) -> Subscription<Trigger> {
        self.trigger_query(id).subscribe()
    }

    pub fn effects_query(&self) -> &Query<Vec<Effect>> {
        &self.inner.effects
    }

    pub fn triggers_query(&self) -> &Query<Vec<Trigger>> {
        &self.inner.triggers
    }

    fn effect_query(&self, id: &EntityId) -> Query<Effect> {
        self.inner.effect_items.get_or_insert_with(id, || {
            let api = self.inner.api.clone();
            let item = id.clone();
            Query::builder(QueryKey::item(Resource::Effects, id.clone()), move || {
                fetch_effect(api.clone(), item.clone())
            })
            .policy(self.inner.config.effects)
            .cancel_with(&self.inner.cancel)
            .build()
        })
    }

    fn trigger_query(&self, id: &EntityId) -> Query<Trigger> {
        self.inner.trigger_items.get_or_insert_with(id, || {
            let api = self.inner.api.clone();
            let item = id.clone();
            Query::builder(QueryKey::item(Resource::Triggers, id.clone()), move || {
                fetch_trigger(api.clone(), item.clone())
            })
            .policy(self.inner.config.triggers)
            .cancel_with(&self.inner.cancel)
            .build()
        })
    }

    // ── One-shot reads ───────────────────────────────────────────────

    /// Fetch the effect list (joining any in-flight fetch).
    pub async fn fetch_effects(&self) -> FetchResult<Vec<Effect>> {
        self.inner.effects.revalidate().await
    }

    pub async fn fetch_triggers(&self) -> FetchResult<Vec<Trigger>> {
        self.inner.triggers.revalidate().await
    }

    pub async fn fetch_effect(&self, id: &EntityId) -> FetchResult<Effect> {
        self.effect_query(id).revalidate().await
    }

    pub async fn fetch_trigger(&self, id: &EntityId) -> FetchResult<Trigger> {
        self.trigger_query(id).revalidate().await
    }

    /// One page of triggers. Partial listings never touch the echo store.
    pub async fn fetch_triggers_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<TriggerPage, CoreError> {
        let page = self.inner.api.list_triggers_page(limit, offset).await?;
        let total = page.total();
        Ok(TriggerPage {
            triggers: page.into_items().into_iter().map(Trigger::from).collect(),
            total,
        })
    }

    // ── Command execution ────────────────────────────────────────────

    /// Route a command to its endpoint.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::Cancelled);
        }

        match cmd {
            Command::CreateEffect(req) => self.create_effect(req).await.map(CommandResult::Effect),
            Command::UpdateEffect { id, update } => self
                .update_effect(&id, update)
                .await
                .map(CommandResult::Effect),
            Command::DeleteEffect { id } => {
                self.delete_effect(&id).await.map(|()| CommandResult::Ok)
            }
            Command::CreateTrigger(req) => {
                self.create_trigger(req).await.map(CommandResult::Trigger)
            }
            Command::UpdateTrigger { id, update } => self
                .update_trigger(&id, update)
                .await
                .map(CommandResult::Trigger),
            Command::DeleteTrigger { id } => {
                self.delete_trigger(&id).await.map(|()| CommandResult::Ok)
            }
            Command::ToggleTrigger { id } => {
                self.toggle_trigger(&id).await.map(CommandResult::Trigger)
            }
            Command::CancelTrigger { id } => {
                self.cancel_trigger(&id).await.map(|()| CommandResult::Ok)
            }
        }
    }

    // ── Effect mutations ─────────────────────────────────────────────

    pub async fn create_effect(&self, req: CreateEffectRequest) -> Result<Effect, CoreError> {
        let body = EffectCreate::from(req);
        let created = Effect::from(self.inner.api.create_effect(&body).await?);
        info!(id = %created.id, name = %created.name, "effect created");

        self.inner.store.add_effect(created.clone());
        self.refetch_effects(None).await;
        Ok(created)
    }

    pub async fn update_effect(
        &self,
        id: &EntityId,
        req: UpdateEffectRequest,
    ) -> Result<Effect, CoreError> {
        let body = EffectUpdate::from(req);
        let updated = Effect::from(self.inner.api.update_effect(id.as_str(), &body).await?);
        info!(%id, "effect updated");

        self.refetch_effects(Some(id)).await;
        Ok(updated)
    }

    pub async fn delete_effect(&self, id: &EntityId) -> Result<(), CoreError> {
        self.inner.api.delete_effect(id.as_str()).await?;
        info!(%id, "effect deleted");

        self.inner.effect_items.remove(id);
        self.refetch_effects(None).await;
        Ok(())
    }

    // ── Trigger mutations ────────────────────────────────────────────

    pub async fn create_trigger(&self, req: CreateTriggerRequest) -> Result<Trigger, CoreError> {
        let body = TriggerCreate::from(req);
        let created = Trigger::from(self.inner.api.create_trigger(&body).await?);
        info!(id = %created.id, name = %created.name, "trigger created");

        self.inner.store.add_trigger(created.clone());
        self.refetch_triggers(None).await;
        Ok(created)
    }

    pub async fn update_trigger(
        &self,
        id: &EntityId,
        req: UpdateTriggerRequest,
    ) -> Result<Trigger, CoreError> {
        let body = TriggerUpdate::from(req);
        let updated = Trigger::from(self.inner.api.update_trigger(id.as_str(), &body).await?);
        info!(%id, "trigger updated");

        self.refetch_triggers(Some(id)).await;
        Ok(updated)
    }

    pub async fn delete_trigger(&self, id: &EntityId) -> Result<(), CoreError> {
        self.inner.api.delete_trigger(id.as_str()).await?;
        info!(%id, "trigger deleted");

        self.inner.trigger_items.remove(id);
        self.refetch_triggers(None).await;
        Ok(())
    }

    /// Flip a trigger's enabled flag server-side.
    pub async fn toggle_trigger(&self, id: &EntityId) -> Result<Trigger, CoreError> {
        let toggled = Trigger::from(self.inner.api.toggle_trigger(id.as_str()).await?);
        info!(%id, enabled = toggled.enabled, "trigger toggled");

        self.refetch_triggers(Some(id)).await;
        Ok(toggled)
    }

    /// Cancel a pending trigger (removes it).
    pub async fn cancel_trigger(&self, id: &EntityId) -> Result<(), CoreError> {
        self.inner.api.cancel_trigger(id.as_str()).await?;
        info!(%id, "trigger cancelled");

        self.inner.trigger_items.remove(id);
        self.refetch_triggers(None).await;
        Ok(())
    }

    async fn refetch_effects(&self, id: Option<&EntityId>) {
        let list = &self.inner.effects;
        log_refetch(list.key(), &list.revalidate_now().await);
        if let Some(query) = id.and_then(|id| self.inner.effect_items.get(id)) {
            log_refetch(query.key(), &query.revalidate_now().await);
        }
    }

    async fn refetch_triggers(&self, id: Option<&EntityId>) {
        let list = &self.inner.triggers;
        log_refetch(list.key(), &list.revalidate_now().await);
        if let Some(query) = id.and_then(|id| self.inner.trigger_items.get(id)) {
            log_refetch(query.key(), &query.revalidate_now().await);
        }
    }

    // ── Session ──────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, CoreError> {
        Ok(Session::from(self.inner.api.login(email, password).await?))
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, CoreError> {
        Ok(Session::from(
            self.inner.api.register(email, username, password).await?,
        ))
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        Ok(self.inner.api.logout().await?)
    }

    pub async fn me(&self) -> Result<User, CoreError> {
        Ok(User::from(self.inner.api.me().await?))
    }

    /// Check the stored session with the backend. A rejected session is
    /// cleared; see [`ApiClient::verify_token`].
    pub async fn verify_session(&self) -> bool {
        self.inner.api.verify_token().await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), CoreError> {
        Ok(self.inner.api.request_password_reset(email).await?)
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.api.has_token()
    }

    // ── Revalidation signals ─────────────────────────────────────────

    /// The app regained focus. Returns how many queries revalidated.
    pub async fn focus(&self) -> usize {
        self.broadcast(RevalidateEvent::Focus).await
    }

    /// Connectivity came back. Returns how many queries revalidated.
    pub async fn reconnect(&self) -> usize {
        self.broadcast(RevalidateEvent::Reconnect).await
    }

    async fn broadcast(&self, event: RevalidateEvent) -> usize {
        let mut pending = vec![
            notify_boxed(self.inner.effects.clone(), event),
            notify_boxed(self.inner.triggers.clone(), event),
        ];
        pending.extend(
            self.inner
                .effect_items
                .all()
                .into_iter()
                .map(|q| notify_boxed(q, event)),
        );
        pending.extend(
            self.inner
                .trigger_items
                .all()
                .into_iter()
                .map(|q| notify_boxed(q, event)),
        );

        let revalidated = join_all(pending).await.into_iter().filter(|ran| *ran).count();
        debug!(%event, revalidated, "revalidation signal handled");
        revalidated
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop all polling and fail pending fetches. Subscriptions keep
    /// their last state.
    pub fn shutdown(&self) {
        if !self.inner.cancel.is_cancelled() {
            info!("dashboard shutting down");
            self.inner.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}
