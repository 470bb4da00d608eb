//! Start-up sequence and configuration reactions of the background.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use linguist_config::{migrate_all, AppConfig, AppIconConfig, ConfigStore, MigrationReport};
use linguist_protocol::{ErrorKind, RequestMessage, ResponseMessage};
use linguist_store::{KeyValueBackend, Observable, Subscription};

use crate::collaborators::Collaborators;
use crate::error::{LifecycleError, LifecycleResult};
use crate::handlers;
use crate::router::Router;
use crate::services::Services;

/// Capacity of the configuration update channel per subscriber.
const CONFIG_EVENTS_CAPACITY: usize = 64;

/// Start-up progress. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    NotStarted,
    Migrating,
    StoreReady,
    ServicesBuilt,
    HandlersRegistered,
    Reactive,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Migrating => "migrating",
            Self::StoreReady => "store-ready",
            Self::ServicesBuilt => "services-built",
            Self::HandlersRegistered => "handlers-registered",
            Self::Reactive => "reactive",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Reaction {
    name: &'static str,
    subscription: Subscription,
}

/// The background process: owns storage, services, the request router and
/// the reactions to configuration changes.
pub struct Background {
    backend: Arc<dyn KeyValueBackend>,
    collaborators: Collaborators,
    started: AtomicBool,
    state: Mutex<LifecycleState>,
    migration: OnceLock<MigrationReport>,
    router: OnceLock<Router<Services>>,
    reactions: Mutex<Vec<Reaction>>,
    config_events: broadcast::Sender<AppConfig>,
}

impl Background {
    /// Create a background that has not started yet.
    pub fn new(backend: Arc<dyn KeyValueBackend>, collaborators: Collaborators) -> Self {
        let (config_events, _) = broadcast::channel(CONFIG_EVENTS_CAPACITY);
        Self {
            backend,
            collaborators,
            started: AtomicBool::new(false),
            state: Mutex::new(LifecycleState::NotStarted),
            migration: OnceLock::new(),
            router: OnceLock::new(),
            reactions: Mutex::new(Vec::new()),
            config_events,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().expect("lock poisoned")
    }

    /// Migrations applied by [`start`](Self::start), once it got that far.
    pub fn migration_report(&self) -> Option<&MigrationReport> {
        self.migration.get()
    }

    /// Services, available once handlers are registered.
    pub fn services(&self) -> Option<&Arc<Services>> {
        self.router.get().map(Router::context)
    }

    /// Run the start-up sequence. May be called once; a second call fails
    /// with [`LifecycleError::AlreadyStarted`] even if the first one failed.
    pub async fn start(&self) -> LifecycleResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::AlreadyStarted);
        }

        self.transition(LifecycleState::Migrating);
        let report = migrate_all(self.backend.as_ref()).await?;
        info!(
            applied = report.applied_count(),
            version = report.to_version,
            "migrations complete"
        );
        let _ = self.migration.set(report);

        let config = Arc::new(ConfigStore::new(Arc::clone(&self.backend)));
        let observable = config.observable().await?;
        self.transition(LifecycleState::StoreReady);

        let services = Arc::new(Services::build(Arc::clone(&self.backend), config, &self.collaborators));
        services.translators.apply_translators().await?;
        self.transition(LifecycleState::ServicesBuilt);

        let mut router = Router::new(Arc::clone(&services));
        handlers::register_all(&mut router)?;
        if self.router.set(router).is_err() {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.transition(LifecycleState::HandlersRegistered);

        let reactions = self.wire_reactions(&services, &observable);
        info!(count = reactions.len(), "reactions wired");
        *self.reactions.lock().expect("lock poisoned") = reactions;
        self.transition(LifecycleState::Reactive);
        Ok(())
    }

    /// Answer a request. Before handlers are registered every request is
    /// answered with `UnknownRequest`, including the readiness check.
    pub async fn dispatch(&self, request: RequestMessage) -> ResponseMessage {
        match self.router.get() {
            Some(router) => router.dispatch(request).await,
            None => ResponseMessage::error(
                request.correlation_id,
                ErrorKind::UnknownRequest,
                format!("background is not ready for {:?}", request.request_name),
            ),
        }
    }

    /// Receive every committed configuration snapshot.
    pub fn subscribe_config(&self) -> broadcast::Receiver<AppConfig> {
        self.config_events.subscribe()
    }

    /// Detach every reaction. Requests are still served.
    pub fn shutdown(&self) {
        let reactions = std::mem::take(&mut *self.reactions.lock().expect("lock poisoned"));
        for reaction in &reactions {
            reaction.subscription.unsubscribe();
            debug!(reaction = reaction.name, "reaction detached");
        }
        if self.state() == LifecycleState::Reactive {
            self.transition(LifecycleState::Stopped);
        }
    }

    fn transition(&self, next: LifecycleState) {
        let mut state = self.state.lock().expect("lock poisoned");
        debug_assert!(next > *state, "lifecycle moved backwards: {} -> {next}", *state);
        info!(from = %*state, to = %next, "lifecycle transition");
        *state = next;
    }

    fn wire_reactions(
        &self,
        services: &Arc<Services>,
        config: &Observable<AppConfig, AppConfig>,
    ) -> Vec<Reaction> {
        let mut reactions = Vec::new();

        let events = self.config_events.clone();
        reactions.push(Reaction {
            name: "config-broadcast",
            subscription: config.watch(move |snapshot: &AppConfig| {
                // No receivers is fine.
                let _ = events.send(snapshot.clone());
            }),
        });

        let theme = Arc::clone(&self.collaborators.theme);
        reactions.push(react(
            config,
            "app-icon",
            |cfg: &AppConfig| cfg.app_icon.clone(),
            move |icon: AppIconConfig| {
                let theme = Arc::clone(&theme);
                async move { theme.set_app_icon(&icon).await }
            },
        ));

        let cache = Arc::clone(&services.cache);
        reactions.push(react(
            config,
            "cache-disable",
            |cfg: &AppConfig| cfg.scheduler.use_cache,
            move |use_cache: bool| {
                let cache = Arc::clone(&cache);
                async move {
                    if !use_cache {
                        let removed = cache.clear(None);
                        info!(removed, "cache disabled, entries cleared");
                    }
                    Ok(())
                }
            },
        ));

        let svc = Arc::clone(services);
        reactions.push(react(
            config,
            "forget-text",
            |cfg: &AppConfig| cfg.text_translator.remember_text,
            move |remember: bool| {
                let svc = Arc::clone(&svc);
                async move {
                    if !remember {
                        svc.text_translator.forget_text().await?;
                    }
                    Ok::<(), anyhow::Error>(())
                }
            },
        ));

        let menu = Arc::clone(&self.collaborators.selection_menu);
        reactions.push(react(
            config,
            "selection-context-menu",
            |cfg: &AppConfig| cfg.select_translator.context_menu_enabled(),
            move |enabled: bool| {
                let menu = Arc::clone(&menu);
                async move {
                    match enabled {
                        true => menu.enable().await,
                        false => menu.disable().await,
                    }
                }
            },
        ));

        let menu = Arc::clone(&self.collaborators.page_menu);
        reactions.push(react(
            config,
            "page-context-menu",
            |cfg: &AppConfig| cfg.page_translator.enable_context_menu,
            move |enabled: bool| {
                let menu = Arc::clone(&menu);
                async move {
                    match enabled {
                        true => menu.enable().await,
                        false => menu.disable().await,
                    }
                }
            },
        ));

        reactions
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Background")
            .field("state", &self.state())
            .finish()
    }
}

/// Watch a projection of the configuration and run `effect` for every
/// delivered value.
///
/// Effects of one reaction run one at a time, in delivery order, on a
/// dedicated task; a failing effect is logged and does not stop the reaction.
fn react<V, P, E, Fut>(
    config: &Observable<AppConfig, AppConfig>,
    name: &'static str,
    project: P,
    effect: E,
) -> Reaction
where
    V: Clone + PartialEq + Send + 'static,
    P: Fn(&AppConfig) -> V + Send + Sync + 'static,
    E: Fn(V) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<V>();
    tokio::spawn(async move {
        while let Some(value) = rx.recv().await {
            if let Err(err) = effect(value).await {
                warn!(reaction = name, error = %err, "reaction failed");
            }
        }
        debug!(reaction = name, "reaction stopped");
    });

    let subscription = config.map(project).watch(move |value: &V| {
        // The worker only stops after the watcher is detached.
        let _ = tx.send(value.clone());
    });
    Reaction { name, subscription }
}
