use crate::api::{DashboardApi, Overview};
use crate::debug::DebugStore;
use crate::export::{self, ExportTarget};
use crate::models::{ApiCallRecord, DeploymentOption};
use crate::namespaces::{Favorites, NamespaceFilter};
use crate::summary;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Secret};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Nodes,
    Pods,
    Deployments,
    Secrets,
    Namespaces,
    Debug,
}

impl Tab {
    pub const ALL: [Tab; 7] =
        [Tab::Overview, Tab::Nodes, Tab::Pods, Tab::Deployments, Tab::Secrets, Tab::Namespaces, Tab::Debug];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Nodes => "Nodes",
            Tab::Pods => "Pods",
            Tab::Deployments => "Deployments",
            Tab::Secrets => "Secrets",
            Tab::Namespaces => "Namespaces",
            Tab::Debug => "Debug",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn offset(self, by: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        Tab::ALL[(self.index() as isize + by).rem_euclid(len) as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugView {
    Response,
    Request,
    Metadata,
}

pub enum Payload {
    Overview(Overview),
    Nodes(Vec<Node>),
    Pods(Vec<Pod>),
    Deployments(Vec<Deployment>),
    Secrets(Vec<Secret>),
    Namespaces(Vec<Namespace>),
}

pub enum Update {
    Loaded(Result<Payload, String>),
    Action(Result<String, String>),
}

pub struct App {
    pub api: DashboardApi,
    pub store: Arc<DebugStore>,
    pub context: String,
    pub tab: Tab,
    pub namespace: NamespaceFilter,
    pub known_namespaces: Vec<String>,
    pub favorites: Favorites,
    pub overview: Option<Overview>,
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub deployments: Vec<Deployment>,
    pub secrets: Vec<Secret>,
    pub namespaces: Vec<Namespace>,
    pub selected: usize,
    pub loading: usize,
    pub error: Option<String>,
    pub status: Option<String>,
    pub reveal_secret: bool,
    pub confirm_restart: Option<DeploymentOption>,
    /// Id of the selected record, so eviction or new calls never shift it.
    pub debug_selected: Option<u64>,
    pub debug_view: DebugView,
    pub should_quit: bool,
    dirty: bool,
    drawn_version: Option<u64>,
    tx: mpsc::UnboundedSender<Update>,
    rx: mpsc::UnboundedReceiver<Update>,
}

impl App {
    pub fn new(
        api: DashboardApi,
        store: Arc<DebugStore>,
        context: String,
        namespace: NamespaceFilter,
        favorites: Favorites,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            store,
            context,
            tab: Tab::Overview,
            namespace,
            known_namespaces: Vec::new(),
            favorites,
            overview: None,
            nodes: Vec::new(),
            pods: Vec::new(),
            deployments: Vec::new(),
            secrets: Vec::new(),
            namespaces: Vec::new(),
            selected: 0,
            loading: 0,
            error: None,
            status: None,
            reveal_secret: false,
            confirm_restart: None,
            debug_selected: None,
            debug_view: DebugView::Response,
            should_quit: false,
            dirty: true,
            drawn_version: None,
            tx,
            rx,
        }
    }

    /// Fetches the namespace list alongside the current tab.
    pub fn start(&mut self) {
        self.spawn_load(Tab::Namespaces);
        if self.tab != Tab::Namespaces {
            self.refresh();
        }
    }

    pub fn refresh(&mut self) {
        self.spawn_load(self.tab);
    }

    fn spawn_load(&mut self, tab: Tab) {
        if tab == Tab::Debug {
            return;
        }
        self.loading += 1;
        self.error = None;
        let api = self.api.clone();
        let ns = self.namespace.as_query().map(str::to_string);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ns = ns.as_deref();
            let result = match tab {
                Tab::Overview => api.overview().await.map(Payload::Overview),
                Tab::Nodes => api.nodes().await.map(Payload::Nodes),
                Tab::Pods => api.pods(ns).await.map(Payload::Pods),
                Tab::Deployments => api.deployments(ns).await.map(Payload::Deployments),
                Tab::Secrets => api.secrets(ns).await.map(Payload::Secrets),
                Tab::Namespaces | Tab::Debug => api.namespaces().await.map(Payload::Namespaces),
            };
            let _ = tx.send(Update::Loaded(result.map_err(|e| e.to_string())));
        });
    }

    pub fn drain_updates(&mut self) {
        while let Ok(update) = self.rx.try_recv() {
            self.apply(update);
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True when app state or the debug log changed since the last call.
    pub fn needs_redraw(&mut self) -> bool {
        let version = self.store.version();
        let redraw = self.dirty || self.drawn_version != Some(version);
        self.dirty = false;
        self.drawn_version = Some(version);
        redraw
    }

    pub fn apply(&mut self, update: Update) {
        self.dirty = true;
        match update {
            Update::Loaded(result) => {
                self.loading = self.loading.saturating_sub(1);
                match result {
                    // Previous data stays on screen after a failed refresh.
                    Err(e) => self.error = Some(e),
                    Ok(Payload::Overview(o)) => self.overview = Some(o),
                    Ok(Payload::Nodes(n)) => self.nodes = n,
                    Ok(Payload::Pods(p)) => self.pods = p,
                    Ok(Payload::Deployments(d)) => self.deployments = d,
                    Ok(Payload::Secrets(s)) => self.secrets = s,
                    Ok(Payload::Namespaces(n)) => {
                        self.known_namespaces = n.iter().filter_map(|ns| ns.metadata.name.clone()).collect();
                        self.namespaces = n;
                    }
                }
                self.clamp_selection();
            }
            Update::Action(result) => {
                self.loading = self.loading.saturating_sub(1);
                match result {
                    Ok(msg) => {
                        self.status = Some(msg);
                        self.refresh();
                    }
                    Err(e) => self.error = Some(e),
                }
            }
        }
    }

    pub fn row_count(&self) -> usize {
        match self.tab {
            Tab::Overview => 0,
            Tab::Nodes => self.nodes.len(),
            Tab::Pods => self.pods.len(),
            Tab::Deployments => self.deployments.len(),
            Tab::Secrets => self.secrets.len(),
            Tab::Namespaces => self.namespaces.len(),
            Tab::Debug => self.store.len(),
        }
    }

    fn clamp_selection(&mut self) {
        if self.tab != Tab::Debug {
            self.selected = self.selected.min(self.row_count().saturating_sub(1));
        }
    }

    fn move_selection(&mut self, down: bool) {
        if self.tab == Tab::Debug {
            return self.move_debug_selection(down);
        }
        let count = self.row_count();
        self.selected = if down { (self.selected + 1).min(count.saturating_sub(1)) } else { self.selected.saturating_sub(1) };
        self.reveal_secret = false;
    }

    /// Position of the selected record in `log`, if it is still there.
    pub fn debug_position(&self, log: &[ApiCallRecord]) -> Option<usize> {
        let id = self.debug_selected?;
        log.iter().position(|r| r.id == id)
    }

    fn move_debug_selection(&mut self, down: bool) {
        let log = self.store.log();
        if log.is_empty() {
            self.debug_selected = None;
            return;
        }
        let next = match self.debug_position(&log) {
            None => 0,
            Some(i) if down => (i + 1).min(log.len() - 1),
            Some(i) => i.saturating_sub(1),
        };
        self.debug_selected = Some(log[next].id);
    }

    fn open_debug_record(&mut self) {
        if self.debug_position(&self.store.log()).is_none() {
            self.move_debug_selection(true);
        }
        self.debug_view = DebugView::Response;
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.selected = 0;
        self.reveal_secret = false;
        self.status = None;
        self.refresh();
    }

    /// Favourites come first when cycling.
    pub fn namespace_order(&self) -> Vec<String> {
        let mut order: Vec<String> = self.favorites.names().to_vec();
        order.extend(self.known_namespaces.iter().filter(|n| !self.favorites.contains(n)).cloned());
        order
    }

    fn cycle_namespace(&mut self) {
        self.namespace = self.namespace.cycle(&self.namespace_order());
        self.selected = 0;
        self.refresh();
    }

    fn toggle_favorite(&mut self) {
        let target = match (&self.tab, &self.namespace) {
            (Tab::Namespaces, _) => self.namespaces.get(self.selected).and_then(|n| n.metadata.name.clone()),
            (_, NamespaceFilter::Only(ns)) => Some(ns.clone()),
            _ => None,
        };
        let Some(ns) = target else { return };
        let now = self.favorites.toggle(&ns);
        self.status = Some(if now { format!("★ {ns} added to favourites") } else { format!("{ns} removed from favourites") });
        if let Err(e) = self.favorites.save() {
            warn!(error = %e, "could not save favourite namespaces");
            self.error = Some(e.to_string());
        }
    }

    pub fn selected_deployment(&self) -> Option<DeploymentOption> {
        self.deployments.get(self.selected).map(|d| DeploymentOption {
            name: summary::name_of(&d.metadata),
            namespace: summary::namespace_of(&d.metadata),
        })
    }

    fn restart_confirmed(&mut self, target: DeploymentOption) {
        self.loading += 1;
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api
                .restart_deployment(&target.namespace, &target.name)
                .await
                .map(|r| if r.message.is_empty() { format!("Restarted {target}") } else { r.message })
                .map_err(|e| e.to_string());
            let _ = tx.send(Update::Action(result));
        });
    }

    fn copy_selected(&mut self) {
        let target = match self.debug_view {
            DebugView::Request => ExportTarget::Request,
            DebugView::Response | DebugView::Metadata => ExportTarget::Response,
        };
        let Some(id) = self.debug_selected else {
            self.error = Some("No API call selected".to_string());
            return;
        };
        let copied = export::export_record(&self.store, id, target)
            .map_err(anyhow::Error::from)
            .and_then(|text| export::copy_to_clipboard(&text));
        match copied {
            Ok(()) => self.status = Some("Copied to clipboard".to_string()),
            Err(e) => self.error = Some(format!("Copy failed: {e}")),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.dirty = true;
        if let Some(target) = self.confirm_restart.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.restart_confirmed(target);
            } else {
                self.status = Some("Restart cancelled".to_string());
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.offset(1)),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.offset(-1)),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('d') => {
                let on = self.store.toggle();
                self.debug_selected = None;
                self.status = Some(format!("Debug mode {}", if on { "ON" } else { "OFF" }));
            }
            KeyCode::Char('n') => self.cycle_namespace(),
            KeyCode::Char('f') => self.toggle_favorite(),
            KeyCode::Char('s') if self.tab == Tab::Secrets => self.reveal_secret = !self.reveal_secret,
            KeyCode::Char('R') if self.tab == Tab::Deployments => self.confirm_restart = self.selected_deployment(),
            KeyCode::Enter if self.tab == Tab::Debug => self.open_debug_record(),
            KeyCode::Char('1') if self.tab == Tab::Debug => self.debug_view = DebugView::Response,
            KeyCode::Char('2') if self.tab == Tab::Debug => self.debug_view = DebugView::Request,
            KeyCode::Char('3') if self.tab == Tab::Debug => self.debug_view = DebugView::Metadata,
            KeyCode::Char('y') if self.tab == Tab::Debug => self.copy_selected(),
            KeyCode::Char('c') if self.tab == Tab::Debug => {
                self.store.clear_log();
                self.debug_selected = None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::intercept;
    use crate::intercept::tests::FakeTransport;
    use crossterm::event::KeyEvent;
    use serde_json::json;

    fn app(fake: FakeTransport) -> App {
        let store = Arc::new(DebugStore::new());
        let api = DashboardApi::new(Arc::new(intercept(fake, store.clone())));
        App::new(api, store, "test".into(), NamespaceFilter::All, Favorites::load(None))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::from(code));
    }

    async fn settle(app: &mut App) {
        while app.loading > 0 {
            if let Some(update) = app.rx.recv().await {
                app.apply(update);
            }
        }
    }

    fn backend() -> FakeTransport {
        FakeTransport::default()
            .json("/api/overview", 200, json!({"nodes": 2}))
            .json("/api/nodes", 200, json!({"items": [{"metadata": {"name": "n1"}}]}))
            .json("/api/namespaces", 200, json!({"items": [{"metadata": {"name": "shop"}}, {"metadata": {"name": "blog"}}]}))
            .json("/api/deployments", 200, json!({"items": [{"metadata": {"name": "web", "namespace": "shop"}}]}))
            .json("/api/deployments/shop/web/restart", 200, json!({"message": "web restarted"}))
    }

    #[tokio::test]
    async fn debug_toggle_records_navigation_calls() {
        let mut app = app(backend());
        app.start();
        settle(&mut app).await;
        assert!(app.store.is_empty());
        assert_eq!(app.overview.as_ref().map(|o| o.nodes), Some(2));

        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.debug_mode());
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
            settle(&mut app).await;
        }
        let urls: Vec<_> = app.store.log().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["/api/nodes", "/api/pods", "/api/deployments"]);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_data() {
        let mut app = app(backend());
        app.switch_tab(Tab::Nodes);
        settle(&mut app).await;
        assert_eq!(app.nodes.len(), 1);

        // /api/pods has no route in the fake backend.
        app.switch_tab(Tab::Pods);
        settle(&mut app).await;
        assert!(app.error.is_some());
        assert_eq!(app.nodes.len(), 1);
    }

    #[tokio::test]
    async fn restart_needs_confirmation() {
        let mut app = app(backend());
        app.switch_tab(Tab::Deployments);
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('R'));
        assert!(app.confirm_restart.is_some());
        press(&mut app, KeyCode::Char('n'));
        assert!(app.confirm_restart.is_none());
        assert_eq!(app.status.as_deref(), Some("Restart cancelled"));

        press(&mut app, KeyCode::Char('R'));
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app).await;
        assert_eq!(app.status.as_deref(), Some("web restarted"));
    }

    #[tokio::test]
    async fn namespace_cycle_prefers_favourites() {
        let mut app = app(backend());
        app.start();
        settle(&mut app).await;
        app.favorites.toggle("shop");
        assert_eq!(app.namespace_order(), vec!["shop", "blog"]);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.namespace, NamespaceFilter::Only("shop".into()));
    }

    fn seed(store: &DebugStore, url: &str) {
        store.record(ApiCallRecord {
            id: store.next_id(),
            method: "GET".into(),
            url: url.into(),
            request_body: None,
            status_code: Some(200),
            error: None,
            response_body: None,
            content_type: None,
            response_size: None,
            timestamp: chrono::Utc::now(),
            duration_ms: 1,
        });
    }

    #[tokio::test]
    async fn debug_selection_follows_the_record_through_eviction() {
        let store = Arc::new(DebugStore::with_capacity(3));
        let api = DashboardApi::new(Arc::new(FakeTransport::default()));
        let mut app = App::new(api, store.clone(), "test".into(), NamespaceFilter::All, Favorites::load(None));
        app.tab = Tab::Debug;
        for url in ["/a", "/b", "/c"] {
            seed(&store, url);
        }

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        let selected = |app: &App| {
            let log = app.store.log();
            app.debug_position(&log).map(|i| log[i].url.clone())
        };
        assert_eq!(selected(&app).as_deref(), Some("/b"));

        // "/a" is evicted; the selection still points at "/b", now at index 0.
        seed(&store, "/d");
        assert_eq!(selected(&app).as_deref(), Some("/b"));
        assert_eq!(app.debug_position(&store.log()), Some(0));

        // Once "/b" itself is evicted nothing is selected.
        seed(&store, "/e");
        assert_eq!(selected(&app), None);
    }

    #[tokio::test]
    async fn enter_opens_the_response_view() {
        let store = Arc::new(DebugStore::new());
        let api = DashboardApi::new(Arc::new(FakeTransport::default()));
        let mut app = App::new(api, store.clone(), "test".into(), NamespaceFilter::All, Favorites::load(None));
        app.tab = Tab::Debug;
        seed(&store, "/api/overview");
        app.debug_view = DebugView::Metadata;

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.debug_view, DebugView::Response);
        assert_eq!(app.debug_selected, store.get(0).map(|r| r.id));
    }

    #[tokio::test]
    async fn redraw_only_after_a_change() {
        let store = Arc::new(DebugStore::new());
        let api = DashboardApi::new(Arc::new(FakeTransport::default()));
        let mut app = App::new(api, store.clone(), "test".into(), NamespaceFilter::All, Favorites::load(None));

        assert!(app.needs_redraw());
        assert!(!app.needs_redraw());

        seed(&store, "/api/nodes");
        assert!(app.needs_redraw());
        assert!(!app.needs_redraw());

        press(&mut app, KeyCode::Char('3'));
        assert!(app.needs_redraw());
    }

    #[test]
    fn tabs_wrap_in_both_directions() {
        assert_eq!(Tab::Overview.offset(-1), Tab::Debug);
        assert_eq!(Tab::Debug.offset(1), Tab::Overview);
    }
}
