//! Tab Registry
//!
//! Owns the ordered tab strip and the selection. Every public operation
//! mutates the strip, renders, notifies, and then drains deferred work
//! (view releases first, then the eviction sweep) before returning.

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::TabsConfig;
use crate::error::TabError;
use crate::eviction::EvictionPolicy;
use crate::focus::{self, FocusDirection};
use crate::history::{ClosedTab, HistoryStack};
use crate::host::{OpenOptions, RenderFrame, TabAction, TabEvent, TabHost, TabSnapshot};
use crate::kind::TabKind;
use crate::persist::SavedTab;
use crate::tab::{AddTab, ItemId, Tab, TabData, LIBRARY_TAB_ID};
use crate::Result;

/// Whether the current selection should keep keyboard focus on the tab strip.
/// Scoped to one item so it survives an unloaded tab being reloaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusOptions {
    pub item_id: Option<ItemId>,
    pub keep_tab_focused: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    /// `Some(true)` keeps focus on the tab node, `Some(false)` moves it into the content
    pub keep_tab_focused: Option<bool>,
    /// Passed to the document opener when an unloaded tab is reloaded
    pub location: Option<Value>,
}

impl SelectOptions {
    pub fn keep_tab_focused(keep: bool) -> Self {
        Self {
            keep_tab_focused: Some(keep),
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    ReleaseView(String),
    Sweep,
}

pub struct TabRegistry {
    tabs: Vec<Tab>,
    selected_id: String,
    /// Jumpback target used when the selected tab is closed
    previous_selected_id: Option<String>,
    focus_options: FocusOptions,
    history: HistoryStack,
    eviction: EvictionPolicy,
    config: TabsConfig,
    host: TabHost,
    deferred: Vec<Deferred>,
}

impl TabRegistry {
    pub fn new(config: TabsConfig, host: TabHost) -> Self {
        Self {
            tabs: vec![Tab::library()],
            selected_id: LIBRARY_TAB_ID.to_string(),
            previous_selected_id: None,
            focus_options: FocusOptions::default(),
            history: HistoryStack::new(config.history_limit),
            eviction: EvictionPolicy::from_config(&config),
            config,
            host,
            deferred: Vec::new(),
        }
    }

    // === Queries ===

    pub fn config(&self) -> &TabsConfig {
        &self.config
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn selected_id(&self) -> &str {
        &self.selected_id
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.tab(&self.selected_id)
    }

    pub fn selected_kind(&self) -> TabKind {
        self.selected_tab()
            .map(|t| t.kind)
            .unwrap_or(TabKind::Library)
    }

    pub fn selected_index(&self) -> usize {
        self.position(&self.selected_id).unwrap_or(0)
    }

    pub fn previous_selected_id(&self) -> Option<&str> {
        self.previous_selected_id.as_deref()
    }

    pub fn focus_options(&self) -> &FocusOptions {
        &self.focus_options
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// First tab showing `item_id`
    pub fn tab_id_for_item(&self, item_id: ItemId) -> Option<&str> {
        self.tabs
            .iter()
            .find(|t| t.item_id() == Some(item_id))
            .map(|t| t.id.as_str())
    }

    /// Snapshot of what the render sink is showing
    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            tabs: self
                .tabs
                .iter()
                .map(|t| TabSnapshot {
                    id: t.id.clone(),
                    kind: t.kind,
                    title: t.title.clone(),
                    selected: t.id == self.selected_id,
                    icon: t.icon.clone(),
                })
                .collect(),
        }
    }

    // === Creation ===

    /// Insert a tab and return its id
    pub fn add(&mut self, args: AddTab) -> Result<String> {
        let id = self.add_inner(args)?;
        self.flush_deferred();
        Ok(id)
    }

    fn add_inner(&mut self, args: AddTab) -> Result<String> {
        if args.title.trim().is_empty() {
            return Err(TabError::InvalidArgument(
                "Tab title must be a non-empty string".to_string(),
            ));
        }
        if let Some(index) = args.index {
            if index < 1 {
                return Err(TabError::InvalidArgument(format!(
                    "Tab index is invalid: {}",
                    index
                )));
            }
        }
        if args.kind == TabKind::Library {
            return Err(TabError::InvalidArgument(
                "Only one library tab can exist".to_string(),
            ));
        }

        let id = match args.id {
            Some(id) if self.position(&id).is_some() => {
                return Err(TabError::InvalidArgument(format!(
                    "Tab id already in use: {}",
                    id
                )));
            }
            Some(id) => id,
            None => Uuid::new_v4().simple().to_string(),
        };

        let index = args.index.unwrap_or(self.tabs.len()).min(self.tabs.len());
        let mut tab = Tab::new(id.clone(), args.kind, args.title, args.data);
        tab.on_close = args.on_close;
        let payload = data_payload(&id, tab.data.as_ref());
        self.tabs.insert(index, tab);

        tracing::info!(tab_id = %id, kind = %args.kind, index, "Added tab");

        self.update();
        self.notify(TabAction::Add, vec![id.clone()], payload);

        if args.select {
            let previous = self.selected_id.clone();
            self.select_inner(&id, false, SelectOptions::default());
            if !args.prevent_jumpback {
                self.previous_selected_id = Some(previous);
            }
        }

        Ok(id)
    }

    // === Closing ===

    /// Close the given tabs; an empty list closes the selected tab
    pub fn close<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<Vec<String>> {
        let ids = ids.iter().map(|id| id.as_ref().to_string()).collect();
        let closed = self.close_inner(ids)?;
        self.flush_deferred();
        Ok(closed)
    }

    pub fn close_selected(&mut self) -> Result<Vec<String>> {
        self.close::<&str>(&[])
    }

    /// Close every tab except the library tab
    pub fn close_all(&mut self) -> Result<Vec<String>> {
        let ids: Vec<String> = self.tabs[1..].iter().map(|t| t.id.clone()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.close(&ids)
    }

    /// Close every document tab except `keep_id`
    pub fn close_others(&mut self, keep_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = self.tabs[1..]
            .iter()
            .filter(|t| t.id != keep_id)
            .map(|t| t.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.close(&ids)
    }

    fn close_inner(&mut self, ids: Vec<String>) -> Result<Vec<String>> {
        let ids = if ids.is_empty() {
            vec![self.selected_id.clone()]
        } else {
            ids
        };

        if ids.iter().any(|id| id == LIBRARY_TAB_ID) {
            return Err(TabError::ProtectedTab(
                "Library tab can't be closed".to_string(),
            ));
        }

        let original_order: Vec<String> = self.tabs.iter().map(|t| t.id.clone()).collect();
        let closing: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut batch = Vec::new();
        let mut closed_ids = Vec::new();

        for id in &ids {
            let Some(index) = self.position(id) else {
                continue;
            };
            let mut tab = self.tabs.remove(index);
            tab.run_close_callback();

            batch.push(ClosedTab {
                index: original_order
                    .iter()
                    .position(|o| o == id)
                    .unwrap_or(index),
                title: tab.title.clone(),
                data: tab.data.clone(),
            });
            closed_ids.push(tab.id.clone());
            self.defer(Deferred::ReleaseView(tab.id));

            // Chosen after removal so a reloaded neighbour keeps its slot
            if *id == self.selected_id {
                if let Some(next) = self.successor_for_closed(index, &closing) {
                    self.select_inner(&next, false, SelectOptions::default());
                }
            }
        }

        self.ensure_selection();

        if !closed_ids.is_empty() {
            tracing::info!(tab_ids = ?closed_ids, "Closed tabs");
            self.history.push(batch);
            self.notify(TabAction::Close, closed_ids.clone(), Map::new());
        }
        self.update();

        Ok(closed_ids)
    }

    /// Jumpback target if it is still open, else the next tab, else the previous one.
    ///
    /// `index` is the slot the closed tab occupied. Tabs in the same close
    /// batch are never picked.
    fn successor_for_closed(&self, index: usize, closing: &HashSet<&str>) -> Option<String> {
        if let Some(previous) = self.previous_selected_id.as_deref() {
            if !closing.contains(previous) && self.position(previous).is_some() {
                return Some(previous.to_string());
            }
        }

        let staying = |t: &&Tab| !closing.contains(t.id.as_str());
        let index = index.min(self.tabs.len());
        self.tabs[index..]
            .iter()
            .find(staying)
            .or_else(|| self.tabs[..index].iter().rev().find(staying))
            .map(|t| t.id.clone())
    }

    /// Fall back to the library tab when the selection no longer resolves
    fn ensure_selection(&mut self) {
        if self.position(&self.selected_id).is_some() {
            return;
        }

        tracing::debug!(tab_id = %self.selected_id, "Selected tab is gone; showing library");
        self.selected_id = LIBRARY_TAB_ID.to_string();
        self.tabs[0].time_selected = Some(self.host.clock.now());
        self.notify(
            TabAction::Select,
            vec![LIBRARY_TAB_ID.to_string()],
            kind_payload(LIBRARY_TAB_ID, TabKind::Library),
        );
    }

    /// Reopen the most recently closed batch through the document opener.
    ///
    /// Each surviving entry is opened in the background at its old position;
    /// the one that sat furthest right opens in the foreground. Returns the
    /// tab ids the opener was asked to use.
    pub fn undo_close(&mut self) -> Vec<String> {
        let Some(mut batch) = self.history.pop() else {
            return Vec::new();
        };
        batch.sort_by_key(|entry| entry.index);

        let catalog = &self.host.catalog;
        let entries: Vec<(ClosedTab, TabData)> = batch
            .into_iter()
            .filter_map(|mut entry| {
                let data = entry.data.take()?;
                if !catalog.item_exists(data.item_id) {
                    tracing::debug!(item_id = data.item_id, "Skipping reopen of deleted item");
                    return None;
                }
                Some((entry, data))
            })
            .collect();

        let last = entries.len().saturating_sub(1);
        let mut reopened = Vec::with_capacity(entries.len());

        for (i, (entry, data)) in entries.into_iter().enumerate() {
            let id = Uuid::new_v4().simple().to_string();
            self.host.opener.open(
                data.item_id,
                None,
                OpenOptions {
                    title: Some(entry.title),
                    tab_index: Some(entry.index.max(1)),
                    open_in_background: i != last,
                    second_view_state: data.second_view_state,
                    tab_id: Some(id.clone()),
                    allow_duplicate: true,
                    ..OpenOptions::default()
                },
            );
            reopened.push(id);
        }

        tracing::info!(tab_ids = ?reopened, "Reopening closed tabs");
        reopened
    }

    // === Ordering ===

    pub fn move_tab(&mut self, id: &str, new_index: usize) -> Result<()> {
        if id == LIBRARY_TAB_ID {
            return Err(TabError::ProtectedTab(
                "Library tab can't be moved".to_string(),
            ));
        }
        if new_index < 1 {
            return Err(TabError::ProtectedTab(format!(
                "Tab index is invalid: {}",
                new_index
            )));
        }

        let Some(current) = self.position(id) else {
            return Ok(());
        };
        if current == new_index {
            return Ok(());
        }

        // `new_index` is a slot in the strip before removal
        let target = if new_index > current {
            new_index - 1
        } else {
            new_index
        };

        let tab = self.tabs.remove(current);
        let target = target.min(self.tabs.len());
        self.tabs.insert(target, tab);

        tracing::debug!(tab_id = %id, from = current, to = target, "Moved tab");
        self.update();
        Ok(())
    }

    pub fn move_to_start(&mut self, id: &str) -> Result<()> {
        self.move_tab(id, 1)
    }

    pub fn move_to_end(&mut self, id: &str) -> Result<()> {
        self.move_tab(id, self.tabs.len())
    }

    // === Selection ===

    pub fn select(&mut self, id: &str, reopening: bool, options: SelectOptions) {
        self.select_inner(id, reopening, options);
        self.flush_deferred();
    }

    /// Select the tab to the left, wrapping to the last tab
    pub fn select_previous(&mut self, options: SelectOptions) {
        let index = self.selected_index();
        let target = if index == 0 {
            self.tabs.len() - 1
        } else {
            index - 1
        };
        let id = self.tabs[target].id.clone();
        self.select(&id, false, options);
    }

    /// Select the tab to the right, wrapping to the library tab
    pub fn select_next(&mut self, options: SelectOptions) {
        let index = self.selected_index();
        let target = if index + 1 >= self.tabs.len() {
            0
        } else {
            index + 1
        };
        let id = self.tabs[target].id.clone();
        self.select(&id, false, options);
    }

    pub fn select_last(&mut self) {
        let id = self.tabs[self.tabs.len() - 1].id.clone();
        self.select(&id, false, SelectOptions::default());
    }

    /// Select the tab at `index`, or the last tab if out of range
    pub fn jump(&mut self, index: usize) {
        let index = index.min(self.tabs.len() - 1);
        let id = self.tabs[index].id.clone();
        self.select(&id, false, SelectOptions::default());
    }

    fn select_inner(&mut self, id: &str, reopening: bool, options: SelectOptions) {
        let Some(index) = self.position(id) else {
            return;
        };

        if id == self.selected_id {
            if options.keep_tab_focused == Some(false) {
                self.focus_content_of(id);
            }
            return;
        }

        let now = self.host.clock.now();
        let outgoing = self.selected_id.clone();
        if let Some(i) = self.position(&outgoing) {
            self.tabs[i].time_unselected = Some(now);
        }

        let item_id = self.tabs[index].item_id();
        if self.focus_options.item_id != item_id {
            self.focus_options = FocusOptions {
                item_id,
                keep_tab_focused: false,
            };
        }
        if let Some(keep) = options.keep_tab_focused {
            self.focus_options.keep_tab_focused = keep;
        }

        if self.tabs[index].kind == TabKind::ReaderUnloaded {
            self.reload(index, options.location);
            return;
        }

        self.previous_selected_id = if reopening { Some(outgoing) } else { None };
        self.selected_id = id.to_string();
        self.tabs[index].time_selected = Some(now);
        let kind = self.tabs[index].kind;

        tracing::debug!(tab_id = %id, kind = %kind, "Selected tab");

        self.update();
        self.notify(TabAction::Select, vec![id.to_string()], kind_payload(id, kind));

        if self.focus_options.keep_tab_focused {
            self.host.ui.focus_tab(id);
        } else if options.keep_tab_focused == Some(false) {
            self.focus_content_of(id);
        }

        self.defer(Deferred::Sweep);
    }

    /// Swap an unloaded placeholder for a freshly opened viewer at the same spot
    fn reload(&mut self, index: usize, location: Option<Value>) {
        let mut placeholder = self.tabs.remove(index);
        placeholder.run_close_callback();
        let id = placeholder.id.clone();

        tracing::info!(tab_id = %id, index, "Reloading unloaded tab");

        self.defer(Deferred::ReleaseView(id.clone()));
        self.update();
        self.notify(TabAction::Close, vec![id.clone()], Map::new());

        let Some(data) = placeholder.data else {
            tracing::warn!(tab_id = %id, "Unloaded tab has no item to reload");
            return;
        };
        self.host.opener.open(
            data.item_id,
            location,
            OpenOptions {
                title: Some(placeholder.title),
                tab_index: Some(index),
                second_view_state: data.second_view_state,
                tab_id: Some(id),
                allow_duplicate: true,
                prevent_jumpback: true,
                ..OpenOptions::default()
            },
        );
    }

    fn focus_content_of(&self, id: &str) {
        match self.host.opener.get_by_tab_id(id) {
            Some(viewer) => viewer.focus(),
            None => self.host.ui.focus_content(id),
        }
    }

    // === Tab attributes ===

    pub fn rename(&mut self, id: &str, title: impl Into<String>) {
        let Some(index) = self.position(id) else {
            return;
        };
        self.tabs[index].title = title.into();
        self.update();
    }

    pub fn set_icon(&mut self, id: &str, icon: Option<String>) {
        let Some(index) = self.position(id) else {
            return;
        };
        self.tabs[index].icon = icon;
        self.update();
    }

    pub fn set_second_view_state(&mut self, id: &str, state: Option<Value>) {
        let Some(index) = self.position(id) else {
            return;
        };
        if let Some(data) = self.tabs[index].data.as_mut() {
            data.second_view_state = state;
        }
    }

    // === Memory ===

    /// Release the viewer behind an unselected reader tab, keeping its place
    pub fn unload(&mut self, id: &str) {
        self.unload_inner(id);
        self.flush_deferred();
    }

    fn unload_inner(&mut self, id: &str) {
        let Some(index) = self.position(id) else {
            return;
        };
        if id == self.selected_id || self.tabs[index].kind != TabKind::Reader {
            return;
        }

        let tab = &mut self.tabs[index];
        if let Err(e) = tab.transition_to(TabKind::ReaderUnloaded) {
            tracing::warn!(tab_id = %id, error = %e, "Cannot unload tab");
            return;
        }
        tab.run_close_callback();
        let payload = data_payload(id, tab.data.as_ref());

        tracing::info!(tab_id = %id, index, "Unloaded tab");

        self.defer(Deferred::ReleaseView(id.to_string()));
        self.notify(TabAction::Close, vec![id.to_string()], Map::new());
        self.notify(TabAction::Add, vec![id.to_string()], payload);
        self.update();
    }

    /// Run the eviction policy now
    pub fn sweep(&mut self) {
        self.sweep_inner();
        self.flush_deferred();
    }

    fn sweep_inner(&mut self) {
        let planned = self
            .eviction
            .plan(&self.tabs, &self.selected_id, self.host.clock.now());
        for id in planned {
            self.unload_inner(&id);
        }
    }

    // === Viewer hand-offs ===

    /// Open another viewer for the same item right of `id`
    pub fn duplicate(&mut self, id: &str) {
        let Some(index) = self.position(id) else {
            return;
        };
        let tab = &self.tabs[index];
        let Some(data) = tab.data.as_ref() else {
            return;
        };

        self.host.opener.open(
            data.item_id,
            None,
            OpenOptions {
                title: Some(tab.title.clone()),
                tab_index: Some(index + 1),
                second_view_state: data.second_view_state.clone(),
                allow_duplicate: true,
                ..OpenOptions::default()
            },
        );
    }

    /// Reopen the document in its own window and close the tab
    pub fn move_to_window(&mut self, id: &str) -> Result<()> {
        if id == LIBRARY_TAB_ID {
            return Err(TabError::ProtectedTab(
                "Library tab can't be moved".to_string(),
            ));
        }
        let Some(tab) = self.tab(id) else {
            return Ok(());
        };
        let Some(data) = tab.data.clone() else {
            return Ok(());
        };

        self.host.opener.open(
            data.item_id,
            None,
            OpenOptions {
                title: Some(tab.title.clone()),
                second_view_state: data.second_view_state,
                allow_duplicate: true,
                open_in_window: true,
                ..OpenOptions::default()
            },
        );
        self.close(&[id])?;
        Ok(())
    }

    // === Keyboard focus ===

    /// Move keyboard focus across the strip; returns the focused index
    pub fn move_focus(&self, direction: FocusDirection) -> Option<usize> {
        let focused = self
            .host
            .ui
            .focused_tab_id()
            .and_then(|id| self.position(&id));
        let target = focus::resolve(
            direction,
            self.tabs.len(),
            focused,
            self.selected_index(),
        )?;

        self.host.ui.focus_tab(&self.tabs[target].id);
        Some(target)
    }

    // === Persistence ===

    pub fn get_state(&self) -> Vec<SavedTab> {
        self.tabs
            .iter()
            .map(|t| SavedTab {
                kind: t.kind.persisted(),
                title: t.title.clone(),
                time_unselected: t.time_unselected,
                data: t.data.clone(),
                selected: t.id == self.selected_id,
            })
            .collect()
    }

    /// Rebuild the strip from saved state.
    ///
    /// The selected document is reopened through the document opener; the
    /// rest come back unloaded. Entries for deleted items are dropped.
    pub fn restore_state(&mut self, saved: &[SavedTab]) {
        for (i, entry) in saved.iter().enumerate() {
            match entry.kind {
                TabKind::Library => self.rename(LIBRARY_TAB_ID, entry.title.clone()),
                TabKind::Reader | TabKind::ReaderUnloaded => {
                    let Some(data) = entry.data.as_ref() else {
                        tracing::warn!(index = i, "Saved reader tab has no item");
                        continue;
                    };
                    if !self.host.catalog.item_exists(data.item_id) {
                        tracing::debug!(item_id = data.item_id, "Dropping tab for deleted item");
                        continue;
                    }

                    // Dropped entries shift everything after them left
                    let index = self.tabs.len();
                    if entry.selected {
                        self.host.opener.open(
                            data.item_id,
                            None,
                            OpenOptions {
                                title: Some(entry.title.clone()),
                                tab_index: Some(index),
                                second_view_state: data.second_view_state.clone(),
                                ..OpenOptions::default()
                            },
                        );
                        continue;
                    }

                    let add = AddTab::new(TabKind::ReaderUnloaded, entry.title.clone())
                        .data(data.clone())
                        .index(index);
                    match self.add_inner(add) {
                        Ok(id) => {
                            if let Some(index) = self.position(&id) {
                                self.tabs[index].time_unselected = entry.time_unselected;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(index = i, error = %e, "Skipping saved tab");
                        }
                    }
                }
            }
        }

        // Restoring must not leave a jumpback target behind
        self.previous_selected_id = None;
        self.flush_deferred();

        tracing::info!(tab_count = self.tabs.len(), "Restored tab state");
    }

    // === Internals ===

    fn update(&self) {
        let frame = self.frame();
        self.host.ui.render(&frame);

        let title = self.selected_tab().map(|t| t.title.as_str()).unwrap_or("");
        let window_title = if title.is_empty() {
            self.config.app_name.clone()
        } else {
            format!("{} - {}", title, self.config.app_name)
        };
        self.host.ui.set_window_title(&window_title);
        self.host.ui.dismiss_tooltips();
    }

    fn notify(&self, action: TabAction, ids: Vec<String>, payload: Map<String, Value>) {
        self.host.notifier.notify(TabEvent::new(action, ids, payload));
    }

    fn defer(&mut self, task: Deferred) {
        if !self.deferred.contains(&task) {
            self.deferred.push(task);
        }
    }

    /// View releases run before the sweep; the sweep may queue more releases
    fn flush_deferred(&mut self) {
        while !self.deferred.is_empty() {
            let (releases, rest): (Vec<Deferred>, Vec<Deferred>) =
                std::mem::take(&mut self.deferred)
                    .into_iter()
                    .partition(|task| matches!(task, Deferred::ReleaseView(_)));

            for task in releases {
                if let Deferred::ReleaseView(id) = task {
                    self.host.ui.release_view(&id);
                }
            }
            if rest.contains(&Deferred::Sweep) {
                self.sweep_inner();
            }
        }
    }
}

fn data_payload(id: &str, data: Option<&TabData>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        id.to_string(),
        serde_json::to_value(data).unwrap_or(Value::Null),
    );
    payload
}

fn kind_payload(id: &str, kind: TabKind) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(id.to_string(), json!({ "type": kind }));
    payload
}
