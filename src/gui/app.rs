//! Main GUI application module
//!
//! Holds the application state, runs background jobs and draws the header,
//! footer and wallet gate. The airdrop form and settings window live in
//! `views`.

use crate::{
    airdrop,
    chain::TokenDetails,
    config::{self, Config, NetworkCategory, NETWORKS},
    contracts::AirdropMode,
    draft::{DraftStore, FileDraftStore, FormDraft, FormField},
    orchestrator::{ErrorKind, SubmissionError, SubmissionOutcome, SubmissionPhase},
    user_settings::UserSettings,
    wallet::{self, WalletStatus},
};
use anyhow::{anyhow, Result};
use eframe::{egui, egui::RichText, App, Frame, NativeOptions};
use ethers::types::Address;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

use super::async_job::AsyncJob;
use super::notifications::{push_notification, NotificationEntry, NotificationLevel};
use super::theme::{configure_style, AppTheme};

pub(crate) const APP_TITLE: &str = "TSender";
pub(crate) const REPOSITORY_URL: &str = "https://github.com/cyfrin/TSender";
pub(crate) const TAGLINE: &str = "The most gas-efficient airdrop contract on earth, built in huff 🐎";

/// Token details together with the token and owner they were read for
pub(crate) struct TokenDetailsState {
    pub(crate) details: Option<TokenDetails>,
    pub(crate) fetched_for: Option<(String, Address, u64)>,
    pub(crate) error: Option<String>,
    pub(crate) job: Option<AsyncJob<TokenDetails>>,
    pending_for: Option<(String, Address, u64)>,
}

impl TokenDetailsState {
    fn new() -> Self {
        Self {
            details: None,
            fetched_for: None,
            error: None,
            job: None,
            pending_for: None,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

pub(crate) struct AirdropFormState {
    pub(crate) draft: FormDraft,
    pub(crate) mode: AirdropMode,
    pub(crate) phase: SubmissionPhase,
    pub(crate) progress: Option<UnboundedReceiver<SubmissionPhase>>,
    pub(crate) job: Option<AsyncJob<Result<SubmissionOutcome, SubmissionError>>>,
    pub(crate) last_outcome: Option<SubmissionOutcome>,
    /// Shown in a blocking dialog until dismissed
    pub(crate) input_error: Option<String>,
    pub(crate) token: TokenDetailsState,
}

impl AirdropFormState {
    fn new(draft: FormDraft, mode: AirdropMode) -> Self {
        Self {
            draft,
            mode,
            phase: SubmissionPhase::Idle,
            progress: None,
            job: None,
            last_outcome: None,
            input_error: None,
            token: TokenDetailsState::new(),
        }
    }

    pub(crate) fn is_submitting(&self) -> bool {
        self.job.as_ref().map(|j| j.is_running()).unwrap_or(false)
    }
}

/// Pending edits in the settings window
#[derive(Default)]
pub(crate) struct SettingsFormState {
    pub(crate) open: bool,
    pub(crate) custom_rpc: String,
    pub(crate) tsender_override: String,
    pub(crate) no_check_override: String,
    pub(crate) log_content: Option<String>,
    pub(crate) log_job: Option<AsyncJob<String>>,
}

pub struct TSenderApp {
    pub(crate) config: Config,
    pub(crate) user_settings: UserSettings,
    pub(crate) theme: AppTheme,
    pub(crate) draft_store: Box<dyn DraftStore>,
    pub(crate) form: AirdropFormState,
    pub(crate) settings_form: SettingsFormState,
    pub(crate) notifications: VecDeque<NotificationEntry>,
    pub(crate) wallet_status: WalletStatus,
    pub(crate) wallet_status_job: Option<AsyncJob<WalletStatus>>,
    pub(crate) last_status_check: Instant,
}

impl TSenderApp {
    fn new(config: Config, user_settings: UserSettings, ctx: &egui::Context) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let draft_store: Box<dyn DraftStore> = Box::new(FileDraftStore::in_app_data_dir());
        let draft = FormDraft::load(draft_store.as_ref());
        let form = AirdropFormState::new(draft, user_settings.last_mode);

        Self {
            config,
            user_settings,
            theme,
            draft_store,
            form,
            settings_form: SettingsFormState::default(),
            notifications: VecDeque::with_capacity(20),
            wallet_status: WalletStatus::Disconnected,
            wallet_status_job: None,
            last_status_check: Instant::now(),
        }
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        push_notification(&mut self.notifications, NotificationEntry::with_level(message, level));
    }

    // ==================== form persistence ====================

    /// Write an edited field to the draft store and drop stale status
    pub(crate) fn on_field_changed(&mut self, field: FormField) {
        if let Err(e) = self.form.draft.persist(field, self.draft_store.as_ref()) {
            tracing::warn!("Could not save draft field {}: {}", field.storage_key(), e);
        }
        if self.form.phase.is_terminal() && !self.form.is_submitting() {
            self.form.phase = SubmissionPhase::Idle;
        }
    }

    pub(crate) fn set_mode(&mut self, mode: AirdropMode) {
        if self.form.mode == mode {
            return;
        }
        self.form.mode = mode;
        if !self.form.is_submitting() {
            self.form.phase = SubmissionPhase::Idle;
        }
        self.user_settings.last_mode = mode;
        if let Err(e) = self.user_settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    // ==================== network ====================

    pub(crate) fn apply_network_selection(&mut self, chain_id: u64) {
        let Some(network) = config::find_network_by_chain_id(chain_id) else {
            return;
        };
        let mut new_config = Config::from_network(network, self.config.wallet);
        if let Some(rpc) = self.user_settings.get_custom_rpc(chain_id) {
            new_config.rpc_url = rpc.clone();
        }
        self.config = new_config;
        self.form.token.clear();
        self.form.last_outcome = None;
        if !self.form.is_submitting() {
            self.form.phase = SubmissionPhase::Idle;
        }

        self.user_settings.selected_chain_id = chain_id;
        if let Err(e) = self.user_settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
        self.notify(format!("Switched to {}", network.label), NotificationLevel::Info);
    }

    // ==================== wallet ====================

    pub(crate) fn start_wallet_status_check(&mut self) {
        if self.wallet_status_job.is_some() {
            return;
        }
        let connector = self.config.wallet;
        let chain_id = self.config.chain_id;
        if !self.wallet_status.is_connected() {
            self.wallet_status = WalletStatus::Connecting;
        }
        self.last_status_check = Instant::now();
        self.wallet_status_job = Some(AsyncJob::spawn(move || async move {
            Ok(wallet::check_status(connector, chain_id).await)
        }));
    }

    pub(crate) fn disconnect_wallet(&mut self) {
        self.wallet_status_job = None;
        self.wallet_status = WalletStatus::Disconnected;
        self.form.token.clear();
        self.notify("Wallet disconnected", NotificationLevel::Info);
    }

    fn on_wallet_status(&mut self, status: WalletStatus) {
        let was_connected = self.wallet_status.address();
        match (&status, was_connected) {
            (WalletStatus::Connected { address }, prev) if prev != Some(*address) => {
                self.notify(
                    format!("Wallet connected: {}", wallet::short_address(address)),
                    NotificationLevel::Success,
                );
                self.form.token.clear();
            }
            (WalletStatus::Connected { .. }, _) => {}
            (WalletStatus::Locked, _) => {
                self.notify("Wallet locked or Ethereum app not open", NotificationLevel::Error)
            }
            (WalletStatus::Error(e), _) => {
                self.notify(format!("Wallet error: {}", e), NotificationLevel::Error)
            }
            (WalletStatus::Disconnected, Some(_)) => {
                self.notify("Wallet disconnected", NotificationLevel::Error)
            }
            _ => {}
        }
        self.wallet_status = status;
    }

    // ==================== token details ====================

    /// Fetch name, decimals and balance when the token, owner or chain changed
    fn refresh_token_details_if_needed(&mut self) {
        let Some(owner) = self.wallet_status.address() else {
            return;
        };
        let token = self.form.draft.token_address.trim().to_string();
        if token.parse::<Address>().is_err() {
            if self.form.token.fetched_for.is_some() || self.form.token.details.is_some() {
                self.form.token.clear();
            }
            return;
        }
        let key = (token.clone(), owner, self.config.chain_id);
        if self.form.token.fetched_for.as_ref() == Some(&key) || self.form.token.pending_for.as_ref() == Some(&key) {
            return;
        }
        if self.form.token.job.is_some() {
            // Let the running fetch finish; the next frame starts the new one
            return;
        }
        self.spawn_token_details_job(key);
    }

    fn spawn_token_details_job(&mut self, key: (String, Address, u64)) {
        let config = self.config.clone();
        let (token, owner, _) = key.clone();
        self.form.token.pending_for = Some(key);
        self.form.token.job = Some(AsyncJob::spawn(move || async move {
            airdrop::fetch_token_details(&config, &token, owner).await
        }));
    }

    /// Force a re-read, e.g. after a transfer changed the balance
    pub(crate) fn invalidate_token_details(&mut self) {
        self.form.token.fetched_for = None;
    }

    // ==================== submission ====================

    pub(crate) fn start_submission(&mut self, request: crate::orchestrator::AirdropRequest) {
        let config = self.config.clone();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.form.progress = Some(rx);
        self.form.phase = SubmissionPhase::Validating;
        self.form.last_outcome = None;
        tracing::info!(
            "Starting {} airdrop on chain {} via {:?}",
            request.mode.display_name(),
            request.chain_id,
            request.contract
        );
        self.form.job = Some(AsyncJob::spawn(move || async move {
            Ok(airdrop::send_airdrop(&config, request, tx).await)
        }));
    }

    fn on_submission_finished(&mut self, result: Result<Result<SubmissionOutcome, SubmissionError>>) {
        self.form.progress = None;
        match result {
            Ok(Ok(outcome)) => {
                self.notify(
                    format!(
                        "Airdrop confirmed: {} recipients, tx {:?}",
                        outcome.recipient_count, outcome.transfer.tx_hash
                    ),
                    NotificationLevel::Success,
                );
                self.form.phase = SubmissionPhase::Confirmed(outcome.clone());
                self.form.last_outcome = Some(outcome);
                self.invalidate_token_details();
            }
            Ok(Err(e)) if e.kind() == ErrorKind::Input => {
                self.form.phase = SubmissionPhase::Idle;
                self.form.input_error = Some(e.to_string());
            }
            Ok(Err(e)) => {
                tracing::error!("Airdrop failed: {:?}", e);
                self.notify(format!("Airdrop failed: {}", e), NotificationLevel::Error);
                self.form.phase = SubmissionPhase::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                };
            }
            Err(e) => {
                tracing::error!("Airdrop job failed: {:?}", e);
                self.notify(format!("Airdrop failed: {}", e), NotificationLevel::Error);
                self.form.phase = SubmissionPhase::Failed {
                    kind: ErrorKind::Chain,
                    message: e.to_string(),
                };
            }
        }
    }

    // ==================== polling ====================

    fn poll_jobs(&mut self) {
        if let Some(receiver) = &mut self.form.progress {
            while let Ok(phase) = receiver.try_recv() {
                // Terminal phases come from the job result instead
                if !phase.is_terminal() {
                    self.form.phase = phase;
                }
            }
        }

        if let Some(job) = &mut self.form.job {
            if let Some(result) = job.poll() {
                self.form.job = None;
                self.on_submission_finished(result);
            }
        }

        if let Some(job) = &mut self.wallet_status_job {
            if let Some(result) = job.poll() {
                self.wallet_status_job = None;
                let status = result.unwrap_or_else(|e| WalletStatus::Error(e.to_string()));
                self.on_wallet_status(status);
            }
        }

        if let Some(job) = &mut self.form.token.job {
            if let Some(result) = job.poll() {
                let token = &mut self.form.token;
                token.job = None;
                let key = token.pending_for.take();
                match result {
                    Ok(details) => {
                        token.details = Some(details);
                        token.error = None;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read token details: {}", e);
                        token.details = None;
                        token.error = Some(e.to_string());
                    }
                }
                token.fetched_for = key;
            }
        }

        if let Some(job) = &mut self.settings_form.log_job {
            if let Some(result) = job.poll() {
                self.settings_form.log_job = None;
                self.settings_form.log_content =
                    Some(result.unwrap_or_else(|e| format!("Failed to read operation log: {}", e)));
            }
        }

        // Re-check a connected wallet so a locked or unplugged device shows up
        let refresh_interval = self.user_settings.ledger_refresh_interval_secs;
        if refresh_interval > 0
            && self.wallet_status.is_connected()
            && !self.form.is_submitting()
            && self.wallet_status_job.is_none()
            && self.last_status_check.elapsed().as_secs() >= refresh_interval
        {
            self.start_wallet_status_check();
        }

        self.refresh_token_details_if_needed();
    }

    // ==================== header ====================

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing_sm);
        ui.horizontal(|ui| {
            ui.heading(RichText::new(APP_TITLE).strong().color(self.theme.primary));
            ui.label(RichText::new(TAGLINE).italics().color(self.theme.text_secondary));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                self.render_connect_button(ui);
                ui.add_space(self.theme.spacing_sm);
                ui.hyperlink_to("GitHub", REPOSITORY_URL);
                ui.add_space(self.theme.spacing_sm);
                self.render_network_selector(ui);
                ui.add_space(self.theme.spacing_sm);
                if ui.add(self.theme.button_secondary("⚙ Settings")).clicked() {
                    self.open_settings();
                }
            });
        });
        ui.add_space(self.theme.spacing_sm);
    }

    fn render_network_selector(&mut self, ui: &mut egui::Ui) {
        let current = format!("{} · #{}", self.config.network_label(), self.config.chain_id);
        let mut selected: Option<u64> = None;
        let enabled = !self.form.is_submitting();
        ui.add_enabled_ui(enabled, |ui| {
            egui::ComboBox::from_id_source("network_selector")
                .selected_text(current)
                .width(200.0)
                .show_ui(ui, |ui| {
                    let mut last_category: Option<NetworkCategory> = None;
                    for network in NETWORKS {
                        if last_category != Some(network.category) {
                            if last_category.is_some() {
                                ui.separator();
                            }
                            let header = match network.category {
                                NetworkCategory::Mainnet => "── Mainnets ──",
                                NetworkCategory::Testnet => "── Testnets ──",
                                NetworkCategory::Local => "── Local ──",
                            };
                            ui.label(RichText::new(header).small().color(self.theme.text_secondary));
                            last_category = Some(network.category);
                        }
                        let is_selected = network.chain_id == self.config.chain_id;
                        let label = format!("{} · #{}", network.label, network.chain_id);
                        if ui.selectable_label(is_selected, label).clicked() && !is_selected {
                            selected = Some(network.chain_id);
                        }
                    }
                });
        });
        if let Some(chain_id) = selected {
            self.apply_network_selection(chain_id);
        }
    }

    fn render_connect_button(&mut self, ui: &mut egui::Ui) {
        match self.wallet_status.clone() {
            WalletStatus::Connected { address } => {
                let label = format!("● {}", wallet::short_address(&address));
                let response = ui
                    .add(self.theme.button_secondary(&label))
                    .on_hover_text(format!("{:?}\n{}\nClick to disconnect", address, self.config.wallet.display_name()));
                if response.clicked() && !self.form.is_submitting() {
                    self.disconnect_wallet();
                }
            }
            WalletStatus::Connecting => {
                ui.add_enabled(false, self.theme.button_primary("Connecting..."));
                ui.spinner();
            }
            _ => {
                if ui
                    .add(self.theme.button_primary("Connect"))
                    .on_hover_text(self.config.wallet.display_name())
                    .clicked()
                {
                    self.start_wallet_status_check();
                }
            }
        }
    }

    // ==================== wallet gate ====================

    fn render_wallet_gate(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.25);
            ui.heading(RichText::new("Please connect a wallet").strong());
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new(
                    "Connect your wallet to access the T-Sender airdrop tool and manage your tokens efficiently.",
                )
                .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_md);

            match &self.wallet_status {
                WalletStatus::Locked => {
                    ui.label(
                        RichText::new("⚠ Ledger is locked or the Ethereum app is not open.").color(self.theme.warning),
                    );
                }
                WalletStatus::Error(e) => {
                    ui.label(RichText::new(format!("⚠ {}", e)).color(self.theme.error));
                }
                _ => {}
            }

            if matches!(self.wallet_status, WalletStatus::Connecting) {
                ui.spinner();
            } else if ui
                .add(self.theme.button_primary(&format!("Connect {}", self.config.wallet.display_name())))
                .clicked()
            {
                self.start_wallet_status_check();
            }
        });
    }

    // ==================== footer ====================

    fn render_footer(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(latest) = self.notifications.back() {
                let color = match latest.level {
                    NotificationLevel::Info => self.theme.text_secondary,
                    NotificationLevel::Success => self.theme.success,
                    NotificationLevel::Error => self.theme.error,
                };
                ui.label(RichText::new(&latest.message).color(color).size(12.0));
                ui.label(RichText::new(latest.time_ago()).color(self.theme.text_secondary).size(11.0));
            } else {
                ui.label(RichText::new("Ready").color(self.theme.text_secondary).size(12.0));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .color(self.theme.text_secondary)
                        .size(11.0),
                );
            });
        });
    }
}

impl App for TSenderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.render_header(ui);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            self.render_footer(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.wallet_status.is_connected() {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add_space(self.theme.spacing_md);
                    self.view_airdrop_form(ui);
                });
            } else {
                self.render_wallet_gate(ui);
            }
        });

        self.render_input_error_dialog(ctx);
        self.render_settings_window(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

pub fn launch(config: Config) -> Result<()> {
    let user_settings = UserSettings::load();

    // Saved network wins over the startup default; an env RPC only applies to it
    let mut config = config;
    if user_settings.selected_chain_id != config.chain_id {
        if let Some(network) = config::find_network_by_chain_id(user_settings.selected_chain_id) {
            config = Config::from_network(network, config.wallet);
        }
    }
    if let Some(rpc) = user_settings.get_custom_rpc(config.chain_id) {
        config.rpc_url = rpc.clone();
    }
    tracing::info!("Starting on {} ({})", config.network_label(), config.rpc_url);

    let app_creator = move |cc: &eframe::CreationContext<'_>| {
        Box::new(TSenderApp::new(config.clone(), user_settings.clone(), &cc.egui_ctx)) as Box<dyn App>
    };

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1000.0, 820.0])
        .with_min_inner_size([720.0, 560.0]);

    let native_options = NativeOptions {
        viewport,
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native("TSender", native_options, Box::new(app_creator))
        .map_err(|e| anyhow!("Failed to start GUI: {}", e))
}
