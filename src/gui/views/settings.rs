//! Settings window: RPC endpoint and contract overrides for the active chain,
//! wallet refresh interval, and the operation log.

use crate::config;
use crate::contracts::{self, AirdropMode};
use crate::gui::app::TSenderApp;
use crate::gui::async_job::AsyncJob;
use crate::gui::notifications::NotificationLevel;
use crate::operation_log;
use crate::user_settings::UserSettings;
use eframe::egui::{self, RichText};

impl TSenderApp {
    pub(crate) fn open_settings(&mut self) {
        let chain_id = self.config.chain_id;
        let overrides = self.user_settings.contract_overrides.get(&chain_id).cloned().unwrap_or_default();
        let form = &mut self.settings_form;
        form.open = true;
        form.custom_rpc = self.user_settings.get_custom_rpc(chain_id).cloned().unwrap_or_default();
        form.tsender_override = overrides.tsender.unwrap_or_default();
        form.no_check_override = overrides.no_check.unwrap_or_default();
        self.refresh_operation_log();
    }

    fn refresh_operation_log(&mut self) {
        if self.settings_form.log_job.is_none() {
            self.settings_form.log_job = Some(AsyncJob::spawn(|| async { operation_log::read_log() }));
        }
    }

    fn save_settings_form(&mut self) {
        let chain_id = self.config.chain_id;
        let custom_rpc = self.settings_form.custom_rpc.clone();
        let tsender = self.settings_form.tsender_override.clone();
        let no_check = self.settings_form.no_check_override.clone();

        for (mode, raw) in [(AirdropMode::Safe, &tsender), (AirdropMode::Unsafe, &no_check)] {
            let raw = raw.trim();
            if !raw.is_empty() && raw.parse::<ethers::types::Address>().is_err() {
                self.notify(
                    format!("{} override '{}' is not a valid address and will be ignored", mode.display_name(), raw),
                    NotificationLevel::Error,
                );
            }
        }

        self.user_settings.set_custom_rpc(chain_id, custom_rpc);
        self.user_settings.set_contract_override(chain_id, AirdropMode::Safe, tsender);
        self.user_settings.set_contract_override(chain_id, AirdropMode::Unsafe, no_check);

        self.config.rpc_url = match self.user_settings.get_custom_rpc(chain_id) {
            Some(rpc) => rpc.clone(),
            None => config::find_network_by_chain_id(chain_id)
                .map(|n| n.default_rpc.to_string())
                .unwrap_or_else(|| self.config.rpc_url.clone()),
        };
        self.form.token.clear();

        match self.user_settings.save() {
            Ok(()) => self.notify("Settings saved", NotificationLevel::Success),
            Err(e) => self.notify(format!("Failed to save settings: {}", e), NotificationLevel::Error),
        }
    }

    pub(crate) fn render_settings_window(&mut self, ctx: &egui::Context) {
        if !self.settings_form.open {
            return;
        }
        let mut open = true;
        let mut save_clicked = false;
        let mut refresh_clicked = false;
        let theme = self.theme;
        let chain_id = self.config.chain_id;
        let network = config::find_network_by_chain_id(chain_id);

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(560.0)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(format!("{} · chain {}", self.config.network_label(), chain_id)).strong(),
                );
                ui.add_space(theme.spacing_sm);

                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([theme.spacing_md, theme.spacing_sm])
                    .show(ui, |ui| {
                        ui.label("RPC URL");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_form.custom_rpc)
                                .hint_text(network.map(|n| n.default_rpc).unwrap_or("https://..."))
                                .desired_width(360.0),
                        );
                        ui.end_row();

                        let builtin = contracts::find_deployment(chain_id);
                        ui.label("TSender contract");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_form.tsender_override)
                                .hint_text(builtin.map(|d| d.tsender).unwrap_or("not deployed"))
                                .font(egui::TextStyle::Monospace)
                                .desired_width(360.0),
                        );
                        ui.end_row();

                        ui.label("No-check contract");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_form.no_check_override)
                                .hint_text(builtin.and_then(|d| d.no_check).unwrap_or("not deployed"))
                                .font(egui::TextStyle::Monospace)
                                .desired_width(360.0),
                        );
                        ui.end_row();

                        ui.label("Wallet refresh (s)");
                        ui.add(
                            egui::DragValue::new(&mut self.user_settings.ledger_refresh_interval_secs)
                                .clamp_range(0..=300),
                        )
                        .on_hover_text("How often a connected wallet is re-checked. 0 disables.");
                        ui.end_row();
                    });

                ui.add_space(theme.spacing_sm);
                ui.label(
                    RichText::new("Leave a field empty to use the built-in value.")
                        .size(11.0)
                        .color(theme.text_secondary),
                );
                ui.label(
                    RichText::new(format!("Settings file: {}", UserSettings::settings_path_display()))
                        .size(11.0)
                        .color(theme.text_secondary),
                );
                ui.add_space(theme.spacing_sm);
                if ui.add(theme.button_primary("Save")).clicked() {
                    save_clicked = true;
                }

                ui.add_space(theme.spacing_md);
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Operation log").strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(theme.button_secondary("Open file")).clicked() {
                            if let Err(e) = open::that(operation_log::log_file_path()) {
                                tracing::warn!("Failed to open operation log: {}", e);
                            }
                        }
                        if ui.add(theme.button_secondary("Refresh")).clicked() {
                            refresh_clicked = true;
                        }
                    });
                });
                ui.label(
                    RichText::new(operation_log::log_file_path())
                        .size(11.0)
                        .color(theme.text_secondary),
                );
                egui::ScrollArea::vertical()
                    .max_height(220.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        match &self.settings_form.log_content {
                            Some(content) if !content.trim().is_empty() => {
                                ui.monospace(content);
                            }
                            Some(_) => {
                                ui.label("No airdrops logged yet.");
                            }
                            None => {
                                ui.spinner();
                            }
                        }
                    });
            });

        if save_clicked {
            self.save_settings_form();
        }
        if refresh_clicked {
            self.refresh_operation_log();
        }
        self.settings_form.open = open;
    }
}
