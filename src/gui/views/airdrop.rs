//! The airdrop form: mode tabs, the three inputs, transaction details and the
//! submit button.

use crate::amounts::{self, AmountError};
use crate::config;
use crate::contracts::{self, AirdropMode};
use crate::draft::FormField;
use crate::gui::app::TSenderApp;
use crate::gui::notifications::NotificationLevel;
use crate::orchestrator::{self, AirdropRequest, ErrorKind, SubmissionPhase};
use crate::utils;
use eframe::egui::{self, RichText};
use ethers::types::U256;

const UNSAFE_MODE_HINT: &str = "This mode skips certain safety checks to optimize for gas. Do not use this mode unless you know how to verify the calldata of your transaction.";

/// What the submit button shows and whether it can be pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmitButtonState {
    pub(crate) label: &'static str,
    pub(crate) enabled: bool,
    pub(crate) busy: bool,
}

fn idle_label(mode: AirdropMode) -> &'static str {
    if mode.is_unsafe() {
        "Send Tokens (Unsafe)"
    } else {
        "Send Tokens"
    }
}

pub(crate) fn submit_button_state(
    phase: &SubmissionPhase,
    mode: AirdropMode,
    has_enough_tokens: bool,
) -> SubmitButtonState {
    let (label, enabled, busy) = match phase {
        p if p.is_awaiting_signature() => ("Confirming in wallet...", false, true),
        p if p.is_waiting_for_inclusion() => ("Waiting for transaction to be included...", false, true),
        SubmissionPhase::Validating | SubmissionPhase::CheckingAllowance => (idle_label(mode), false, true),
        SubmissionPhase::Failed { kind, .. } if *kind != ErrorKind::Input => ("Error, see console.", true, false),
        SubmissionPhase::Confirmed(_) => ("Transaction confirmed.", true, false),
        _ => {
            if has_enough_tokens {
                (idle_label(mode), true, false)
            } else {
                ("Insufficient token balance", false, false)
            }
        }
    };
    SubmitButtonState { label, enabled, busy }
}

/// Balance check for the button. Unknown balance or an empty airdrop never
/// blocks.
fn has_enough_tokens(token_address: &str, total: Option<U256>, balance_ok: Option<bool>) -> bool {
    match (token_address.trim().is_empty(), total) {
        (false, Some(total)) if !total.is_zero() => balance_ok.unwrap_or(true),
        _ => true,
    }
}

impl TSenderApp {
    pub(crate) fn view_airdrop_form(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let total = amounts::calculate_total(&self.form.draft.amounts);

        ui.vertical_centered(|ui| {
            ui.set_max_width(760.0);
            theme.frame_panel().show(ui, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                    self.render_title_and_tabs(ui);
                    if self.form.mode.is_unsafe() {
                        ui.add_space(theme.spacing_sm);
                        self.render_unsafe_banner(ui);
                    }
                    ui.add_space(theme.spacing_md);
                    self.render_inputs(ui);
                    ui.add_space(theme.spacing_md);
                    self.render_details(ui, &total);
                    ui.add_space(theme.spacing_md);
                    self.render_submit(ui, &total);
                    self.render_outcome(ui);
                });
            });
        });
    }

    fn render_title_and_tabs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("T-Sender").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut mode = self.form.mode;
                ui.add_enabled_ui(!self.form.is_submitting(), |ui| {
                    // right_to_left: added in reverse order
                    ui.selectable_value(&mut mode, AirdropMode::Unsafe, AirdropMode::Unsafe.display_name());
                    ui.selectable_value(&mut mode, AirdropMode::Safe, AirdropMode::Safe.display_name());
                });
                self.set_mode(mode);
            });
        });
    }

    fn render_unsafe_banner(&self, ui: &mut egui::Ui) {
        self.theme.frame_banner().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Using unsafe super gas optimized mode").color(self.theme.warning).strong());
                ui.label(RichText::new("ⓘ").color(self.theme.warning))
                    .on_hover_text(UNSAFE_MODE_HINT);
            });
        });
    }

    fn render_inputs(&mut self, ui: &mut egui::Ui) {
        let editable = !self.form.is_submitting() && self.form.input_error.is_none();
        let mut changed: Vec<FormField> = Vec::new();
        let mut import_clicked = false;

        ui.add_enabled_ui(editable, |ui| {
            ui.label(RichText::new("Token Address").strong());
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.form.draft.token_address)
                    .hint_text("0x")
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                changed.push(FormField::TokenAddress);
            }

            ui.add_space(self.theme.spacing_sm);
            ui.horizontal(|ui| {
                ui.label(RichText::new("Recipients (comma or new line separated)").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add(self.theme.button_secondary("📄 Import CSV"))
                        .on_hover_text("Fill recipients and amounts from address,amount rows")
                        .clicked()
                    {
                        import_clicked = true;
                    }
                });
            });
            let response = ui.add(
                egui::TextEdit::multiline(&mut self.form.draft.recipients)
                    .hint_text("0x123..., 0x456...")
                    .font(egui::TextStyle::Monospace)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                changed.push(FormField::Recipients);
            }

            ui.add_space(self.theme.spacing_sm);
            ui.label(RichText::new("Amounts (wei; comma or new line separated)").strong());
            let response = ui.add(
                egui::TextEdit::multiline(&mut self.form.draft.amounts)
                    .hint_text("100, 200, 300...")
                    .font(egui::TextStyle::Monospace)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                changed.push(FormField::Amounts);
            }
        });

        for field in changed {
            self.on_field_changed(field);
        }
        if import_clicked {
            self.import_csv();
        }
    }

    fn render_details(&self, ui: &mut egui::Ui, total: &Result<U256, AmountError>) {
        let theme = &self.theme;
        theme.frame_details().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("Transaction Details").strong());
            ui.add_space(theme.spacing_xs);

            let token = &self.form.token;
            egui::Grid::new("transaction_details")
                .num_columns(2)
                .spacing([theme.spacing_lg, theme.spacing_xs])
                .show(ui, |ui| {
                    ui.label(RichText::new("Token Name:").color(theme.text_secondary));
                    let name = match (&token.details, &token.error, token.job.is_some()) {
                        (_, _, true) => "Loading...".to_string(),
                        (Some(details), _, _) => details.name.clone(),
                        (None, Some(_), _) => "Unknown token".to_string(),
                        _ => "-".to_string(),
                    };
                    ui.horizontal(|ui| {
                        ui.label(name);
                        if let (Some(_), Some((token_address, _, _))) = (&token.details, &token.fetched_for) {
                            self.explorer_link(ui, token_address.trim());
                        }
                    });
                    ui.end_row();

                    match total {
                        Ok(total) => {
                            ui.label(RichText::new("Amount (wei):").color(theme.text_secondary));
                            ui.monospace(total.to_string());
                            ui.end_row();

                            ui.label(RichText::new("Amount (tokens):").color(theme.text_secondary));
                            match &token.details {
                                Some(details) => ui.monospace(utils::format_token_amount(*total, details.decimals)),
                                None => ui.monospace("-"),
                            };
                            ui.end_row();

                            if let Some(details) = &token.details {
                                ui.label(RichText::new("Your balance:").color(theme.text_secondary));
                                ui.monospace(utils::format_token_amount(details.balance, details.decimals));
                                ui.end_row();
                            }
                        }
                        Err(e) => {
                            ui.label(RichText::new("Amount:").color(theme.text_secondary));
                            ui.label(RichText::new(e.to_string()).color(theme.error));
                            ui.end_row();
                        }
                    }

                    ui.label(RichText::new("Recipients:").color(theme.text_secondary));
                    match amounts::parse_recipients(&self.form.draft.recipients) {
                        Ok(recipients) => ui.label(recipients.len().to_string()),
                        Err(e) => ui.label(RichText::new(e.to_string()).color(theme.error)),
                    };
                    ui.end_row();

                    ui.label(RichText::new("Contract:").color(theme.text_secondary));
                    match contracts::resolve_tsender_address(
                        self.config.chain_id,
                        self.form.mode,
                        &self.user_settings.contract_overrides,
                    ) {
                        Some(address) => {
                            let address = format!("{:?}", address);
                            ui.horizontal(|ui| {
                                ui.monospace(&address);
                                self.explorer_link(ui, &address);
                            })
                            .response
                        }
                        None => ui.label(
                            RichText::new("T-Sender contract address is not available for this chain.")
                                .color(theme.warning),
                        ),
                    };
                    ui.end_row();
                });
        });
    }

    /// Small "↗" link to the address page, when the chain has an explorer
    fn explorer_link(&self, ui: &mut egui::Ui, address: &str) {
        if let Some(url) = config::get_address_explorer_url(self.config.chain_id, address) {
            if ui.small_button("↗").on_hover_text(&url).clicked() {
                if let Err(e) = open::that(&url) {
                    tracing::warn!("Failed to open explorer: {}", e);
                }
            }
        }
    }

    fn render_submit(&mut self, ui: &mut egui::Ui, total: &Result<U256, AmountError>) {
        let balance_ok = match (&self.form.token.details, total) {
            (Some(details), Ok(total)) => Some(details.has_enough_tokens(*total)),
            _ => None,
        };
        let enough = has_enough_tokens(&self.form.draft.token_address, total.as_ref().ok().copied(), balance_ok);
        let state = submit_button_state(&self.form.phase, self.form.mode, enough);
        let enabled = state.enabled && self.form.input_error.is_none() && !self.form.is_submitting();

        let mut clicked = false;
        ui.vertical_centered(|ui| {
            let button = self.theme.button_submit(state.label, self.form.mode.is_unsafe());
            let button = if ui.available_width() < self.theme.button_wide.x {
                button.min_size(egui::vec2(ui.available_width(), self.theme.button_wide.y))
            } else {
                button
            };
            clicked = ui.add_enabled(enabled, button).clicked();
            if state.busy {
                ui.add_space(self.theme.spacing_xs);
                let elapsed = self.form.job.as_ref().map(|j| j.elapsed().as_secs()).unwrap_or(0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(
                        RichText::new(format!("{} ({}s)", phase_description(&self.form.phase), elapsed))
                            .color(self.theme.text_secondary),
                    );
                });
            }
        });

        if clicked {
            self.on_submit_clicked();
        }
    }

    fn on_submit_clicked(&mut self) {
        let request = AirdropRequest::from_draft(
            &self.form.draft,
            self.config.chain_id,
            self.form.mode,
            &self.user_settings.contract_overrides,
        );
        match orchestrator::validate(&request) {
            Ok(_) => self.start_submission(request),
            Err(e) => {
                tracing::warn!("Airdrop input rejected: {}", e);
                self.form.input_error = Some(e.to_string());
            }
        }
    }

    fn render_outcome(&mut self, ui: &mut egui::Ui) {
        let Some(outcome) = self.form.last_outcome.clone() else {
            return;
        };
        ui.add_space(self.theme.spacing_md);
        ui.separator();
        ui.label(
            RichText::new(format!(
                "Sent {} to {} recipients in block {}",
                outcome.total,
                outcome.recipient_count,
                outcome
                    .transfer
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "?".to_string())
            ))
            .color(self.theme.success),
        );

        let mut links = Vec::new();
        if let Some(approval) = &outcome.approval {
            links.push(("Approval", format!("{:?}", approval.tx_hash)));
        }
        links.push(("Airdrop", format!("{:?}", outcome.transfer.tx_hash)));

        for (label, hash) in links {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{}:", label)).color(self.theme.text_secondary));
                ui.monospace(&hash);
                if let Some(url) = config::get_tx_explorer_url(self.config.chain_id, &hash) {
                    if ui.link("View on explorer").clicked() {
                        if let Err(e) = open::that(&url) {
                            self.notify(format!("Failed to open browser: {}", e), NotificationLevel::Error);
                        }
                    }
                }
            });
        }
    }

    fn import_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new().add_filter("CSV files", &["csv"]).pick_file() else {
            return;
        };
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                self.notify(format!("Failed to read {}: {}", path.display(), e), NotificationLevel::Error);
                return;
            }
        };
        match utils::parse_airdrop_csv(&contents) {
            Ok(import) if import.rows > 0 => {
                self.form.draft.recipients = import.recipients;
                self.form.draft.amounts = import.amounts;
                self.on_field_changed(FormField::Recipients);
                self.on_field_changed(FormField::Amounts);
                let skipped = if import.skipped > 0 {
                    format!(" ({} invalid rows skipped)", import.skipped)
                } else {
                    String::new()
                };
                self.notify(
                    format!("Loaded {} recipients from CSV file{}", import.rows, skipped),
                    NotificationLevel::Success,
                );
            }
            Ok(_) => self.notify("No valid rows found in CSV file", NotificationLevel::Error),
            Err(e) => self.notify(format!("Failed to load CSV file: {}", e), NotificationLevel::Error),
        }
    }

    pub(crate) fn render_input_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.form.input_error.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Cannot send airdrop")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(320.0);
                ui.label(message);
                ui.add_space(self.theme.spacing_sm);
                ui.vertical_centered(|ui| {
                    if ui.add(self.theme.button_primary("OK")).clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.form.input_error = None;
        }
    }
}

fn phase_description(phase: &SubmissionPhase) -> &'static str {
    match phase {
        SubmissionPhase::Validating => "Checking inputs...",
        SubmissionPhase::CheckingAllowance => "Checking token allowance...",
        SubmissionPhase::Approving => "Approve the token allowance in your wallet",
        SubmissionPhase::WaitingForApproval(_) => "Approval sent, waiting for it to be included",
        SubmissionPhase::Transferring => "Confirm the airdrop in your wallet",
        SubmissionPhase::WaitingForTransfer(_) => "Airdrop sent, waiting for it to be included",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::TxHash;

    // ==================== submit_button_state tests ====================

    #[test]
    fn test_idle_labels_by_mode() {
        let safe = submit_button_state(&SubmissionPhase::Idle, AirdropMode::Safe, true);
        assert_eq!(safe.label, "Send Tokens");
        assert!(safe.enabled);
        let unsafe_ = submit_button_state(&SubmissionPhase::Idle, AirdropMode::Unsafe, true);
        assert_eq!(unsafe_.label, "Send Tokens (Unsafe)");
    }

    #[test]
    fn test_insufficient_balance_disables_button() {
        let state = submit_button_state(&SubmissionPhase::Idle, AirdropMode::Safe, false);
        assert_eq!(state.label, "Insufficient token balance");
        assert!(!state.enabled);
    }

    #[test]
    fn test_wallet_and_inclusion_phases() {
        let signing = submit_button_state(&SubmissionPhase::Approving, AirdropMode::Safe, true);
        assert_eq!(signing.label, "Confirming in wallet...");
        assert!(!signing.enabled && signing.busy);

        let waiting = submit_button_state(
            &SubmissionPhase::WaitingForTransfer(TxHash::zero()),
            AirdropMode::Safe,
            true,
        );
        assert_eq!(waiting.label, "Waiting for transaction to be included...");
        assert!(!waiting.enabled);
    }

    #[test]
    fn test_failed_phases() {
        let chain_failure = SubmissionPhase::Failed {
            kind: ErrorKind::Chain,
            message: "reverted".to_string(),
        };
        assert_eq!(
            submit_button_state(&chain_failure, AirdropMode::Safe, true).label,
            "Error, see console."
        );

        let input_failure = SubmissionPhase::Failed {
            kind: ErrorKind::Input,
            message: "Token address is required.".to_string(),
        };
        assert_eq!(submit_button_state(&input_failure, AirdropMode::Safe, true).label, "Send Tokens");
    }

    // ==================== has_enough_tokens tests ====================

    #[test]
    fn test_has_enough_tokens_only_blocks_with_known_balance() {
        let total = Some(U256::from(10));
        assert!(has_enough_tokens("", total, Some(false)));
        assert!(has_enough_tokens("0xaa", Some(U256::zero()), Some(false)));
        assert!(has_enough_tokens("0xaa", None, Some(false)));
        assert!(has_enough_tokens("0xaa", total, None));
        assert!(!has_enough_tokens("0xaa", total, Some(false)));
        assert!(has_enough_tokens("0xaa", total, Some(true)));
    }
}
