//! Colors, spacing and styled widget factories.

use eframe::egui;

#[derive(Clone, Copy)]
pub struct AppTheme {
    // Base colors
    pub background: egui::Color32,
    pub surface: egui::Color32,
    pub surface_hover: egui::Color32,
    pub panel_fill: egui::Color32,
    pub border: egui::Color32,
    pub text_primary: egui::Color32,
    pub text_secondary: egui::Color32,

    // Brand and semantic colors
    pub primary: egui::Color32,
    pub primary_hover: egui::Color32,
    pub accent: egui::Color32,
    pub success: egui::Color32,
    pub warning: egui::Color32,
    pub error: egui::Color32,

    pub spacing_xs: f32,
    pub spacing_sm: f32,
    pub spacing_md: f32,
    pub spacing_lg: f32,

    pub button_medium: egui::Vec2,
    pub button_wide: egui::Vec2,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            // Light card layout on a pale background, deep green brand color
            background: egui::Color32::from_rgb(248, 250, 252),
            surface: egui::Color32::WHITE,
            surface_hover: egui::Color32::from_rgb(241, 245, 249),
            panel_fill: egui::Color32::from_rgb(248, 250, 252),
            border: egui::Color32::from_rgb(203, 213, 225),
            text_primary: egui::Color32::from_rgb(15, 23, 42),
            text_secondary: egui::Color32::from_rgb(100, 116, 139),

            primary: egui::Color32::from_rgb(7, 85, 59),         // #07553B
            primary_hover: egui::Color32::from_rgb(10, 110, 77),
            accent: egui::Color32::from_rgb(206, 212, 106),      // #CED46A
            success: egui::Color32::from_rgb(22, 163, 74),
            warning: egui::Color32::from_rgb(217, 119, 6),
            error: egui::Color32::from_rgb(220, 38, 38),

            spacing_xs: 4.0,
            spacing_sm: 8.0,
            spacing_md: 16.0,
            spacing_lg: 24.0,

            button_medium: egui::vec2(120.0, 32.0),
            button_wide: egui::vec2(320.0, 40.0),
        }
    }
}

impl AppTheme {
    /// Filled brand-colored button
    pub fn button_primary(&self, text: &str) -> egui::Button<'_> {
        egui::Button::new(egui::RichText::new(text).color(egui::Color32::WHITE).strong())
            .fill(self.primary)
            .rounding(6.0)
            .min_size(self.button_medium)
    }

    /// Full-width submit button; red when the airdrop skips on-chain checks
    pub fn button_submit(&self, text: &str, danger: bool) -> egui::Button<'_> {
        let fill = if danger { self.error } else { self.primary };
        egui::Button::new(egui::RichText::new(text).color(egui::Color32::WHITE).strong())
            .fill(fill)
            .rounding(8.0)
            .min_size(self.button_wide)
    }

    /// Outlined button
    pub fn button_secondary(&self, text: &str) -> egui::Button<'_> {
        egui::Button::new(egui::RichText::new(text).color(self.text_primary))
            .fill(self.surface)
            .stroke(egui::Stroke::new(1.0, self.border))
            .rounding(6.0)
            .min_size(self.button_medium)
    }

    /// Card frame for the form and its panels
    pub fn frame_panel(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.surface)
            .rounding(12.0)
            .inner_margin(self.spacing_lg)
            .stroke(egui::Stroke::new(2.0, self.primary))
    }

    /// Inset frame for read-only details
    pub fn frame_details(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.surface_hover)
            .rounding(8.0)
            .inner_margin(self.spacing_md)
            .stroke(egui::Stroke::new(1.0, self.border))
    }

    /// Highlighted strip used for warnings
    pub fn frame_banner(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(egui::Color32::from_rgb(254, 243, 199))
            .rounding(6.0)
            .inner_margin(egui::Margin::symmetric(self.spacing_md, self.spacing_sm))
            .stroke(egui::Stroke::new(1.0, self.warning))
    }
}

/// Configure the egui context style with the given theme
pub fn configure_style(ctx: &egui::Context, theme: &AppTheme) {
    let mut visuals = egui::Visuals::light();
    visuals.window_fill = theme.surface;
    visuals.panel_fill = theme.panel_fill;
    visuals.override_text_color = Some(theme.text_primary);
    visuals.hyperlink_color = theme.primary;
    visuals.selection.bg_fill = theme.accent;
    visuals.selection.stroke = egui::Stroke::new(1.0, theme.primary);

    visuals.widgets.inactive.bg_fill = theme.surface;
    visuals.widgets.hovered.bg_fill = theme.surface_hover;
    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, theme.border);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, theme.primary_hover);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(2.0, theme.primary);
    visuals.extreme_bg_color = theme.surface;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.menu_margin = egui::Margin::same(8.0);

    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(22.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Body,
        egui::FontId::new(14.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::new(14.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Monospace,
        egui::FontId::new(13.0, egui::FontFamily::Monospace),
    );

    ctx.set_style(style);
}
