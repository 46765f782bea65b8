// src/ui/panel.rs
//! Debug panel model and its ImGui window
//!
//! The panel is plain data: an ordered list of [`Control`]s, each bound to a
//! [`Param`]. Drawing it yields [`PanelEvent`]s which the application applies
//! to its own state, so the panel never holds references into the scene.

use std::borrow::Cow;

use crate::gfx::{rendering::settings::ToneMapping, scene::NodeId};

/// A tunable value owned by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    EnvMapIntensity,
    ModelRotationY(NodeId),
    LightIntensity,
    LightPositionX,
    LightPositionY,
    LightPositionZ,
    ToneMapping,
    ToneMappingExposure,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f32),
    ToneMapping(ToneMapping),
}

impl ParamValue {
    pub fn as_number(self) -> Option<f32> {
        match self {
            ParamValue::Number(value) => Some(value),
            ParamValue::ToneMapping(_) => None,
        }
    }

    pub fn as_tone_mapping(self) -> Option<ToneMapping> {
        match self {
            ParamValue::ToneMapping(value) => Some(value),
            ParamValue::Number(_) => None,
        }
    }
}

/// Side effect run after a control changes or settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hook {
    #[default]
    None,
    RefreshMaterials,
}

/// Slider bounds and step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl NumberRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Rounds to a multiple of `step`, then clamps to `[min, max]`
    pub fn constrain(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.min;
        }
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Slider(NumberRange),
    Select(Vec<(&'static str, ToneMapping)>),
}

impl ControlKind {
    /// Combo with every tone mapping operator
    pub fn tone_mapping_select() -> Self {
        ControlKind::Select(ToneMapping::ALL.iter().map(|t| (t.label(), *t)).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub label: String,
    pub param: Param,
    pub kind: ControlKind,
    pub on_change: Hook,
    pub on_settle: Hook,
}

impl Control {
    pub fn slider(label: impl Into<String>, param: Param, range: NumberRange) -> Self {
        Self {
            label: label.into(),
            param,
            kind: ControlKind::Slider(range),
            on_change: Hook::None,
            on_settle: Hook::None,
        }
    }

    pub fn select(label: impl Into<String>, param: Param, kind: ControlKind) -> Self {
        Self {
            label: label.into(),
            param,
            kind,
            on_change: Hook::None,
            on_settle: Hook::None,
        }
    }

    pub fn on_change(mut self, hook: Hook) -> Self {
        self.on_change = hook;
        self
    }

    pub fn on_settle(mut self, hook: Hook) -> Self {
        self.on_settle = hook;
        self
    }

    /// Brings a raw value into the control's domain
    pub fn constrain(&self, value: ParamValue) -> Option<ParamValue> {
        match (&self.kind, value) {
            (ControlKind::Slider(range), ParamValue::Number(v)) => {
                Some(ParamValue::Number(range.constrain(v)))
            }
            (ControlKind::Select(options), ParamValue::ToneMapping(t)) => options
                .iter()
                .any(|(_, option)| *option == t)
                .then_some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    /// The value moved; applied immediately
    Changed(ControlId, ParamValue),
    /// Interaction with the control finished
    Settled(ControlId),
}

/// Ordered list of live-tunable controls
#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    title: String,
    controls: Vec<Control>,
}

impl DebugPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            controls: Vec::new(),
        }
    }

    pub fn add(&mut self, control: Control) -> ControlId {
        self.controls.push(control);
        ControlId(self.controls.len() - 1)
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.0)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn find(&self, label: &str) -> Option<ControlId> {
        self.controls
            .iter()
            .position(|c| c.label == label)
            .map(ControlId)
    }

    /// Controls bound to `param`
    pub fn bound_to(&self, param: Param) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(move |c| c.param == param)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Draws the panel window.
    ///
    /// `values` holds the current value of every control, in control order.
    pub fn draw(&self, ui: &imgui::Ui, values: &[ParamValue]) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return events;
        }

        let width = 420.0_f32.min(display_size[0]);
        ui.window(&self.title)
            .size([width, 0.0], imgui::Condition::FirstUseEver)
            .position(
                [(display_size[0] - width - 16.0).max(0.0), 16.0],
                imgui::Condition::FirstUseEver,
            )
            .collapsible(true)
            .always_auto_resize(true)
            .build(|| {
                for (index, (control, value)) in self.controls.iter().zip(values).enumerate() {
                    draw_control(ui, ControlId(index), control, *value, &mut events);
                }
            });

        events
    }
}

fn draw_control(
    ui: &imgui::Ui,
    id: ControlId,
    control: &Control,
    value: ParamValue,
    events: &mut Vec<PanelEvent>,
) {
    match (&control.kind, value) {
        (ControlKind::Slider(range), ParamValue::Number(mut current)) => {
            let format = if range.step >= 0.01 { "%.2f" } else { "%.3f" };
            if ui
                .slider_config(&control.label, range.min, range.max)
                .display_format(format)
                .build(&mut current)
            {
                events.push(PanelEvent::Changed(id, ParamValue::Number(current)));
            }
            if ui.is_item_deactivated_after_edit() {
                events.push(PanelEvent::Settled(id));
            }
        }
        (ControlKind::Select(options), ParamValue::ToneMapping(current)) => {
            let mut selected = options
                .iter()
                .position(|(_, option)| *option == current)
                .unwrap_or(0);
            if ui.combo(&control.label, &mut selected, options, |(label, _)| {
                Cow::Borrowed(*label)
            }) {
                if let Some((_, choice)) = options.get(selected) {
                    events.push(PanelEvent::Changed(id, ParamValue::ToneMapping(*choice)));
                    events.push(PanelEvent::Settled(id));
                }
            }
        }
        _ => log::warn!("Control '{}' has a mismatched value", control.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_constrain_clamps_and_snaps() {
        let range = NumberRange::new(0.0, 10.0, 0.01);
        assert_eq!(range.constrain(-3.0), 0.0);
        assert_eq!(range.constrain(12.0), 10.0);
        assert!((range.constrain(4.236) - 4.24).abs() < 1e-5);
        assert_eq!(range.constrain(f32::NAN), 0.0);
    }

    #[test]
    fn test_constrain_snaps_to_multiples_of_step() {
        let range = NumberRange::new(-5.0, 5.0, 0.5);
        assert!((range.constrain(-4.3) - -4.5).abs() < 1e-6);
        assert!((range.constrain(1.1) - 1.0).abs() < 1e-6);

        // The grid starts at zero, not at an off-grid minimum
        let rotation = NumberRange::new(-PI, PI, 0.001);
        assert!((rotation.constrain(-1.0) + 1.0).abs() < 1e-6);
        assert!((rotation.constrain(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(rotation.constrain(4.0), PI);
        assert_eq!(rotation.constrain(-PI), -PI);

        let free = NumberRange::new(0.0, 1.0, 0.0);
        assert_eq!(free.constrain(0.123), 0.123);
    }

    #[test]
    fn test_panel_keeps_insertion_order() {
        let mut panel = DebugPanel::new("Debug");
        let a = panel.add(Control::slider(
            "Light Intensity",
            Param::LightIntensity,
            NumberRange::new(0.0, 10.0, 0.001),
        ));
        let b = panel.add(Control::select(
            "Tone Mapping",
            Param::ToneMapping,
            ControlKind::tone_mapping_select(),
        ));

        assert_eq!(panel.controls().len(), 2);
        assert_eq!(panel.find("Tone Mapping"), Some(b));
        assert_eq!(panel.control(a).map(|c| c.param), Some(Param::LightIntensity));
        assert_eq!(panel.bound_to(Param::ToneMapping).count(), 1);
        assert!(panel.find("Missing").is_none());
    }

    #[test]
    fn test_control_constrain_checks_kind() {
        let slider = Control::slider(
            "Exposure",
            Param::ToneMappingExposure,
            NumberRange::new(0.0, 10.0, 0.001),
        );
        assert_eq!(
            slider.constrain(ParamValue::Number(11.0)),
            Some(ParamValue::Number(10.0))
        );
        assert_eq!(
            slider.constrain(ParamValue::ToneMapping(ToneMapping::Linear)),
            None
        );

        let select = Control::select(
            "Tone Mapping",
            Param::ToneMapping,
            ControlKind::Select(vec![("Linear", ToneMapping::Linear)]),
        );
        assert!(select
            .constrain(ParamValue::ToneMapping(ToneMapping::Cineon))
            .is_none());
        assert!(select
            .constrain(ParamValue::ToneMapping(ToneMapping::Linear))
            .is_some());
    }

    #[test]
    fn test_tone_mapping_select_lists_every_operator() {
        let ControlKind::Select(options) = ControlKind::tone_mapping_select() else {
            panic!("expected a select control");
        };
        let labels: Vec<&str> = options.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, ["No", "Linear", "Reinhard", "Cineon", "ACESFilmic"]);
    }
}
