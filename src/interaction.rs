//! Pointer event routing.
//!
//! The router holds no hover state: which feature is under the pointer is
//! tracked by the tooltip service, not here. Every handler makes at most one
//! external call, and all of them are no-ops when interactivity is off or the
//! relevant collaborator is absent.

use crate::binder::BoundFeature;
use crate::style::Color;
use std::sync::Arc;

/// Pointer position in scene (outer) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What a tooltip shows for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub label: String,
    pub formatted_value: Option<String>,
    pub color: Color,
}

impl TooltipContent {
    pub fn for_feature(feature: &BoundFeature) -> Self {
        Self {
            label: feature.label.clone(),
            formatted_value: feature.formatted_value.clone(),
            color: feature.color,
        }
    }

    /// `label: value`, or just the label for features without data.
    pub fn text(&self) -> String {
        match &self.formatted_value {
            Some(v) => format!("{}: {}", self.label, v),
            None => self.label.clone(),
        }
    }
}

/// Tooltip widget owned by the embedding application.
pub trait TooltipService {
    fn show(&self, content: TooltipContent, event: &PointerEvent);
    fn hide(&self);
}

pub type ClickHandler = Arc<dyn Fn(&BoundFeature, &PointerEvent) + Send + Sync>;
pub type TooltipRenderer = Arc<dyn Fn(&BoundFeature) -> TooltipContent + Send + Sync>;

pub struct InteractionRouter<'a> {
    is_interactive: bool,
    tooltip: Option<&'a dyn TooltipService>,
    on_click: Option<&'a ClickHandler>,
    renderer: Option<&'a TooltipRenderer>,
}

impl<'a> InteractionRouter<'a> {
    pub fn new(is_interactive: bool) -> Self {
        Self {
            is_interactive,
            tooltip: None,
            on_click: None,
            renderer: None,
        }
    }

    pub fn with_tooltip(mut self, service: &'a dyn TooltipService) -> Self {
        self.tooltip = Some(service);
        self
    }

    pub fn with_click(mut self, handler: Option<&'a ClickHandler>) -> Self {
        self.on_click = handler;
        self
    }

    pub fn with_renderer(mut self, renderer: Option<&'a TooltipRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.is_interactive
    }

    pub fn on_enter(&self, feature: &BoundFeature, event: &PointerEvent) {
        self.show(feature, event);
    }

    /// Same as [`Self::on_enter`]: the tooltip follows the pointer.
    pub fn on_move(&self, feature: &BoundFeature, event: &PointerEvent) {
        self.show(feature, event);
    }

    pub fn on_leave(&self) {
        if !self.is_interactive {
            return;
        }
        if let Some(tooltip) = self.tooltip {
            tooltip.hide();
        }
    }

    pub fn on_click(&self, feature: &BoundFeature, event: &PointerEvent) {
        if !self.is_interactive {
            return;
        }
        if let Some(handler) = self.on_click {
            handler(feature, event);
        }
    }

    fn show(&self, feature: &BoundFeature, event: &PointerEvent) {
        if !self.is_interactive {
            return;
        }
        let Some(tooltip) = self.tooltip else {
            return;
        };
        let content = match self.renderer {
            Some(render) => render(feature),
            None => TooltipContent::for_feature(feature),
        };
        tooltip.show(content, event);
    }
}
